//! One quiz turn: validate the submitted answer, advance or complete the
//! attempt. Pure computation over values handed in by the caller; every
//! read and write of persisted state stays outside.

use chrono::Utc;
use serde::Serialize;

use crate::quiz::types::{Question, QuestionKind, QuizError};
use crate::quiz::validator::validate;
use crate::store::operations::attempts::Attempt;

/// A learner's submission for the current question. Button submissions
/// carry the question id baked into the button so late clicks on an
/// already-answered question can be rejected.
#[derive(Debug, Clone)]
pub enum AnswerEvent {
    Text { submitted: String },
    Button { question_id: String, submitted: String },
}

impl AnswerEvent {
    pub fn submitted(&self) -> &str {
        match self {
            Self::Text { submitted } | Self::Button { submitted, .. } => submitted,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFeedback {
    pub is_correct: bool,
    pub submitted: String,
    pub correct_answer: String,
    pub score: u32,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionTier {
    Perfect,
    Celebratory,
    Encouraging,
    KeepTrying,
}

impl CompletionTier {
    pub fn from_percentage(percentage: u32) -> Self {
        if percentage >= 100 {
            Self::Perfect
        } else if percentage >= 80 {
            Self::Celebratory
        } else if percentage >= 60 {
            Self::Encouraging
        } else {
            Self::KeepTrying
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Perfect => "🏆",
            Self::Celebratory => "🎉",
            Self::Encouraging => "👍",
            Self::KeepTrying => "💪",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Perfect => "パーフェクト！素晴らしい！",
            Self::Celebratory => "よくできました！",
            Self::Encouraging => "良い調子です！",
            Self::KeepTrying => "次回も頑張りましょう！",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummary {
    pub score: u32,
    pub total: usize,
    pub percentage: u32,
    pub tier: CompletionTier,
}

pub fn completion_summary(score: u32, total: usize) -> CompletionSummary {
    let percentage = if total == 0 {
        0
    } else {
        ((score as f64 / total as f64) * 100.0).round() as u32
    };

    CompletionSummary {
        score,
        total,
        percentage,
        tier: CompletionTier::from_percentage(percentage),
    }
}

/// Everything one answered turn produces: the advanced (or completed)
/// attempt, the question that was answered, feedback to render, and
/// either the next question or a completion summary.
#[derive(Debug, Clone)]
pub struct TurnOutput {
    pub attempt: Attempt,
    pub answered: Question,
    pub feedback: AnswerFeedback,
    pub next_question: Option<Question>,
    pub completion: Option<CompletionSummary>,
}

pub fn submit_answer(
    questions: &[Question],
    attempt: &Attempt,
    event: &AnswerEvent,
) -> Result<TurnOutput, QuizError> {
    if attempt.completed_at.is_some() {
        return Err(QuizError::InvalidState(format!(
            "attempt {} is already completed",
            attempt.id
        )));
    }

    let index = attempt.current_question_index;
    let total = questions.len();
    let current = questions.get(index).ok_or_else(|| {
        QuizError::InvalidState(format!(
            "question index {index} out of range for a {total}-question session"
        ))
    })?;

    match event {
        AnswerEvent::Button { question_id, .. } if *question_id != current.id => {
            return Err(QuizError::StaleAnswer);
        }
        AnswerEvent::Text { .. } if current.kind == QuestionKind::MultipleChoice => {
            return Err(QuizError::WrongInputChannel);
        }
        _ => {}
    }

    let submitted = event.submitted();
    let is_correct = validate(submitted, &current.correct_answer, current.kind);
    let score = attempt.score + u32::from(is_correct);

    let feedback = AnswerFeedback {
        is_correct,
        submitted: submitted.to_string(),
        correct_answer: current.correct_answer.clone(),
        score,
        total,
    };

    let mut updated = attempt.clone();
    updated.score = score;

    let (next_question, completion) = if index + 1 == total {
        // 完了時は index を凍結し completed_at を打つ
        updated.completed_at = Some(Utc::now());
        (None, Some(completion_summary(score, total)))
    } else {
        updated.current_question_index = index + 1;
        (questions.get(index + 1).cloned(), None)
    };

    Ok(TurnOutput {
        attempt: updated,
        answered: current.clone(),
        feedback,
        next_question,
        completion,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn question(id: &str, kind: QuestionKind, correct: &str) -> Question {
        Question {
            id: id.to_string(),
            vocabulary_id: format!("vocab-{id}"),
            kind,
            prompt: "prompt".to_string(),
            correct_answer: correct.to_string(),
            options: match kind {
                QuestionKind::MultipleChoice => Some(vec![
                    correct.to_string(),
                    "犬".to_string(),
                    "猫".to_string(),
                    "鳥".to_string(),
                ]),
                _ => None,
            },
            english: "word".to_string(),
            japanese: correct.to_string(),
        }
    }

    fn attempt_at(index: usize, score: u32) -> Attempt {
        Attempt {
            id: "attempt-1".to_string(),
            learner_id: "learner-1".to_string(),
            session_id: "session-1".to_string(),
            current_question_index: index,
            score,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    fn two_question_session() -> Vec<Question> {
        vec![
            question("q1", QuestionKind::JpToEn, "apple"),
            question("q2", QuestionKind::JpToEn, "water"),
        ]
    }

    #[test]
    fn correct_answer_advances_and_scores() {
        let questions = two_question_session();
        let attempt = attempt_at(0, 0);

        let out = submit_answer(
            &questions,
            &attempt,
            &AnswerEvent::Text {
                submitted: "apple".to_string(),
            },
        )
        .unwrap();

        assert!(out.feedback.is_correct);
        assert_eq!(out.attempt.current_question_index, 1);
        assert_eq!(out.attempt.score, 1);
        assert!(out.attempt.completed_at.is_none());
        assert_eq!(out.next_question.as_ref().unwrap().id, "q2");
        assert!(out.completion.is_none());
    }

    #[test]
    fn last_answer_completes_the_attempt() {
        let questions = two_question_session();
        let attempt = attempt_at(1, 1);

        let out = submit_answer(
            &questions,
            &attempt,
            &AnswerEvent::Text {
                submitted: "water".to_string(),
            },
        )
        .unwrap();

        assert_eq!(out.attempt.score, 2);
        assert!(out.attempt.completed_at.is_some());
        // the pointer freezes on the last question
        assert_eq!(out.attempt.current_question_index, 1);
        assert!(out.next_question.is_none());

        let summary = out.completion.unwrap();
        assert_eq!(summary.percentage, 100);
        assert_eq!(summary.tier, CompletionTier::Perfect);
    }

    #[test]
    fn wrong_answer_keeps_score_and_still_advances() {
        let questions = two_question_session();
        let attempt = attempt_at(0, 0);

        let out = submit_answer(
            &questions,
            &attempt,
            &AnswerEvent::Text {
                submitted: "banana".to_string(),
            },
        )
        .unwrap();

        assert!(!out.feedback.is_correct);
        assert_eq!(out.attempt.score, 0);
        assert_eq!(out.attempt.current_question_index, 1);
        assert_eq!(out.feedback.correct_answer, "apple");
    }

    #[test]
    fn mismatched_button_is_stale() {
        let questions = two_question_session();
        let attempt = attempt_at(1, 1);

        let result = submit_answer(
            &questions,
            &attempt,
            &AnswerEvent::Button {
                question_id: "q1".to_string(),
                submitted: "apple".to_string(),
            },
        );

        assert!(matches!(result, Err(QuizError::StaleAnswer)));
    }

    #[test]
    fn free_text_rejected_for_button_question() {
        let questions = vec![question("q1", QuestionKind::MultipleChoice, "りんご")];
        let attempt = attempt_at(0, 0);

        let result = submit_answer(
            &questions,
            &attempt,
            &AnswerEvent::Text {
                submitted: "りんご".to_string(),
            },
        );

        assert!(matches!(result, Err(QuizError::WrongInputChannel)));
    }

    #[test]
    fn completed_attempt_rejects_further_answers() {
        let questions = two_question_session();
        let mut attempt = attempt_at(1, 2);
        attempt.completed_at = Some(Utc::now());

        let result = submit_answer(
            &questions,
            &attempt,
            &AnswerEvent::Text {
                submitted: "water".to_string(),
            },
        );

        assert!(matches!(result, Err(QuizError::InvalidState(_))));
    }

    #[test]
    fn out_of_range_index_is_invalid_state() {
        let questions = two_question_session();
        let attempt = attempt_at(5, 0);

        let result = submit_answer(
            &questions,
            &attempt,
            &AnswerEvent::Text {
                submitted: "water".to_string(),
            },
        );

        assert!(matches!(result, Err(QuizError::InvalidState(_))));
    }

    #[test]
    fn completion_tiers_map_by_percentage() {
        assert_eq!(completion_summary(5, 5).tier, CompletionTier::Perfect);
        assert_eq!(completion_summary(4, 5).tier, CompletionTier::Celebratory);
        assert_eq!(completion_summary(3, 5).tier, CompletionTier::Encouraging);
        assert_eq!(completion_summary(2, 5).tier, CompletionTier::KeepTrying);
        assert_eq!(completion_summary(0, 5).tier, CompletionTier::KeepTrying);
    }
}
