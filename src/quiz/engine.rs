//! Orchestrates one unit of quiz work against the record store: assemble
//! and persist a new quiz, or process one submitted answer. Holds no
//! per-learner state between calls and never talks to the chat
//! transport; callers render and deliver what it returns.

use std::sync::Arc;

use thiserror::Error;

use crate::quiz::config::QuizConfig;
use crate::quiz::generator::synthesize;
use crate::quiz::progression::{submit_answer, AnswerEvent, TurnOutput};
use crate::quiz::types::QuizError;
use crate::store::operations::answers::AnswerRecord;
use crate::store::operations::attempts::Attempt;
use crate::store::operations::learners::Learner;
use crate::store::operations::sessions::QuizSession;
use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("learner {0} has no quiz in progress")]
    NoActiveAttempt(String),
}

#[derive(Debug, Clone)]
pub struct PreparedQuiz {
    pub session: QuizSession,
    pub attempt: Attempt,
}

pub struct QuizEngine {
    store: Arc<Store>,
    config: QuizConfig,
}

impl QuizEngine {
    pub fn new(config: QuizConfig, store: Arc<Store>) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    /// Assemble a quiz for the learner from the current pool and their
    /// historical weights, then persist the session (status `created`)
    /// and a fresh attempt at question 0.
    pub fn prepare_quiz(&self, learner: &Learner) -> Result<PreparedQuiz, EngineError> {
        let pool = self.store.list_vocabulary()?;
        let weights = self.store.get_weight_map(&learner.id)?;

        let mut rng = rand::thread_rng();
        let questions = synthesize(
            &pool,
            &weights,
            self.config.questions_per_quiz,
            self.config.option_count,
            &mut rng,
        )?;

        let session = QuizSession::new(questions);
        let attempt = Attempt::new(&learner.id, &session.id);

        self.store.create_quiz_session(&session)?;
        self.store.create_attempt(&attempt)?;

        tracing::info!(
            learner_id = %learner.id,
            session_id = %session.id,
            questions = session.questions.len(),
            "Prepared quiz"
        );

        Ok(PreparedQuiz { session, attempt })
    }

    /// Record that the first question went out over the transport.
    pub fn mark_quiz_sent(&self, session_id: &str) -> Result<(), EngineError> {
        self.store.mark_session_sent(session_id)?;
        Ok(())
    }

    /// Free-text answer against the learner's active attempt.
    pub fn handle_text_answer(
        &self,
        learner: &Learner,
        submitted: &str,
    ) -> Result<TurnOutput, EngineError> {
        let attempt = self
            .store
            .get_active_attempt(&learner.id)?
            .ok_or_else(|| EngineError::NoActiveAttempt(learner.id.clone()))?;

        let event = AnswerEvent::Text {
            submitted: submitted.to_string(),
        };
        self.run_turn(learner, attempt, event)
    }

    /// Button answer: the caller names the session and the question the
    /// button was rendered for, so stale clicks are rejected.
    pub fn handle_button_answer(
        &self,
        learner: &Learner,
        session_id: &str,
        question_id: &str,
        submitted: &str,
    ) -> Result<TurnOutput, EngineError> {
        let attempt = self
            .store
            .get_attempt_for_session(&learner.id, session_id)?
            .ok_or_else(|| EngineError::NoActiveAttempt(learner.id.clone()))?;

        let event = AnswerEvent::Button {
            question_id: question_id.to_string(),
            submitted: submitted.to_string(),
        };
        self.run_turn(learner, attempt, event)
    }

    fn run_turn(
        &self,
        learner: &Learner,
        attempt: Attempt,
        event: AnswerEvent,
    ) -> Result<TurnOutput, EngineError> {
        let session = self.store.get_quiz_session(&attempt.session_id)?.ok_or_else(|| {
            StoreError::NotFound {
                entity: "quiz_session".to_string(),
                key: attempt.session_id.clone(),
            }
        })?;

        // StaleAnswer / WrongInputChannel bubble out before any write, so
        // a rejected submission leaves every record untouched.
        let out = submit_answer(&session.questions, &attempt, &event)?;

        tracing::debug!(
            learner_id = %learner.id,
            question_kind = out.answered.kind.as_str(),
            is_correct = out.feedback.is_correct,
            "Answer processed"
        );

        let record = AnswerRecord::for_turn(learner, &session, &out);
        self.store.append_answer(&record)?;
        self.store
            .record_answer_stat(&learner.id, &out.answered.vocabulary_id, out.feedback.is_correct)?;

        if out.attempt.completed_at.is_some() {
            self.store.complete_attempt(&out.attempt)?;
            self.store.mark_session_completed(&session.id)?;
            tracing::info!(
                learner_id = %learner.id,
                session_id = %session.id,
                score = out.attempt.score,
                "Quiz completed"
            );
        } else {
            self.store.update_attempt(&out.attempt)?;
        }

        Ok(out)
    }
}
