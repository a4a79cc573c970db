use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::quiz::progression::TurnOutput;
use crate::quiz::types::QuestionKind;
use crate::store::keys;
use crate::store::operations::learners::Learner;
use crate::store::operations::sessions::QuizSession;
use crate::store::{Store, StoreError};

/// Append-only audit entry for one answered question. For multiple
/// choice the option set shown to the learner is captured as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub id: String,
    pub learner_id: String,
    pub session_id: String,
    pub vocabulary_id: String,
    pub kind: QuestionKind,
    pub submitted: String,
    pub expected: String,
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub answered_at: DateTime<Utc>,
}

impl AnswerRecord {
    pub fn for_turn(learner: &Learner, session: &QuizSession, out: &TurnOutput) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            learner_id: learner.id.clone(),
            session_id: session.id.clone(),
            vocabulary_id: out.answered.vocabulary_id.clone(),
            kind: out.answered.kind,
            submitted: out.feedback.submitted.clone(),
            expected: out.feedback.correct_answer.clone(),
            is_correct: out.feedback.is_correct,
            options: out.answered.options.clone(),
            answered_at: Utc::now(),
        }
    }
}

impl Store {
    pub fn append_answer(&self, record: &AnswerRecord) -> Result<(), StoreError> {
        let key = keys::answer_key(
            &record.learner_id,
            record.answered_at.timestamp_millis(),
            &record.id,
        );
        self.answers
            .insert(key.as_bytes(), Self::serialize(record)?)?;
        Ok(())
    }

    /// Most recent answers first, thanks to the reversed-timestamp key.
    pub fn list_answers(
        &self,
        learner_id: &str,
        limit: usize,
    ) -> Result<Vec<AnswerRecord>, StoreError> {
        let prefix = keys::answer_prefix(learner_id);
        let mut records = Vec::with_capacity(limit.min(64));
        for item in self.answers.scan_prefix(prefix.as_bytes()) {
            if records.len() >= limit {
                break;
            }
            let (_, raw) = item?;
            records.push(Self::deserialize(&raw)?);
        }
        Ok(records)
    }
}
