use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::keys;
use crate::store::{Store, StoreError};

/// One learner's pass through a quiz session. Mutated exactly once per
/// answered question; frozen as soon as `completed_at` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: String,
    pub learner_id: String,
    pub session_id: String,
    pub current_question_index: usize,
    pub score: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Attempt {
    pub fn new(learner_id: &str, session_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            learner_id: learner_id.to_string(),
            session_id: session_id.to_string(),
            current_question_index: 0,
            score: 0,
            started_at: Utc::now(),
            completed_at: None,
        }
    }
}

impl Store {
    /// Persist a fresh attempt and point both lookup indexes at it. A
    /// learner runs one quiz at a time, so a newer dispatch simply takes
    /// over the active slot (last write wins).
    pub fn create_attempt(&self, attempt: &Attempt) -> Result<(), StoreError> {
        self.attempts.insert(
            keys::attempt_key(&attempt.id).as_bytes(),
            Self::serialize(attempt)?,
        )?;
        self.active_attempts.insert(
            keys::active_attempt_key(&attempt.learner_id).as_bytes(),
            attempt.id.as_bytes(),
        )?;
        self.attempts_by_session.insert(
            keys::attempt_session_index_key(&attempt.learner_id, &attempt.session_id).as_bytes(),
            attempt.id.as_bytes(),
        )?;
        Ok(())
    }

    pub fn get_attempt(&self, attempt_id: &str) -> Result<Option<Attempt>, StoreError> {
        match self.attempts.get(keys::attempt_key(attempt_id).as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// The learner's quiz in progress, if any.
    pub fn get_active_attempt(&self, learner_id: &str) -> Result<Option<Attempt>, StoreError> {
        let key = keys::active_attempt_key(learner_id);
        let Some(id_bytes) = self.active_attempts.get(key.as_bytes())? else {
            return Ok(None);
        };
        let attempt_id = String::from_utf8_lossy(&id_bytes).to_string();
        self.get_attempt(&attempt_id)
    }

    pub fn get_attempt_for_session(
        &self,
        learner_id: &str,
        session_id: &str,
    ) -> Result<Option<Attempt>, StoreError> {
        let key = keys::attempt_session_index_key(learner_id, session_id);
        let Some(id_bytes) = self.attempts_by_session.get(key.as_bytes())? else {
            return Ok(None);
        };
        let attempt_id = String::from_utf8_lossy(&id_bytes).to_string();
        self.get_attempt(&attempt_id)
    }

    pub fn update_attempt(&self, attempt: &Attempt) -> Result<(), StoreError> {
        self.attempts.insert(
            keys::attempt_key(&attempt.id).as_bytes(),
            Self::serialize(attempt)?,
        )?;
        Ok(())
    }

    /// Persist the final state and clear the active slot. The session
    /// index stays so late button clicks can still be matched and
    /// answered with a stale-question message.
    pub fn complete_attempt(&self, attempt: &Attempt) -> Result<(), StoreError> {
        if attempt.completed_at.is_none() {
            return Err(StoreError::Validation(format!(
                "attempt {} is missing a completion timestamp",
                attempt.id
            )));
        }
        self.update_attempt(attempt)?;
        self.active_attempts
            .remove(keys::active_attempt_key(&attempt.learner_id).as_bytes())?;
        Ok(())
    }
}
