use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::quiz::types::Question;
use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    Sent,
    Completed,
}

impl SessionStatus {
    // 状態は created -> sent -> completed の一方向のみ
    fn rank(self) -> u8 {
        match self {
            Self::Created => 0,
            Self::Sent => 1,
            Self::Completed => 2,
        }
    }
}

/// A quiz with its question sequence frozen at creation time. The
/// questions are stored denormalized so answering turns never depend on
/// the live vocabulary pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSession {
    pub id: String,
    pub questions: Vec<Question>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            questions,
            status: SessionStatus::Created,
            created_at: Utc::now(),
            sent_at: None,
        }
    }
}

impl Store {
    pub fn create_quiz_session(&self, session: &QuizSession) -> Result<(), StoreError> {
        if session.questions.is_empty() {
            return Err(StoreError::Validation(
                "quiz session must contain at least one question".to_string(),
            ));
        }
        self.quiz_sessions.insert(
            keys::quiz_session_key(&session.id).as_bytes(),
            Self::serialize(session)?,
        )?;
        Ok(())
    }

    pub fn get_quiz_session(&self, session_id: &str) -> Result<Option<QuizSession>, StoreError> {
        match self
            .quiz_sessions
            .get(keys::quiz_session_key(session_id).as_bytes())?
        {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn mark_session_sent(&self, session_id: &str) -> Result<(), StoreError> {
        self.transition_session(session_id, SessionStatus::Sent, |session| {
            session.sent_at = Some(Utc::now());
        })
    }

    pub fn mark_session_completed(&self, session_id: &str) -> Result<(), StoreError> {
        self.transition_session(session_id, SessionStatus::Completed, |_| {})
    }

    fn transition_session(
        &self,
        session_id: &str,
        next: SessionStatus,
        apply: impl FnOnce(&mut QuizSession),
    ) -> Result<(), StoreError> {
        let mut session = self
            .get_quiz_session(session_id)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "quiz_session".to_string(),
                key: session_id.to_string(),
            })?;

        if next.rank() < session.status.rank() {
            return Err(StoreError::Validation(format!(
                "session {session_id} cannot move from {:?} back to {next:?}",
                session.status
            )));
        }

        session.status = next;
        apply(&mut session);
        self.quiz_sessions.insert(
            keys::quiz_session_key(session_id).as_bytes(),
            Self::serialize(&session)?,
        )?;
        Ok(())
    }
}
