use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::keys;
use crate::store::{Store, StoreError};

/// A Slack workspace member who receives quizzes. Registered lazily on
/// first inbound message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Learner {
    pub id: String,
    pub slack_user_id: String,
    pub team_id: String,
    pub display_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_active_at: Option<DateTime<Utc>>,
}

impl Learner {
    pub fn new(slack_user_id: &str, team_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            slack_user_id: slack_user_id.to_string(),
            team_id: team_id.to_string(),
            display_name: None,
            is_active: true,
            created_at: Utc::now(),
            last_active_at: None,
        }
    }
}

impl Store {
    pub fn create_learner(&self, learner: &Learner) -> Result<(), StoreError> {
        if learner.slack_user_id.is_empty() {
            return Err(StoreError::Validation(
                "learner slack_user_id must not be empty".to_string(),
            ));
        }

        let index_key = keys::learner_slack_index_key(&learner.slack_user_id);
        if self.learners_by_slack_id.get(index_key.as_bytes())?.is_some() {
            return Err(StoreError::Validation(format!(
                "learner already registered for slack user {}",
                learner.slack_user_id
            )));
        }

        self.learners.insert(
            keys::learner_key(&learner.id).as_bytes(),
            Self::serialize(learner)?,
        )?;
        self.learners_by_slack_id
            .insert(index_key.as_bytes(), learner.id.as_bytes())?;
        Ok(())
    }

    pub fn get_learner(&self, learner_id: &str) -> Result<Option<Learner>, StoreError> {
        match self.learners.get(keys::learner_key(learner_id).as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn get_learner_by_slack_id(
        &self,
        slack_user_id: &str,
    ) -> Result<Option<Learner>, StoreError> {
        let index_key = keys::learner_slack_index_key(slack_user_id);
        let Some(id_bytes) = self.learners_by_slack_id.get(index_key.as_bytes())? else {
            return Ok(None);
        };
        let learner_id = String::from_utf8_lossy(&id_bytes).to_string();
        self.get_learner(&learner_id)
    }

    pub fn list_active_learners(&self) -> Result<Vec<Learner>, StoreError> {
        let mut active = Vec::new();
        for item in self.learners.iter() {
            let (_, raw) = item?;
            let learner: Learner = Self::deserialize(&raw)?;
            if learner.is_active {
                active.push(learner);
            }
        }
        Ok(active)
    }

    pub fn touch_learner_activity(&self, learner_id: &str) -> Result<(), StoreError> {
        let mut learner = self
            .get_learner(learner_id)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "learner".to_string(),
                key: learner_id.to_string(),
            })?;
        learner.last_active_at = Some(Utc::now());
        self.learners.insert(
            keys::learner_key(learner_id).as_bytes(),
            Self::serialize(&learner)?,
        )?;
        Ok(())
    }
}
