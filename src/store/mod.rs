pub mod keys;
pub mod operations;
pub mod trees;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use thiserror::Error;

/// Embedded record store. One tree per entity plus the secondary
/// indexes the quiz flow needs for its lookups.
#[derive(Debug)]
pub struct Store {
    db: Db,
    pub learners: sled::Tree,
    pub learners_by_slack_id: sled::Tree,
    pub vocabulary: sled::Tree,
    pub vocabulary_by_notion_page: sled::Tree,
    pub quiz_sessions: sled::Tree,
    pub attempts: sled::Tree,
    pub active_attempts: sled::Tree,
    pub attempts_by_session: sled::Tree,
    pub answers: sled::Tree,
    pub vocab_stats: sled::Tree,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("not found: entity={entity}, key={key}")]
    NotFound { entity: String, key: String },
    #[error("validation error: {0}")]
    Validation(String),
}

impl Store {
    pub fn open(sled_path: &str) -> Result<Self, StoreError> {
        let db = sled::open(sled_path)?;
        let learners = db.open_tree(trees::LEARNERS)?;
        let learners_by_slack_id = db.open_tree(trees::LEARNERS_BY_SLACK_ID)?;
        let vocabulary = db.open_tree(trees::VOCABULARY)?;
        let vocabulary_by_notion_page = db.open_tree(trees::VOCABULARY_BY_NOTION_PAGE)?;
        let quiz_sessions = db.open_tree(trees::QUIZ_SESSIONS)?;
        let attempts = db.open_tree(trees::ATTEMPTS)?;
        let active_attempts = db.open_tree(trees::ACTIVE_ATTEMPTS)?;
        let attempts_by_session = db.open_tree(trees::ATTEMPTS_BY_SESSION)?;
        let answers = db.open_tree(trees::ANSWERS)?;
        let vocab_stats = db.open_tree(trees::VOCAB_STATS)?;

        Ok(Self {
            db,
            learners,
            learners_by_slack_id,
            vocabulary,
            vocabulary_by_notion_page,
            quiz_sessions,
            attempts,
            active_attempts,
            attempts_by_session,
            answers,
            vocab_stats,
        })
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
