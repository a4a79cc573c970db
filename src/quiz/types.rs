use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 出题方向。多选题只出 英→日，干扰项取自词库的日文释义。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    EnToJp,
    JpToEn,
    MultipleChoice,
}

impl QuestionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnToJp => "en_to_jp",
            Self::JpToEn => "jp_to_en",
            Self::MultipleChoice => "multiple_choice",
        }
    }
}

/// One question inside a quiz session. Built once at assembly time and
/// stored verbatim with the session, so answering never re-derives state
/// from the live vocabulary pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub vocabulary_id: String,
    pub kind: QuestionKind,
    pub prompt: String,
    pub correct_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub english: String,
    pub japanese: String,
}

/// Weighted view over a vocabulary entry, rebuilt per sampling call from
/// the pool plus the learner's stats. Never persisted.
#[derive(Debug, Clone)]
pub struct WeightedItem<T> {
    pub id: String,
    pub weight: f64,
    pub data: T,
}

/// Unseen entries start at weight 1.0; stats raise it for weak words.
pub const DEFAULT_WEIGHT: f64 = 1.0;

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("insufficient vocabulary: pool has {available} entries, need {needed}")]
    InsufficientVocabulary { available: usize, needed: usize },
    #[error("invalid quiz state: {0}")]
    InvalidState(String),
    #[error("answer targets a question that is no longer current")]
    StaleAnswer,
    #[error("free-text answer is not accepted for a button question")]
    WrongInputChannel,
}
