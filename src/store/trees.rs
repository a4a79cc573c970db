pub const LEARNERS: &str = "learners";
pub const LEARNERS_BY_SLACK_ID: &str = "learners_by_slack_id";
pub const VOCABULARY: &str = "vocabulary";
pub const VOCABULARY_BY_NOTION_PAGE: &str = "vocabulary_by_notion_page";
pub const QUIZ_SESSIONS: &str = "quiz_sessions";
pub const ATTEMPTS: &str = "attempts";
pub const ACTIVE_ATTEMPTS: &str = "active_attempts";
pub const ATTEMPTS_BY_SESSION: &str = "attempts_by_session";
pub const ANSWERS: &str = "answers";
pub const VOCAB_STATS: &str = "vocab_stats";
