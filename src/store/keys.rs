pub fn learner_key(learner_id: &str) -> String {
    learner_id.to_string()
}

pub fn learner_slack_index_key(slack_user_id: &str) -> String {
    format!("slack:{slack_user_id}")
}

pub fn vocabulary_key(vocabulary_id: &str) -> String {
    vocabulary_id.to_string()
}

pub fn vocabulary_notion_index_key(notion_page_id: &str) -> String {
    format!("page:{notion_page_id}")
}

pub fn quiz_session_key(session_id: &str) -> String {
    session_id.to_string()
}

pub fn attempt_key(attempt_id: &str) -> String {
    attempt_id.to_string()
}

pub fn active_attempt_key(learner_id: &str) -> String {
    learner_id.to_string()
}

pub fn attempt_session_index_key(learner_id: &str, session_id: &str) -> String {
    format!("{learner_id}:{session_id}")
}

/// Answers order newest first under a per-learner prefix via a reversed
/// timestamp, so recent history scans read from the front.
pub fn answer_key(learner_id: &str, timestamp_ms: i64, answer_id: &str) -> String {
    let ts = timestamp_ms.max(0) as u64;
    let reverse_ts = u64::MAX - ts;
    format!("{learner_id}:{reverse_ts:020}:{answer_id}")
}

pub fn answer_prefix(learner_id: &str) -> String {
    format!("{learner_id}:")
}

pub fn vocab_stats_key(learner_id: &str, vocabulary_id: &str) -> String {
    format!("{learner_id}:{vocabulary_id}")
}

pub fn vocab_stats_prefix(learner_id: &str) -> String {
    format!("{learner_id}:")
}
