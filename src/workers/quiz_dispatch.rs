//! Scheduled quiz dispatch: one independent unit of work per active
//! learner. A failure for one learner is logged and counted, the sweep
//! always continues with the rest.

use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;

use crate::quiz::engine::{EngineError, QuizEngine};
use crate::services::messages;
use crate::services::slack::{SlackClient, SlackError};
use crate::store::operations::learners::Learner;
use crate::store::Store;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Error)]
enum DispatchError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Slack(#[from] SlackError),
}

pub async fn run(store: &Store, engine: &QuizEngine, slack: &SlackClient) -> DispatchReport {
    let learners = match store.list_active_learners() {
        Ok(learners) => learners,
        Err(e) => {
            tracing::error!(error = %e, "Quiz dispatch: failed to list learners");
            return DispatchReport {
                total: 0,
                succeeded: 0,
                failed: 0,
            };
        }
    };

    if learners.is_empty() {
        tracing::info!("Quiz dispatch: no active learners");
        return DispatchReport {
            total: 0,
            succeeded: 0,
            failed: 0,
        };
    }

    let total = learners.len();
    let results = join_all(
        learners
            .into_iter()
            .map(|learner| dispatch_one(engine, slack, learner)),
    )
    .await;

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let failed = total - succeeded;
    tracing::info!(total, succeeded, failed, "Quiz dispatch finished");

    DispatchReport {
        total,
        succeeded,
        failed,
    }
}

async fn dispatch_one(
    engine: &QuizEngine,
    slack: &SlackClient,
    learner: Learner,
) -> Result<(), DispatchError> {
    let result = send_quiz(engine, slack, &learner).await;
    if let Err(e) = &result {
        tracing::warn!(
            error = %e,
            learner_id = %learner.id,
            slack_user_id = %learner.slack_user_id,
            "Failed to dispatch quiz"
        );
    }
    result
}

async fn send_quiz(
    engine: &QuizEngine,
    slack: &SlackClient,
    learner: &Learner,
) -> Result<(), DispatchError> {
    let prepared = engine.prepare_quiz(learner)?;
    let total = prepared.session.questions.len();

    // create_quiz_session rejects empty sessions, so the first question
    // is always there
    let first = &prepared.session.questions[0];
    let payload = messages::format_question(first, 1, total, &prepared.session.id);

    let channel = slack.open_dm(&learner.slack_user_id).await?;
    slack.post_message(&channel, &payload).await?;

    engine.mark_quiz_sent(&prepared.session.id)?;
    tracing::info!(
        learner_id = %learner.id,
        session_id = %prepared.session.id,
        "Quiz sent"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::config::SlackConfig;
    use crate::quiz::config::QuizConfig;
    use crate::store::operations::learners::Learner;
    use crate::store::operations::sessions::SessionStatus;
    use crate::store::operations::vocabulary::VocabularyUpsert;

    use super::*;

    fn setup() -> (Arc<Store>, QuizEngine, SlackClient, tempfile::TempDir) {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(
            Store::open(tmp.path().join("dispatch.sled").to_str().unwrap()).expect("open store"),
        );
        let engine = QuizEngine::new(QuizConfig::default(), store.clone());
        let slack = SlackClient::new(&SlackConfig {
            bot_token: String::new(),
            signing_secret: "secret".to_string(),
            mock: true,
            timeout_secs: 1,
        });
        (store, engine, slack, tmp)
    }

    fn seed_vocabulary(store: &Store) {
        let entries: Vec<VocabularyUpsert> = (0..6)
            .map(|i| VocabularyUpsert {
                notion_page_id: format!("page-{i}"),
                english: format!("word{i}"),
                japanese: format!("単語{i}"),
            })
            .collect();
        store.upsert_vocabulary(&entries).unwrap();
    }

    #[tokio::test]
    async fn dispatch_sends_first_question_to_each_learner() {
        let (store, engine, slack, _tmp) = setup();
        seed_vocabulary(&store);
        let a = Learner::new("U1", "T1");
        let b = Learner::new("U2", "T1");
        store.create_learner(&a).unwrap();
        store.create_learner(&b).unwrap();

        let report = run(&store, &engine, &slack).await;
        assert_eq!(report.total, 2);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 0);

        let sent = slack.sent_messages();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().any(|m| m.channel == "mock-dm-U1"));
        assert!(sent.iter().any(|m| m.channel == "mock-dm-U2"));

        // both learners now have an active attempt on a sent session
        for learner in [&a, &b] {
            let attempt = store.get_active_attempt(&learner.id).unwrap().unwrap();
            let session = store.get_quiz_session(&attempt.session_id).unwrap().unwrap();
            assert_eq!(session.status, SessionStatus::Sent);
        }
    }

    #[tokio::test]
    async fn empty_pool_fails_learners_without_aborting_sweep() {
        let (store, engine, slack, _tmp) = setup();
        store.create_learner(&Learner::new("U1", "T1")).unwrap();

        let report = run(&store, &engine, &slack).await;
        assert_eq!(report.total, 1);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed, 1);
        assert!(slack.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn no_learners_is_a_clean_noop() {
        let (store, engine, slack, _tmp) = setup();
        let report = run(&store, &engine, &slack).await;
        assert_eq!(report.total, 0);
        assert_eq!(report.succeeded, 0);
    }
}
