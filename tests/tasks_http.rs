mod common;

use axum::http::{Method, StatusCode};

use common::app::{seed_vocabulary, spawn_test_app};
use common::http::{request, response_json};
use vocab_quiz_backend::store::operations::learners::Learner;
use vocab_quiz_backend::store::operations::sessions::SessionStatus;

#[tokio::test]
async fn it_sync_vocabulary_fills_the_pool() {
    let app = spawn_test_app().await;

    let resp = request(&app.app, Method::POST, "/v1/tasks/sync-vocabulary", None, &[]).await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let synced = body["data"]["synced"].as_u64().unwrap();
    assert!(synced >= 5);
    assert_eq!(
        app.state.store().count_vocabulary().unwrap(),
        synced as usize
    );
}

#[tokio::test]
async fn it_dispatch_sends_quiz_to_active_learners() {
    let app = spawn_test_app().await;
    seed_vocabulary(&app, 6);

    let learner = Learner::new("U_DISPATCH", "T1");
    store_learner(&app, &learner);

    let resp = request(&app.app, Method::POST, "/v1/tasks/dispatch", None, &[]).await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["succeeded"], 1);
    assert_eq!(body["data"]["failed"], 0);

    // first question went out over the mock transport
    let sent = app.state.slack().sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].channel, "mock-dm-U_DISPATCH");
    assert!(sent[0].payload["blocks"][0]["text"]["text"]
        .as_str()
        .unwrap()
        .contains("問題 1/5"));

    // session is marked sent and the attempt sits at question 0
    let attempt = app
        .state
        .store()
        .get_active_attempt(&learner.id)
        .unwrap()
        .expect("active attempt");
    assert_eq!(attempt.current_question_index, 0);
    assert_eq!(attempt.score, 0);

    let session = app
        .state
        .store()
        .get_quiz_session(&attempt.session_id)
        .unwrap()
        .expect("session");
    assert_eq!(session.status, SessionStatus::Sent);
    assert_eq!(session.questions.len(), 5);
}

#[tokio::test]
async fn it_dispatch_reports_failures_without_aborting() {
    let app = spawn_test_app().await;
    // no vocabulary seeded: every learner fails, the sweep still finishes

    store_learner(&app, &Learner::new("U_A", "T1"));
    store_learner(&app, &Learner::new("U_B", "T1"));

    let resp = request(&app.app, Method::POST, "/v1/tasks/dispatch", None, &[]).await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["succeeded"], 0);
    assert_eq!(body["data"]["failed"], 2);
}

fn store_learner(app: &common::app::TestApp, learner: &Learner) {
    app.state
        .store()
        .create_learner(learner)
        .expect("create learner");
}
