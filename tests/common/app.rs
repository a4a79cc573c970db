use std::sync::Arc;

use axum::Router;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tempfile::TempDir;
use tokio::sync::broadcast;

use vocab_quiz_backend::config::{
    Config, NotionConfig, QuizEnvConfig, SlackConfig, WorkerConfig,
};
use vocab_quiz_backend::quiz::config::QuizConfig;
use vocab_quiz_backend::quiz::engine::QuizEngine;
use vocab_quiz_backend::routes::build_router;
use vocab_quiz_backend::services::notion::NotionClient;
use vocab_quiz_backend::services::slack::SlackClient;
use vocab_quiz_backend::state::AppState;
use vocab_quiz_backend::store::operations::vocabulary::VocabularyUpsert;
use vocab_quiz_backend::store::Store;

pub const TEST_SIGNING_SECRET: &str = "integration-test-signing-secret";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    _temp_dir: TempDir,
}

pub async fn spawn_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let sled_path = temp_dir.path().join("vocab-quiz-test.sled");

    // 直接构造 Config，避免 set_var 在多线程测试下的环境变量竞态
    let config = Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 3000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        sled_path: sled_path.to_string_lossy().to_string(),
        slack: SlackConfig {
            bot_token: String::new(),
            signing_secret: TEST_SIGNING_SECRET.to_string(),
            mock: true,
            timeout_secs: 1,
        },
        notion: NotionConfig {
            api_key: String::new(),
            database_id: String::new(),
            mock: true,
            timeout_secs: 1,
        },
        worker: WorkerConfig {
            is_leader: false,
            enable_vocabulary_sync: true,
        },
        quiz: QuizEnvConfig {
            questions_per_quiz: 5,
            option_count: 4,
        },
    };

    let store = Arc::new(Store::open(&config.sled_path).expect("open store"));
    let quiz_engine = Arc::new(QuizEngine::new(
        QuizConfig::from_env(&config.quiz),
        store.clone(),
    ));
    let slack = Arc::new(SlackClient::new(&config.slack));
    let notion = Arc::new(NotionClient::new(&config.notion));
    let (shutdown_tx, _) = broadcast::channel::<()>(8);

    let state = AppState::new(store, quiz_engine, slack, notion, &config, shutdown_tx);
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        _temp_dir: temp_dir,
    }
}

/// Seed `n` vocabulary entries straight into the store.
pub fn seed_vocabulary(app: &TestApp, n: usize) {
    let entries: Vec<VocabularyUpsert> = (0..n)
        .map(|i| VocabularyUpsert {
            notion_page_id: format!("seed-page-{i}"),
            english: format!("word{i}"),
            japanese: format!("単語{i}"),
        })
        .collect();
    app.state
        .store()
        .upsert_vocabulary(&entries)
        .expect("seed vocabulary");
}

/// Slack v0 request signature headers for a raw body.
pub fn slack_signature_headers(body: &str) -> Vec<(&'static str, String)> {
    let timestamp = chrono::Utc::now().timestamp().to_string();

    let mut mac = Hmac::<Sha256>::new_from_slice(TEST_SIGNING_SECRET.as_bytes())
        .expect("hmac from test secret");
    mac.update(format!("v0:{timestamp}:{body}").as_bytes());
    let signature = format!("v0={}", hex::encode(mac.finalize().into_bytes()));

    vec![
        ("x-slack-request-timestamp", timestamp),
        ("x-slack-signature", signature),
    ]
}
