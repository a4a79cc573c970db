use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::broadcast;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use vocab_quiz_backend::config::Config;
use vocab_quiz_backend::logging::{init_tracing, LogConfig};
use vocab_quiz_backend::quiz::config::QuizConfig;
use vocab_quiz_backend::quiz::engine::QuizEngine;
use vocab_quiz_backend::routes::build_router;
use vocab_quiz_backend::services::notion::NotionClient;
use vocab_quiz_backend::services::slack::SlackClient;
use vocab_quiz_backend::state::AppState;
use vocab_quiz_backend::store::Store;
use vocab_quiz_backend::workers::WorkerManager;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    init_tracing(&LogConfig {
        log_level: config.log_level.clone(),
        enable_file_logs: config.enable_file_logs,
        log_dir: config.log_dir.clone(),
    });
    tracing::info!("Starting vocab-quiz-backend");

    if !config.slack.mock && config.slack.bot_token.is_empty() {
        panic!("SLACK_BOT_TOKEN must be set when SLACK_MOCK=false");
    }
    if !config.slack.mock && config.slack.signing_secret.is_empty() {
        panic!("SLACK_SIGNING_SECRET must be set when SLACK_MOCK=false");
    }
    if !config.notion.mock && (config.notion.api_key.is_empty() || config.notion.database_id.is_empty()) {
        panic!("NOTION_API_KEY and NOTION_DATABASE_ID must be set when NOTION_MOCK=false");
    }

    let store = Arc::new(Store::open(&config.sled_path).expect("Failed to open sled database"));

    let (shutdown_tx, _) = broadcast::channel::<()>(8);

    let quiz_engine = Arc::new(QuizEngine::new(QuizConfig::from_env(&config.quiz), store.clone()));
    let slack = Arc::new(SlackClient::new(&config.slack));
    let notion = Arc::new(NotionClient::new(&config.notion));

    let state = AppState::new(
        store.clone(),
        quiz_engine.clone(),
        slack.clone(),
        notion.clone(),
        &config,
        shutdown_tx.clone(),
    );

    let worker_handle = if config.worker.is_leader {
        let worker_manager = WorkerManager::new(
            store.clone(),
            quiz_engine,
            slack,
            notion,
            shutdown_tx.subscribe(),
            &config.worker,
        );
        Some(tokio::spawn(async move {
            if let Err(e) = worker_manager.start().await {
                tracing::error!(error = %e, "Worker manager failed");
            }
        }))
    } else {
        None
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new());

    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");

    let server_future =
        axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(shutdown_tx.clone()));

    if let Some(handle) = worker_handle {
        // Worker 作为独立后台任务运行，panic 仅记录错误，不终止 HTTP 服务
        tokio::spawn(async move {
            match handle.await {
                Err(e) => {
                    tracing::error!(error = %e, "Worker task panicked, HTTP server continues")
                }
                Ok(()) => tracing::info!("Worker manager exited normally"),
            }
        });
    }

    if let Err(e) = server_future.await {
        tracing::error!(error = %e, "HTTP server crashed");
    }

    tracing::info!("Flushing store before exit");
    if let Err(e) = store.flush() {
        tracing::error!(error = %e, "Failed to flush store before exit");
    }
    tracing::info!("Shutdown complete");
}

async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = sigterm.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
