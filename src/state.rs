use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::quiz::engine::QuizEngine;
use crate::services::notion::NotionClient;
use crate::services::slack::SlackClient;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    store: Arc<Store>,
    quiz_engine: Arc<QuizEngine>,
    slack: Arc<SlackClient>,
    notion: Arc<NotionClient>,
    config: Arc<Config>,
    shutdown_tx: broadcast::Sender<()>,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<Store>,
        quiz_engine: Arc<QuizEngine>,
        slack: Arc<SlackClient>,
        notion: Arc<NotionClient>,
        config: &Config,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        Self {
            store,
            quiz_engine,
            slack,
            notion,
            config: Arc::new(config.clone()),
            shutdown_tx,
            started_at: Instant::now(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn quiz(&self) -> &QuizEngine {
        &self.quiz_engine
    }

    pub fn slack(&self) -> &SlackClient {
        &self.slack
    }

    pub fn notion(&self) -> &NotionClient {
        &self.notion
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shutdown_rx(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
