use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use std::fmt;

#[derive(Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub slack: SlackConfig,
    pub notion: NotionConfig,
    pub worker: WorkerConfig,
    pub quiz: QuizEnvConfig,
}

#[derive(Clone)]
pub struct SlackConfig {
    pub bot_token: String,
    pub signing_secret: String,
    pub mock: bool,
    pub timeout_secs: u64,
}

#[derive(Clone)]
pub struct NotionConfig {
    pub api_key: String,
    pub database_id: String,
    pub mock: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub is_leader: bool,
    pub enable_vocabulary_sync: bool,
}

#[derive(Debug, Clone)]
pub struct QuizEnvConfig {
    pub questions_per_quiz: usize,
    pub option_count: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("enable_file_logs", &self.enable_file_logs)
            .field("log_dir", &self.log_dir)
            .field("sled_path", &self.sled_path)
            .field("slack", &self.slack)
            .field("notion", &self.notion)
            .field("worker", &self.worker)
            .field("quiz", &self.quiz)
            .finish()
    }
}

impl fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_token", &"***REDACTED***")
            .field("signing_secret", &"***REDACTED***")
            .field("mock", &self.mock)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl fmt::Debug for NotionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionConfig")
            .field("api_key", &"***REDACTED***")
            .field("database_id", &self.database_id)
            .field("mock", &self.mock)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/vocab-quiz.sled"),
            slack: SlackConfig {
                bot_token: env_or("SLACK_BOT_TOKEN", ""),
                signing_secret: env_or("SLACK_SIGNING_SECRET", ""),
                mock: env_or_bool("SLACK_MOCK", true),
                timeout_secs: env_or_parse("SLACK_TIMEOUT_SECS", 10_u64),
            },
            notion: NotionConfig {
                api_key: env_or("NOTION_API_KEY", ""),
                database_id: env_or("NOTION_DATABASE_ID", ""),
                mock: env_or_bool("NOTION_MOCK", true),
                timeout_secs: env_or_parse("NOTION_TIMEOUT_SECS", 15_u64),
            },
            worker: WorkerConfig {
                is_leader: env_or_bool("WORKER_LEADER", true),
                enable_vocabulary_sync: env_or_bool("ENABLE_VOCABULARY_SYNC_WORKER", true),
            },
            quiz: QuizEnvConfig {
                questions_per_quiz: env_or_parse("QUIZ_QUESTIONS_PER_QUIZ", 5_usize),
                option_count: env_or_parse("QUIZ_OPTION_COUNT", 4_usize),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
