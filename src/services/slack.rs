//! Thin Slack Web API client. The rest of the system hands it finished
//! message payloads; it owns delivery, timeouts and a single retry on
//! transport failure. Mock mode records outbound traffic instead of
//! calling the network.

use std::sync::Mutex;

use serde::Deserialize;

use crate::config::SlackConfig;

const SLACK_API_BASE: &str = "https://slack.com/api";

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub channel: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, thiserror::Error)]
pub enum SlackError {
    #[error("slack network error: {0}")]
    Network(String),
    #[error("slack api error: {0}")]
    Api(String),
    #[error("slack did not return a dm channel")]
    MissingChannel,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    ok: bool,
    error: Option<String>,
    channel: Option<ChannelRef>,
}

#[derive(Debug, Deserialize)]
struct ChannelRef {
    id: String,
}

#[derive(Debug)]
pub struct SlackClient {
    config: SlackConfig,
    client: reqwest::Client,
    outbox: Mutex<Vec<OutboundMessage>>,
}

impl SlackClient {
    pub fn new(config: &SlackConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            config: config.clone(),
            client,
            outbox: Mutex::new(Vec::new()),
        }
    }

    /// Open (or reuse) the DM channel with a workspace member.
    pub async fn open_dm(&self, slack_user_id: &str) -> Result<String, SlackError> {
        if self.config.mock {
            return Ok(format!("mock-dm-{slack_user_id}"));
        }

        let envelope = self
            .call_with_retry(
                "conversations.open",
                &serde_json::json!({ "users": slack_user_id }),
            )
            .await?;
        envelope
            .channel
            .map(|c| c.id)
            .ok_or(SlackError::MissingChannel)
    }

    /// Deliver one message payload (`blocks` or `text` body) to a
    /// channel.
    pub async fn post_message(
        &self,
        channel: &str,
        payload: &serde_json::Value,
    ) -> Result<(), SlackError> {
        if self.config.mock {
            let mut outbox = self.outbox.lock().expect("slack outbox lock");
            outbox.push(OutboundMessage {
                channel: channel.to_string(),
                payload: payload.clone(),
            });
            return Ok(());
        }

        let mut body = payload.clone();
        if let Some(map) = body.as_object_mut() {
            map.insert(
                "channel".to_string(),
                serde_json::Value::String(channel.to_string()),
            );
        }

        self.call_with_retry("chat.postMessage", &body).await?;
        Ok(())
    }

    /// Transport failures are retried once, then surfaced. API-level
    /// rejections are never retried.
    async fn call_with_retry(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<ApiEnvelope, SlackError> {
        match self.call(method, body).await {
            Err(SlackError::Network(first)) => {
                tracing::warn!(error = %first, method, "Slack call failed, retrying once");
                self.call(method, body).await
            }
            other => other,
        }
    }

    async fn call(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<ApiEnvelope, SlackError> {
        let response = self
            .client
            .post(format!("{SLACK_API_BASE}/{method}"))
            .bearer_auth(&self.config.bot_token)
            .json(body)
            .send()
            .await
            .map_err(|e| SlackError::Network(e.to_string()))?;

        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|e| SlackError::Network(e.to_string()))?;

        if !envelope.ok {
            return Err(SlackError::Api(
                envelope.error.unwrap_or_else(|| "unknown".to_string()),
            ));
        }
        Ok(envelope)
    }

    /// Messages recorded in mock mode, oldest first.
    pub fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.outbox.lock().expect("slack outbox lock").clone()
    }
}
