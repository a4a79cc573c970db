//! Slack webhook boundary. Requests are authenticated with the v0
//! request-signature scheme, then parsed into typed payload records
//! before anything reaches the quiz engine. Handlers always answer 200
//! once the signature checks out; learner-visible problems become
//! friendly chat messages instead of HTTP errors.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::quiz::engine::EngineError;
use crate::quiz::progression::TurnOutput;
use crate::quiz::types::QuizError;
use crate::response::AppError;
use crate::services::messages::{
    self, ButtonValue, MSG_ANSWER_WITH_BUTTON, MSG_GENERIC_ERROR, MSG_LEARNER_NOT_FOUND,
    MSG_NO_ACTIVE_QUIZ, MSG_QUESTION_ALREADY_ANSWERED,
};
use crate::state::AppState;
use crate::store::operations::learners::Learner;

/// Signed requests older than this are treated as replays.
const SIGNATURE_REPLAY_WINDOW_SECS: i64 = 300;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", post(handle_events))
        .route("/interactions", post(handle_interactions))
}

// ---------------------------------------------------------------------------
// Request signature

type HmacSha256 = Hmac<Sha256>;

pub fn verify_slack_signature(
    signing_secret: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), AppError> {
    if signing_secret.is_empty() {
        return Err(AppError::unauthorized("signing secret not configured"));
    }

    let timestamp = headers
        .get("x-slack-request-timestamp")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("missing request timestamp"))?;
    let signature = headers
        .get("x-slack-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("missing request signature"))?;

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| AppError::unauthorized("malformed request timestamp"))?;
    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > SIGNATURE_REPLAY_WINDOW_SECS {
        return Err(AppError::unauthorized("request timestamp out of window"));
    }

    let expected = signature
        .strip_prefix("v0=")
        .ok_or_else(|| AppError::unauthorized("unsupported signature version"))?;
    let expected_bytes =
        hex::decode(expected).map_err(|_| AppError::unauthorized("malformed signature"))?;

    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .map_err(|_| AppError::unauthorized("unusable signing secret"))?;
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);

    mac.verify_slice(&expected_bytes)
        .map_err(|_| AppError::unauthorized("signature mismatch"))
}

// ---------------------------------------------------------------------------
// Events API

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum EventPayload {
    UrlVerification { challenge: String },
    EventCallback { event: InboundEvent },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InboundEvent {
    Message(MessageEvent),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageEvent {
    user: Option<String>,
    text: Option<String>,
    channel: Option<String>,
    team: Option<String>,
    bot_id: Option<String>,
    subtype: Option<String>,
}

async fn handle_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    verify_slack_signature(&state.config().slack.signing_secret, &headers, &body)?;

    let payload: EventPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::bad_request("MALFORMED_PAYLOAD", &e.to_string()))?;

    match payload {
        EventPayload::UrlVerification { challenge } => {
            Ok(Json(serde_json::json!({ "challenge": challenge })).into_response())
        }
        EventPayload::EventCallback { event } => {
            if let InboundEvent::Message(message) = event {
                handle_message_event(&state, message).await;
            }
            Ok(().into_response())
        }
        EventPayload::Other => Ok(().into_response()),
    }
}

async fn handle_message_event(state: &AppState, message: MessageEvent) {
    // Bot echoes and message edits/joins carry bot_id or subtype; both
    // are outside the quiz conversation.
    if message.bot_id.is_some() || message.subtype.is_some() {
        return;
    }
    let (Some(slack_user_id), Some(channel), Some(text)) =
        (message.user, message.channel, message.text)
    else {
        return;
    };
    let text = text.trim().to_string();

    let learner = match state.store().get_learner_by_slack_id(&slack_user_id) {
        Ok(Some(learner)) => learner,
        Ok(None) => {
            register_learner(state, &slack_user_id, message.team.as_deref(), &channel).await;
            return;
        }
        Err(e) => {
            tracing::error!(error = %e, "Learner lookup failed");
            say(state, &channel, &messages::plain_text(MSG_GENERIC_ERROR)).await;
            return;
        }
    };

    if let Err(e) = state.store().touch_learner_activity(&learner.id) {
        tracing::warn!(error = %e, learner_id = %learner.id, "Failed to update learner activity");
    }

    match state.quiz().handle_text_answer(&learner, &text) {
        Ok(turn) => deliver_turn(state, &channel, &turn).await,
        Err(e) => say_turn_error(state, &channel, &e).await,
    }
}

async fn register_learner(
    state: &AppState,
    slack_user_id: &str,
    team_id: Option<&str>,
    channel: &str,
) {
    let learner = Learner::new(slack_user_id, team_id.unwrap_or_default());
    match state.store().create_learner(&learner) {
        Ok(()) => {
            tracing::info!(slack_user_id, learner_id = %learner.id, "Registered new learner");
            say(state, channel, &messages::format_welcome()).await;
        }
        Err(e) => {
            tracing::error!(error = %e, slack_user_id, "Failed to register learner");
            say(state, channel, &messages::plain_text(MSG_GENERIC_ERROR)).await;
        }
    }
}

// ---------------------------------------------------------------------------
// Interactivity (button clicks)

#[derive(Debug, Deserialize)]
struct InteractionForm {
    payload: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InteractionPayload {
    BlockActions {
        user: UserRef,
        #[serde(default)]
        actions: Vec<BlockAction>,
        channel: Option<ChannelRef>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct UserRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ChannelRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct BlockAction {
    value: Option<String>,
}

async fn handle_interactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    verify_slack_signature(&state.config().slack.signing_secret, &headers, &body)?;

    let form: InteractionForm = serde_urlencoded::from_bytes(&body)
        .map_err(|e| AppError::bad_request("MALFORMED_PAYLOAD", &e.to_string()))?;
    let payload: InteractionPayload = serde_json::from_str(&form.payload)
        .map_err(|e| AppError::bad_request("MALFORMED_PAYLOAD", &e.to_string()))?;

    let InteractionPayload::BlockActions {
        user,
        actions,
        channel,
    } = payload
    else {
        return Ok(().into_response());
    };

    let Some(value_raw) = actions.into_iter().next().and_then(|a| a.value) else {
        return Ok(().into_response());
    };
    let value: ButtonValue = serde_json::from_str(&value_raw)
        .map_err(|e| AppError::bad_request("MALFORMED_PAYLOAD", &e.to_string()))?;

    let channel = match channel {
        Some(c) => c.id,
        None => match state.slack().open_dm(&user.id).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(error = %e, "Failed to open DM for interaction reply");
                return Ok(().into_response());
            }
        },
    };

    let learner = match state.store().get_learner_by_slack_id(&user.id) {
        Ok(Some(learner)) => learner,
        Ok(None) => {
            say(&state, &channel, &messages::plain_text(MSG_LEARNER_NOT_FOUND)).await;
            return Ok(().into_response());
        }
        Err(e) => {
            tracing::error!(error = %e, "Learner lookup failed");
            say(&state, &channel, &messages::plain_text(MSG_GENERIC_ERROR)).await;
            return Ok(().into_response());
        }
    };

    match state.quiz().handle_button_answer(
        &learner,
        &value.session_id,
        &value.question_id,
        &value.answer,
    ) {
        Ok(turn) => deliver_turn(&state, &channel, &turn).await,
        Err(e) => say_turn_error(&state, &channel, &e).await,
    }

    Ok(().into_response())
}

// ---------------------------------------------------------------------------
// Shared turn delivery

async fn deliver_turn(state: &AppState, channel: &str, turn: &TurnOutput) {
    say(state, channel, &messages::format_feedback(&turn.feedback)).await;

    if let Some(summary) = &turn.completion {
        say(state, channel, &messages::format_completion(summary)).await;
    } else if let Some(next) = &turn.next_question {
        let payload = messages::format_question(
            next,
            turn.attempt.current_question_index + 1,
            turn.feedback.total,
            &turn.attempt.session_id,
        );
        say(state, channel, &payload).await;
    }
}

async fn say_turn_error(state: &AppState, channel: &str, error: &EngineError) {
    let text = match error {
        EngineError::NoActiveAttempt(_) => MSG_NO_ACTIVE_QUIZ,
        EngineError::Quiz(QuizError::WrongInputChannel) => MSG_ANSWER_WITH_BUTTON,
        EngineError::Quiz(QuizError::StaleAnswer) => MSG_QUESTION_ALREADY_ANSWERED,
        other => {
            tracing::error!(error = %other, "Answer turn failed");
            MSG_GENERIC_ERROR
        }
    };
    say(state, channel, &messages::plain_text(text)).await;
}

async fn say(state: &AppState, channel: &str, payload: &serde_json::Value) {
    if let Err(e) = state.slack().post_message(channel, payload).await {
        tracing::error!(error = %e, channel, "Failed to deliver Slack message");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_headers(secret: &str, body: &str, ts: i64) -> HeaderMap {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("v0:{ts}:{body}").as_bytes());
        let signature = format!("v0={}", hex::encode(mac.finalize().into_bytes()));

        let mut headers = HeaderMap::new();
        headers.insert("x-slack-request-timestamp", ts.to_string().parse().unwrap());
        headers.insert("x-slack-signature", signature.parse().unwrap());
        headers
    }

    #[test]
    fn valid_signature_passes() {
        let body = r#"{"type":"url_verification"}"#;
        let ts = chrono::Utc::now().timestamp();
        let headers = signed_headers("secret", body, ts);
        assert!(verify_slack_signature("secret", &headers, body.as_bytes()).is_ok());
    }

    #[test]
    fn wrong_secret_fails() {
        let body = "{}";
        let ts = chrono::Utc::now().timestamp();
        let headers = signed_headers("other-secret", body, ts);
        assert!(verify_slack_signature("secret", &headers, body.as_bytes()).is_err());
    }

    #[test]
    fn tampered_body_fails() {
        let ts = chrono::Utc::now().timestamp();
        let headers = signed_headers("secret", "{}", ts);
        assert!(verify_slack_signature("secret", &headers, b"{tampered}").is_err());
    }

    #[test]
    fn stale_timestamp_fails() {
        let body = "{}";
        let ts = chrono::Utc::now().timestamp() - SIGNATURE_REPLAY_WINDOW_SECS - 10;
        let headers = signed_headers("secret", body, ts);
        assert!(verify_slack_signature("secret", &headers, body.as_bytes()).is_err());
    }

    #[test]
    fn missing_headers_fail() {
        let headers = HeaderMap::new();
        assert!(verify_slack_signature("secret", &headers, b"{}").is_err());
    }

    #[test]
    fn event_payload_parses_message_events() {
        let raw = r#"{
            "type": "event_callback",
            "event": {
                "type": "message",
                "user": "U123",
                "text": "犬",
                "channel": "D456",
                "team": "T1"
            }
        }"#;
        let payload: EventPayload = serde_json::from_str(raw).unwrap();
        let EventPayload::EventCallback {
            event: InboundEvent::Message(message),
        } = payload
        else {
            panic!("expected message event");
        };
        assert_eq!(message.user.as_deref(), Some("U123"));
        assert_eq!(message.text.as_deref(), Some("犬"));
        assert!(message.bot_id.is_none());
    }

    #[test]
    fn unknown_payload_types_parse_as_other() {
        let payload: EventPayload = serde_json::from_str(r#"{"type":"app_rate_limited"}"#).unwrap();
        assert!(matches!(payload, EventPayload::Other));

        let event: InboundEvent = serde_json::from_str(r#"{"type":"reaction_added"}"#).unwrap();
        assert!(matches!(event, InboundEvent::Other));
    }

    #[test]
    fn interaction_payload_parses_block_actions() {
        let raw = r#"{
            "type": "block_actions",
            "user": { "id": "U123" },
            "channel": { "id": "D456" },
            "actions": [
                { "value": "{\"sessionId\":\"s1\",\"questionId\":\"q1\",\"answer\":\"犬\"}" }
            ]
        }"#;
        let payload: InteractionPayload = serde_json::from_str(raw).unwrap();
        let InteractionPayload::BlockActions { user, actions, .. } = payload else {
            panic!("expected block actions");
        };
        assert_eq!(user.id, "U123");

        let value: ButtonValue =
            serde_json::from_str(actions[0].value.as_ref().unwrap()).unwrap();
        assert_eq!(value.question_id, "q1");
    }
}
