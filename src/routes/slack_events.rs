use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, error, warn};

use super::AppState;
use crate::models::event::MessageEvent;
use crate::services::karma_service;

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed skew between the request timestamp header and local time
const MAX_TIMESTAMP_SKEW_SECS: i64 = 300;

/// Events API envelope; only the fields the webhook dispatches on
#[derive(Debug, Deserialize)]
struct EventEnvelope {
    #[serde(rename = "type")]
    kind: String,
    challenge: Option<String>,
    event: Option<InnerEvent>,
}

#[derive(Debug, Deserialize)]
struct InnerEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    channel: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    user: String,
}

/// POST /api/slack/events
///
/// Answers url_verification challenges inline. Every other payload is
/// acknowledged with "OK" right away; signature verification and the karma
/// pipeline run on a background task.
pub async fn handle_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let envelope: EventEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("undecodable event payload: {}", e);
            return (StatusCode::BAD_REQUEST, String::new());
        }
    };

    // Challenge echo happens before any signature check so the initial
    // subscription handshake succeeds.
    if envelope.kind == "url_verification" {
        let challenge = envelope.challenge.unwrap_or_default();
        return (StatusCode::OK, challenge);
    }

    tokio::spawn(process_event(state, headers, body, envelope));

    (StatusCode::OK, "OK".to_string())
}

async fn process_event(state: AppState, headers: HeaderMap, body: Bytes, envelope: EventEnvelope) {
    if !verify_signature(&state.config.slack_signing_secret, &headers, &body) {
        warn!("rejected event with missing or invalid signature");
        return;
    }

    if envelope.kind != "event_callback" {
        debug!("ignoring event of type {}", envelope.kind);
        return;
    }
    let Some(event) = envelope.event else {
        return;
    };
    if event.kind != "message" || event.channel != state.config.channel_id {
        return;
    }

    let message = MessageEvent {
        channel: event.channel,
        text: event.text,
        user: event.user,
    };
    if let Err(e) = karma_service::process_message(&state.pool, &state.slack, &message).await {
        error!("karma pipeline failed: {}", e);
    }
}

/// Verify the v0 signing scheme: HMAC-SHA256 over "v0:{timestamp}:{body}"
/// with the signing secret, hex-encoded and prefixed with "v0=". Requests
/// older than five minutes are rejected outright.
fn verify_signature(signing_secret: &str, headers: &HeaderMap, body: &[u8]) -> bool {
    let Some(timestamp) = headers
        .get("X-Slack-Request-Timestamp")
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };
    let Ok(timestamp_secs) = timestamp.parse::<i64>() else {
        return false;
    };
    if (Utc::now().timestamp() - timestamp_secs).abs() > MAX_TIMESTAMP_SKEW_SECS {
        return false;
    }

    let Some(signature) = headers
        .get("X-Slack-Signature")
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };
    let Some(hex_signature) = signature.strip_prefix("v0=") else {
        return false;
    };
    let Ok(signature_bytes) = hex::decode(hex_signature) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(signing_secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("v0:{}:", timestamp).as_bytes());
    mac.update(body);
    mac.verify_slice(&signature_bytes).is_ok()
}
