use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use super::AppState;
use crate::services::agent_service;

#[derive(Debug, Deserialize)]
pub struct PromptingRequest {
    pub channel: String,
    pub tools: String,
    pub prompt: String,
}

/// POST /api/kata-prompting
///
/// Fires the explicit-selection pipeline in the background and returns
/// success immediately.
pub async fn kata_prompting(
    State(state): State<AppState>,
    Json(request): Json<PromptingRequest>,
) -> Json<Value> {
    info!("kata prompting request for channel {}", request.channel);

    tokio::spawn(async move {
        if let Err(e) = agent_service::run_kata_prompting(
            &state.pool,
            &state.slack,
            &state.openai,
            &request.channel,
            &request.tools,
            &request.prompt,
        )
        .await
        {
            error!("kata prompting pipeline failed: {}", e);
        }
    });

    Json(json!({ "success": true }))
}

/// POST /api/ai-weekly-summary
///
/// Requires the shared API key in the Authorization header and non-empty
/// channel/tools/prompt fields, then fires the weekly-summary pipeline in
/// the background.
pub async fn ai_weekly_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value == state.config.api_key)
        .unwrap_or(false);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "error": "Unauthorized" })),
        );
    }

    let channel = non_empty_field(&request, "channel");
    let tools = non_empty_field(&request, "tools");
    let prompt = non_empty_field(&request, "prompt");
    // tools is validated but unused: the weekly summary always runs all
    // three reporting functions.
    let (Some(channel), Some(_), Some(prompt)) = (channel, tools, prompt) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "Missing required fields" })),
        );
    };

    info!("weekly summary request for channel {}", channel);

    tokio::spawn(async move {
        if let Err(e) = agent_service::run_weekly_summary(
            &state.pool,
            &state.slack,
            &state.openai,
            &channel,
            &prompt,
        )
        .await
        {
            error!("weekly summary pipeline failed: {}", e);
        }
    });

    (StatusCode::OK, Json(json!({ "success": true })))
}

fn non_empty_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(|value| value.as_str())
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}
