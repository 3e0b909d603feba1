//! HTTP boundary
//!
//! Three POST endpoints: the Slack events webhook feeding the karma
//! pipeline, and the two prompting triggers. Handlers acknowledge
//! immediately and run pipelines on background tasks; pipeline failures
//! after the acknowledgment are logged, not surfaced to the caller.

use std::sync::Arc;

use axum::routing::post;
use axum::Router;
use sqlx::sqlite::SqlitePool;

use crate::api::openai::OpenAiClient;
use crate::api::slack::SlackClient;
use crate::config::AppConfig;

pub mod prompting;
pub mod slack_events;

/// Handler state injected via [`axum::extract::State`]; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub slack: Arc<SlackClient>,
    pub openai: Arc<OpenAiClient>,
    pub config: Arc<AppConfig>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/slack/events", post(slack_events::handle_event))
        .route("/api/kata-prompting", post(prompting::kata_prompting))
        .route("/api/ai-weekly-summary", post(prompting::ai_weekly_summary))
        .with_state(state)
}
