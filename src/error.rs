use thiserror::Error;

use crate::api::openai::OpenAiError;
use crate::api::slack::SlackError;

/// Errors surfaced by the karma and prompting pipelines
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Slack error: {0}")]
    Slack(#[from] SlackError),
    #[error("OpenAI error: {0}")]
    OpenAi(#[from] OpenAiError),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// The tool-selection call chose no reporting functions
    #[error("no tools were selected")]
    NoToolsSelected,
}
