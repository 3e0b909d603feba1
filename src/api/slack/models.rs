use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Response envelope from GET users.info
#[derive(Debug, Clone, Deserialize)]
pub struct UsersInfoResponse {
    pub ok: bool,
    pub user: Option<SlackUser>,
    pub error: Option<String>,
}

/// A workspace user as returned by users.info
#[derive(Debug, Clone, Deserialize)]
pub struct SlackUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub tz: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub profile: SlackProfile,
}

/// Profile fields nested in a users.info response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackProfile {
    #[serde(default)]
    pub display_name: String,
    pub real_name: Option<String>,
    pub image_original: Option<String>,
}

/// Request body for POST chat.postMessage
#[derive(Debug, Clone, Serialize)]
pub struct PostMessageRequest {
    pub channel: String,
    pub text: String,
}

/// Response envelope from POST chat.postMessage
#[derive(Debug, Clone, Deserialize)]
pub struct PostMessageResponse {
    pub ok: bool,
    pub error: Option<String>,
}

/// Errors from the Slack Web API client
#[derive(Debug, Error)]
pub enum SlackError {
    /// The API answered 200 with `ok: false`
    #[error("Slack API error: {0}")]
    Api(String),
    /// Non-success HTTP status
    #[error("HTTP error ({0}): {1}")]
    Http(u16, String),
    /// Network/request error
    #[error("Request error: {0}")]
    Request(String),
    /// Undecodable response body
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}
