//! Inbound chat event model

use serde::Deserialize;

/// A channel message as handed to the karma pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEvent {
    pub channel: String,
    pub text: String,
    pub user: String,
}
