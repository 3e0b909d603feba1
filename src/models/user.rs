//! User directory models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Profile data for a directory upsert, built from a `users.info` lookup.
///
/// `real_name` is `None` when the platform returned none (or an empty
/// string); the reporting queries exclude such users.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub username: String,
    pub display_name: String,
    pub real_name: Option<String>,
    pub avatar_url: Option<String>,
    pub timezone: Option<String>,
    pub is_bot: bool,
    pub is_active: bool,
}

/// Persisted directory row, keyed by (provider, provider_id)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub id: String,
    pub provider: String,
    pub provider_id: String,
    pub username: String,
    pub display_name: String,
    pub real_name: Option<String>,
    pub avatar_url: Option<String>,
    pub timezone: Option<String>,
    pub is_bot: bool,
    pub is_active: bool,
}
