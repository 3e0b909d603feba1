use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::models::user::{UserProfile, UserRecord};

/// Insert a directory entry for (provider, provider_id) unless one exists,
/// then return the stored record. The insert-or-ignore keeps concurrent
/// upserts for the same user from racing.
pub async fn create_user_if_not_exists(
    pool: &SqlitePool,
    provider: &str,
    provider_id: &str,
    profile: &UserProfile,
) -> Result<UserRecord, sqlx::Error> {
    sqlx::query(
        "INSERT INTO users \
         (id, provider, provider_id, username, display_name, real_name, avatar_url, timezone, is_bot, is_active) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT (provider, provider_id) DO NOTHING",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(provider)
    .bind(provider_id)
    .bind(&profile.username)
    .bind(&profile.display_name)
    .bind(&profile.real_name)
    .bind(&profile.avatar_url)
    .bind(&profile.timezone)
    .bind(profile.is_bot)
    .bind(profile.is_active)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, UserRecord>(
        "SELECT id, provider, provider_id, username, display_name, real_name, avatar_url, timezone, is_bot, is_active \
         FROM users WHERE provider = ? AND provider_id = ?",
    )
    .bind(provider)
    .bind(provider_id)
    .fetch_one(pool)
    .await
}

/// Get a directory entry by (provider, provider_id)
pub async fn get_user(
    pool: &SqlitePool,
    provider: &str,
    provider_id: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    sqlx::query_as::<_, UserRecord>(
        "SELECT id, provider, provider_id, username, display_name, real_name, avatar_url, timezone, is_bot, is_active \
         FROM users WHERE provider = ? AND provider_id = ?",
    )
    .bind(provider)
    .bind(provider_id)
    .fetch_optional(pool)
    .await
}
