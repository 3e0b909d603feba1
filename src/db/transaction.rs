use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::models::transaction::{AffectedUser, StorableTransaction};

/// Persist a batch of karma transactions sequentially, in batch order.
///
/// Each insert computes the recipient's new running total inside the
/// statement itself (last row wins, ties broken by insertion id), so two
/// concurrent batches for the same recipient cannot both read a stale
/// total. Returns one record per stored transaction.
pub async fn store_karma(
    pool: &SqlitePool,
    transactions: &[StorableTransaction],
) -> Result<Vec<AffectedUser>, sqlx::Error> {
    let mut affected_users = Vec::with_capacity(transactions.len());

    for storable in transactions {
        let transaction = &storable.transaction;
        let uuid = Uuid::new_v4().to_string();

        let new_total: i64 = sqlx::query_scalar(
            "INSERT INTO transactions \
             (uuid, message, from_user, to_user, amount, timestamp, total, from_user_id, to_user_id) \
             VALUES (?, ?, ?, ?, ?, ?, \
                 COALESCE((SELECT total FROM transactions WHERE to_user = ? \
                           ORDER BY timestamp DESC, id DESC LIMIT 1), 0) + ?, \
                 ?, ?) \
             RETURNING total",
        )
        .bind(&uuid)
        .bind(&transaction.message)
        .bind(&transaction.from_user)
        .bind(&transaction.to_user)
        .bind(transaction.amount)
        .bind(transaction.timestamp)
        .bind(&transaction.to_user)
        .bind(transaction.amount)
        .bind(&storable.from_user_id)
        .bind(&storable.to_user_id)
        .fetch_one(pool)
        .await?;

        affected_users.push(AffectedUser {
            to_user: transaction.to_user.clone(),
            old_total: new_total - transaction.amount,
            new_total,
        });
    }

    Ok(affected_users)
}

/// Sum of karma given (positive amounts) by a sender since the cutoff
pub async fn get_given_karma_since(
    pool: &SqlitePool,
    from_user: &str,
    since: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let row: (Option<i64>,) = sqlx::query_as(
        "SELECT SUM(amount) FROM transactions \
         WHERE from_user = ? AND amount > 0 AND timestamp >= ?",
    )
    .bind(from_user)
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok(row.0.unwrap_or(0))
}

/// Sum of karma taken (negative amounts) by a sender since the cutoff.
/// The result is negative or zero.
pub async fn get_taken_karma_since(
    pool: &SqlitePool,
    from_user: &str,
    since: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let row: (Option<i64>,) = sqlx::query_as(
        "SELECT SUM(amount) FROM transactions \
         WHERE from_user = ? AND amount < 0 AND timestamp >= ?",
    )
    .bind(from_user)
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok(row.0.unwrap_or(0))
}
