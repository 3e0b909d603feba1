use sqlx::sqlite::SqlitePool;

use crate::models::stats::{LeaderboardEntry, WeeklyTransaction};

/// Karma received per recipient over the trailing 7 days, ranked descending.
///
/// Recipients without a resolved display name are excluded before ranking,
/// so ranks always run 1..N without gaps. Ties are broken by display name
/// ascending.
pub async fn last_week_leaderboard(
    pool: &SqlitePool,
) -> Result<Vec<LeaderboardEntry>, sqlx::Error> {
    sqlx::query_as::<_, LeaderboardEntry>(
        "SELECT \
             u.real_name AS to_real_name, \
             SUM(t.amount) AS total_received, \
             ROW_NUMBER() OVER (ORDER BY SUM(t.amount) DESC, u.real_name ASC) AS rank \
         FROM transactions t \
         JOIN users u ON u.id = t.to_user_id \
         WHERE t.timestamp >= datetime('now', '-7 days') \
           AND u.real_name IS NOT NULL \
         GROUP BY t.to_user_id, u.real_name \
         ORDER BY rank ASC",
    )
    .fetch_all(pool)
    .await
}

/// All transactions from the trailing 7 days with resolved sender and
/// recipient names, newest first. Rows missing either name are excluded.
pub async fn last_week_transactions(
    pool: &SqlitePool,
) -> Result<Vec<WeeklyTransaction>, sqlx::Error> {
    sqlx::query_as::<_, WeeklyTransaction>(
        "SELECT \
             t.message, \
             t.amount, \
             t.timestamp, \
             t.total AS new_total, \
             u_from.real_name AS from_name, \
             u_to.real_name AS to_name \
         FROM transactions t \
         JOIN users u_from ON u_from.id = t.from_user_id \
         JOIN users u_to ON u_to.id = t.to_user_id \
         WHERE t.timestamp >= datetime('now', '-7 days') \
           AND u_from.real_name IS NOT NULL \
           AND u_to.real_name IS NOT NULL \
         ORDER BY t.timestamp DESC",
    )
    .fetch_all(pool)
    .await
}

/// Same aggregation as [`last_week_leaderboard`] windowed to
/// `date(timestamp) <= date('now')`, which makes it an all-time-to-date
/// total. The window is kept as-is for compatibility with existing
/// consumers of the `getTodayLeaderboard` tool.
pub async fn today_leaderboard(pool: &SqlitePool) -> Result<Vec<LeaderboardEntry>, sqlx::Error> {
    sqlx::query_as::<_, LeaderboardEntry>(
        "SELECT \
             u.real_name AS to_real_name, \
             SUM(t.amount) AS total_received, \
             ROW_NUMBER() OVER (ORDER BY SUM(t.amount) DESC, u.real_name ASC) AS rank \
         FROM transactions t \
         JOIN users u ON u.id = t.to_user_id \
         WHERE date(t.timestamp) <= date('now') \
           AND u.real_name IS NOT NULL \
         GROUP BY t.to_user_id, u.real_name \
         ORDER BY rank ASC",
    )
    .fetch_all(pool)
    .await
}
