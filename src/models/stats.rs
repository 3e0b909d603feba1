//! Reporting models shared by the stats queries and the prompting pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One ranked leaderboard row (karma received per recipient)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub to_real_name: String,
    pub total_received: i64,
    pub rank: i64,
}

/// One last-week transaction enriched with resolved display names
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTransaction {
    pub message: String,
    pub amount: i64,
    pub timestamp: DateTime<Utc>,
    pub new_total: i64,
    pub from_name: String,
    pub to_name: String,
}

/// Results of the three reporting functions, serialized for the composition
/// call under the exact tool names the model selects from.
///
/// Every function always has a slot; one that never ran (or returned no
/// rows) serializes as an empty list, never as an absent key.
#[derive(Debug, Default, Serialize)]
pub struct ToolResults {
    #[serde(rename = "getLastWeekLeaderboard")]
    pub last_week_leaderboard: Vec<LeaderboardEntry>,
    #[serde(rename = "getLastWeekTransactions")]
    pub last_week_transactions: Vec<WeeklyTransaction>,
    #[serde(rename = "getTodayLeaderboard")]
    pub today_leaderboard: Vec<LeaderboardEntry>,
}
