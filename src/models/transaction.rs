//! Karma transaction models

use chrono::{DateTime, Utc};

/// A single karma movement parsed from one mention in a message.
///
/// `from_user` and `to_user` are full mention tokens (e.g. `<@U123ABC45>`).
/// All transactions from one message share the same `message` text and
/// `timestamp`.
#[derive(Debug, Clone, PartialEq)]
pub struct KarmaTransaction {
    pub message: String,
    pub from_user: String,
    pub to_user: String,
    pub amount: i64,
    pub timestamp: DateTime<Utc>,
}

/// A transaction annotated with resolved directory keys, ready to persist.
///
/// Either key stays `None` when the directory could not resolve that user;
/// the row is stored regardless.
#[derive(Debug, Clone)]
pub struct StorableTransaction {
    pub transaction: KarmaTransaction,
    pub from_user_id: Option<String>,
    pub to_user_id: Option<String>,
}

/// Per-recipient outcome of a persisted batch
#[derive(Debug, Clone, PartialEq)]
pub struct AffectedUser {
    pub to_user: String,
    pub old_total: i64,
    pub new_total: i64,
}
