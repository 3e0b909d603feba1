//! Data models for the karma and prompting pipelines
//!
//! Ephemeral pipeline values, persisted rows, and the wire shapes shared
//! between the store, the services, and the HTTP boundary.

pub mod event;
pub mod notification;
pub mod stats;
pub mod transaction;
pub mod user;

// Re-export commonly used types for convenience
pub use event::MessageEvent;
pub use notification::KarmaNotification;
pub use stats::{LeaderboardEntry, ToolResults, WeeklyTransaction};
pub use transaction::{AffectedUser, KarmaTransaction, StorableTransaction};
pub use user::{UserProfile, UserRecord};
