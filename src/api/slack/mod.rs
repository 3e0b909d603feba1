pub mod client;
pub mod models;

pub use client::SlackClient;
pub use models::{SlackError, SlackProfile, SlackUser};
