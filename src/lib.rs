//! Apogee, a Slack karma bot.
//!
//! Listens for `<@user> ++` / `<@user> --` messages on a configured channel,
//! records the resulting karma transactions in SQLite, and answers natural
//! language reporting prompts through OpenAI tool selection.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
