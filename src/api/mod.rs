//! Vendor API clients (Slack Web API, OpenAI chat completions)

pub mod openai;
pub mod slack;
