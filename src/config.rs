use thiserror::Error;

/// Runtime configuration, collected once at startup from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// Listen address, defaults to 0.0.0.0:3000
    pub bind_addr: String,
    pub slack_bot_token: String,
    pub slack_signing_secret: String,
    /// The only channel whose message events feed the karma pipeline
    pub channel_id: String,
    pub openai_api_key: String,
    /// Shared secret required by the weekly-summary endpoint
    pub api_key: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    MissingVar(&'static str),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: require("DATABASE_URL")?,
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            slack_bot_token: require("SLACK_BOT_TOKEN")?,
            slack_signing_secret: require("SLACK_SIGNING_SECRET")?,
            channel_id: require("CHANNEL_ID")?,
            openai_api_key: require("OPENAI_API_KEY")?,
            api_key: require("API_KEY")?,
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}
