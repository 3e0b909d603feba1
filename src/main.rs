use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use apogee::api::openai::OpenAiClient;
use apogee::api::slack::SlackClient;
use apogee::config::AppConfig;
use apogee::db;
use apogee::routes::{self, AppState};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("apogee=debug".parse().unwrap()),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("🚀 Starting Apogee karma bot...");

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return;
        }
    };

    // Initialize database
    info!("Initializing database...");
    let pool = match db::init_db(&config.database_url).await {
        Ok(p) => {
            info!("Database initialized successfully");
            p
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return;
        }
    };

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        pool,
        slack: Arc::new(SlackClient::new(config.slack_bot_token.clone())),
        openai: Arc::new(OpenAiClient::new(config.openai_api_key.clone())),
        config: Arc::new(config),
    };

    let app = routes::router(state);

    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(l) => {
            info!("Listening on {}", bind_addr);
            l
        }
        Err(e) => {
            error!("Failed to bind {}: {}", bind_addr, e);
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}
