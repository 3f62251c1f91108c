use anyhow::Result;
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod forms;
pub mod interface;
pub mod knowledge;
pub mod logger;
pub mod models;
pub mod preview;
pub mod settings;
pub mod store;
pub mod utils;

/// Run the application: load `.env`, set up logging, load config, and serve
/// the console.
pub async fn run() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bot_console=info,tower_http=info")),
        )
        .init();

    let config = config::AppConfig::load();
    interface::serve(config).await
}

// Re-exports for library consumers
pub use api::ConsoleClient;
pub use config::AppConfig;
pub use dashboard::{build_router, DashboardState};
pub use error::{ConsoleError, ConsoleResult};
pub use store::ConsoleStore;
