//! # CAS Demo Server
//!
//! Main entry point for the CAS-protected demo server.

#![forbid(unsafe_code)]

use cas_server::{Server, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("CAS demo server starting...");

    let server = Server::new(config).await?;
    server.run().await
}
