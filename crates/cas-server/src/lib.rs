//! # cas-server
//!
//! Demo Axum server whose routes are protected by the CAS client.
//!
//! ## Architecture
//!
//! The ticket store is chosen at startup: Redis when `REDIS_URL` is set,
//! otherwise the in-memory store. A background task sweeps expired
//! sessions from stores that do not expire them on their own.
//!
//! ## Usage
//!
//! ```ignore
//! use cas_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::from_env()?;
//! let server = Server::new(config).await?;
//! server.run().await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod router;
pub mod state;

pub use config::ServerConfig;
pub use router::create_router;
pub use state::AppState;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use cas_client::CasClient;
use cas_ticket::{MemoryTicketStore, TicketStore};
use cas_ticket_redis::{RedisConfig, RedisTicketStore};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// The CAS-protected demo server.
pub struct Server {
    config: ServerConfig,
    store: Arc<dyn TicketStore>,
}

impl Server {
    /// Creates a new server instance.
    ///
    /// Connects to Redis when a Redis URL is configured.
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn TicketStore> = match &config.redis_url {
            Some(url) => {
                let redis = RedisConfig::new()
                    .url(url.clone())
                    .key_prefix(config.redis_key_prefix.clone())
                    .revocation_ttl_secs(config.revocation_ttl_secs);
                Arc::new(RedisTicketStore::connect(redis).await?)
            }
            None => {
                tracing::info!("using in-memory ticket store");
                Arc::new(MemoryTicketStore::with_revocation_ttl(config.revocation_ttl()))
            }
        };

        Ok(Self::with_store(config, store))
    }

    /// Creates a server over an existing ticket store.
    #[must_use]
    pub fn with_store(config: ServerConfig, store: Arc<dyn TicketStore>) -> Self {
        Self { config, store }
    }

    /// Runs the server.
    ///
    /// This starts the HTTP server and blocks until it receives a shutdown signal.
    pub async fn run(self) -> anyhow::Result<()> {
        let state = self.state()?;
        let app = create_router(state);

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(cas_url = %self.config.client.cas_url, "Server listening on http://{}", addr);

        let sweeper = self
            .config
            .sweep_interval()
            .map(|every| spawn_sweeper(self.store.clone(), every));

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }
        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Returns the ticket store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn TicketStore> {
        &self.store
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Creates a test router without starting the server.
    ///
    /// This is useful for integration testing.
    pub fn test_router(&self) -> anyhow::Result<Router> {
        Ok(create_router(self.state()?))
    }

    fn state(&self) -> anyhow::Result<AppState> {
        let client = CasClient::builder(self.config.client.clone(), self.store.clone())
            .http_validator()?
            .build()?;
        Ok(AppState::new(self.config.clone(), client))
    }
}

/// Periodically removes expired sessions from `store`.
pub fn spawn_sweeper(store: Arc<dyn TicketStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match store.remove_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "swept expired sessions"),
                Err(e) => tracing::warn!(error = %e, "expired session sweep failed"),
            }
        }
    })
}

/// Waits for a shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
