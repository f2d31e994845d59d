//! Server configuration.
//!
//! Configuration is loaded from environment variables with sensible defaults.
//! The CAS client settings are read by [`ClientConfig::from_env`].

use std::time::Duration;

use cas_client::ClientConfig;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host to bind to.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// CAS client configuration.
    pub client: ClientConfig,

    /// Redis URL; the in-memory ticket store is used when unset.
    pub redis_url: Option<String>,

    /// Key prefix for the Redis ticket store.
    pub redis_key_prefix: String,

    /// Seconds a logged-out session stays blocked against late writes.
    pub revocation_ttl_secs: u64,

    /// Seconds between expired session sweeps; `0` disables the sweeper.
    pub sweep_interval_secs: u64,

    /// Log level.
    pub log_level: String,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let host = std::env::var("CAS_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("CAS_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let client = ClientConfig::from_env()?;

        let redis_url = std::env::var("REDIS_URL").ok();
        let redis_key_prefix =
            std::env::var("CAS_REDIS_PREFIX").unwrap_or_else(|_| "cas".to_string());

        let revocation_ttl_secs = std::env::var("CAS_REVOCATION_TTL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(28_800); // 8 hours

        let sweep_interval_secs = std::env::var("CAS_SWEEP_INTERVAL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300); // 5 minutes

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            host,
            port,
            client,
            redis_url,
            redis_key_prefix,
            revocation_ttl_secs,
            sweep_interval_secs,
            log_level,
        })
    }

    /// Creates a configuration for testing.
    #[must_use]
    pub fn for_testing(client: ClientConfig) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port
            client,
            redis_url: None,
            redis_key_prefix: "cas-test".to_string(),
            revocation_ttl_secs: 28_800,
            sweep_interval_secs: 0,
            log_level: "debug".to_string(),
        }
    }

    /// Returns the revocation marker lifetime, between one second and ten years.
    #[must_use]
    pub fn revocation_ttl(&self) -> chrono::Duration {
        const MAX_SECS: u64 = 10 * 365 * 24 * 60 * 60;
        chrono::Duration::seconds(self.revocation_ttl_secs.clamp(1, MAX_SECS) as i64)
    }

    /// Returns the sweep interval, or `None` when sweeping is disabled.
    #[must_use]
    pub const fn sweep_interval(&self) -> Option<Duration> {
        if self.sweep_interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.sweep_interval_secs))
        }
    }
}
