//! Application state management.
//!
//! This module defines the shared state that is passed to all request handlers.

use cas_client::CasClient;

use crate::config::ServerConfig;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: ServerConfig,

    /// The CAS client guarding the application routes.
    pub client: CasClient,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: ServerConfig, client: CasClient) -> Self {
        Self { config, client }
    }

    /// Returns the CAS client.
    pub const fn client(&self) -> &CasClient {
        &self.client
    }

    /// Returns the server configuration.
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }
}
