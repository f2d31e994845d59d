//! # cas-ticket-redis
//!
//! Redis ticket store for the CAS client.
//!
//! This crate implements the `TicketStore` contract from `cas-ticket` on top
//! of Redis using the `fred` crate, so that every instance of a deployment
//! observes the same sessions and the same Single Logout revocations.
//!
//! ## Features
//!
//! - Connection management with automatic reconnection
//! - TLS support
//! - Key prefixing for shared Redis deployments
//! - Record and revocation keys share a hash slot, so the atomic scripts
//!   also run on Redis Cluster
//!
//! ## Example
//!
//! ```ignore
//! use cas_ticket::TicketStore;
//! use cas_ticket_redis::{RedisConfig, RedisTicketStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RedisConfig::default()
//!         .host("localhost")
//!         .port(6379);
//!
//!     let store = RedisTicketStore::connect(config).await?;
//!     store.delete(&"ST-1-abc".parse()?).await?;
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod store;

pub use config::RedisConfig;
pub use store::RedisTicketStore;
