//! # cas-ticket
//!
//! Ticket and session storage for the CAS client.
//!
//! This crate defines the [`TicketStore`] contract that every backend must
//! honour, the record types it holds, and an in-memory backend suitable for
//! single-instance deployments and tests. The Redis backend lives in
//! `cas-ticket-redis`.
//!
//! ## Guarantees
//!
//! - Reads never fail because a record is absent: a miss is `Ok(None)`.
//! - `delete` is idempotent: deleting an absent or already deleted session
//!   index succeeds.
//! - Per key, operations are linearizable: once `delete(k)` has returned, no
//!   later `get(k)` observes the record.
//! - A `put` racing a `delete` on the same key never resurrects the session:
//!   the delete leaves a revocation marker and the put is discarded with
//!   [`PutOutcome::Revoked`].
//!
//! ## Example
//!
//! ```ignore
//! use cas_ticket::{MemoryTicketStore, SessionIndex, TicketRecord, TicketStore};
//!
//! let store = MemoryTicketStore::new();
//! let index = SessionIndex::new("ST-1-abc")?;
//! store.put(&TicketRecord::new(index.clone(), "alice")).await?;
//! assert!(store.get(&index).await?.is_some());
//! store.delete(&index).await?;
//! assert!(store.get(&index).await?.is_none());
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod memory;
pub mod record;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryTicketStore;
pub use record::{Attributes, InvalidSessionIndex, SessionIndex, TicketRecord};
pub use store::{PutOutcome, TicketStore};
