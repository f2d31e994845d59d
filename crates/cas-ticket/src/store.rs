//! Ticket store trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::record::{SessionIndex, TicketRecord};

/// Outcome of [`TicketStore::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The record is now the live record for its session index.
    Stored,
    /// The session index was revoked and the record was discarded.
    Revoked,
}

impl PutOutcome {
    /// Returns true if the record was stored.
    #[must_use]
    pub const fn is_stored(self) -> bool {
        matches!(self, Self::Stored)
    }
}

/// Repository of ticket/session records keyed by session index.
///
/// This is the single source of truth for whether a session is still valid.
/// Implementations must be internally synchronized: operations on different
/// keys must not block each other, operations on the same key are
/// linearizable.
///
/// ## Put/delete ordering
///
/// `delete` wins. Deleting a key leaves a revocation marker for a bounded
/// time, and a `put` for a revoked key returns [`PutOutcome::Revoked`]
/// without storing anything. Session indexes are never reused by the CAS
/// server, so this only rejects late writes for sessions that were already
/// logged out.
///
/// Backend errors are not retried internally; the caller owns retry policy.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Looks up the live record for a session index.
    ///
    /// Returns `None` if the record is absent, deleted or expired.
    async fn get(&self, index: &SessionIndex) -> StoreResult<Option<TicketRecord>>;

    /// Inserts or replaces the record under `record.session_index`.
    ///
    /// Last writer wins between concurrent puts on the same key.
    async fn put(&self, record: &TicketRecord) -> StoreResult<PutOutcome>;

    /// Revokes the record for a session index.
    ///
    /// Returns `Ok(())` even if the record doesn't exist. On error the
    /// record's prior state is unchanged.
    async fn delete(&self, index: &SessionIndex) -> StoreResult<()>;

    /// Removes expired records and lapsed revocation markers.
    ///
    /// Returns the number of entries removed.
    async fn remove_expired(&self) -> StoreResult<u64>;
}

#[async_trait]
impl<T: TicketStore + ?Sized> TicketStore for Arc<T> {
    async fn get(&self, index: &SessionIndex) -> StoreResult<Option<TicketRecord>> {
        (**self).get(index).await
    }

    async fn put(&self, record: &TicketRecord) -> StoreResult<PutOutcome> {
        (**self).put(record).await
    }

    async fn delete(&self, index: &SessionIndex) -> StoreResult<()> {
        (**self).delete(index).await
    }

    async fn remove_expired(&self) -> StoreResult<u64> {
        (**self).remove_expired().await
    }
}
