//! In-memory ticket store.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::StoreResult;
use crate::record::{SessionIndex, TicketRecord};
use crate::store::{PutOutcome, TicketStore};

/// How long a revocation marker blocks late writes by default.
pub const DEFAULT_REVOCATION_TTL: Duration = Duration::hours(8);

#[derive(Debug)]
enum Slot {
    Live(TicketRecord),
    Revoked { until: DateTime<Utc> },
}

impl Slot {
    fn is_lapsed_at(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Live(record) => record.is_expired_at(now),
            Self::Revoked { until } => now >= *until,
        }
    }
}

/// In-memory ticket store.
///
/// Entries are sharded so that operations on different session indexes do
/// not contend; each key is guarded by its shard lock, which makes every
/// operation on one key atomic.
///
/// This is suitable for single-instance deployments or testing.
/// For production with multiple instances, use `cas-ticket-redis`.
#[derive(Debug)]
pub struct MemoryTicketStore {
    slots: DashMap<SessionIndex, Slot>,
    revocation_ttl: Duration,
}

impl MemoryTicketStore {
    /// Creates an empty store with the default revocation TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_revocation_ttl(DEFAULT_REVOCATION_TTL)
    }

    /// Creates an empty store whose revocation markers last `ttl`.
    #[must_use]
    pub fn with_revocation_ttl(ttl: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            revocation_ttl: ttl,
        }
    }

    /// Counts live, unexpired records.
    #[must_use]
    pub fn live_count(&self) -> usize {
        let now = Utc::now();
        self.slots
            .iter()
            .filter(|slot| matches!(slot.value(), Slot::Live(record) if !record.is_expired_at(now)))
            .count()
    }

    /// Returns whether the session index carries a live revocation marker.
    #[must_use]
    pub fn is_revoked(&self, index: &SessionIndex) -> bool {
        let now = Utc::now();
        self.slots
            .get(index)
            .is_some_and(|slot| matches!(slot.value(), Slot::Revoked { until } if now < *until))
    }
}

impl Default for MemoryTicketStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn get(&self, index: &SessionIndex) -> StoreResult<Option<TicketRecord>> {
        let now = Utc::now();
        let expired = match self.slots.get(index).as_deref() {
            Some(Slot::Live(record)) if !record.is_expired_at(now) => {
                return Ok(Some(record.clone()));
            }
            Some(Slot::Live(_)) => true,
            Some(Slot::Revoked { .. }) | None => false,
        };

        // The shard guard is released above; re-check under the write lock
        // because a put may have replaced the expired record meanwhile.
        if expired {
            self.slots
                .remove_if(index, |_, slot| matches!(slot, Slot::Live(_)) && slot.is_lapsed_at(now));
            tracing::debug!(session_index = %index, "dropped expired ticket record");
        }
        Ok(None)
    }

    async fn put(&self, record: &TicketRecord) -> StoreResult<PutOutcome> {
        let now = Utc::now();
        match self.slots.entry(record.session_index.clone()) {
            Entry::Occupied(mut occupied) => {
                if let Slot::Revoked { until } = occupied.get() {
                    if now < *until {
                        tracing::debug!(
                            session_index = %record.session_index,
                            "discarding ticket record for revoked session"
                        );
                        return Ok(PutOutcome::Revoked);
                    }
                }
                occupied.insert(Slot::Live(record.clone()));
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::Live(record.clone()));
            }
        }
        Ok(PutOutcome::Stored)
    }

    async fn delete(&self, index: &SessionIndex) -> StoreResult<()> {
        let until = Utc::now() + self.revocation_ttl;
        let previous = self.slots.insert(index.clone(), Slot::Revoked { until });
        tracing::debug!(
            session_index = %index,
            had_record = matches!(previous, Some(Slot::Live(_))),
            "revoked ticket record"
        );
        Ok(())
    }

    async fn remove_expired(&self) -> StoreResult<u64> {
        let now = Utc::now();
        let mut removed = 0_u64;
        self.slots.retain(|_, slot| {
            let keep = !slot.is_lapsed_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}
