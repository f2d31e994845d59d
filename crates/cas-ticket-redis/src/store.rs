//! Redis ticket store implementation.

use async_trait::async_trait;
use cas_ticket::{PutOutcome, SessionIndex, StoreError, StoreResult, TicketRecord, TicketStore};
use chrono::Utc;
use fred::prelude::*;

use crate::config::RedisConfig;
use crate::error::{from_redis_error, from_serde_error};

/// Stores the record unless a revocation marker exists.
///
/// KEYS: ticket key, revoked key. ARGV: JSON record, TTL seconds (0 = none).
const PUT_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[2]) == 1 then
  return 0
end
if ARGV[2] == '0' then
  redis.call('SET', KEYS[1], ARGV[1])
else
  redis.call('SET', KEYS[1], ARGV[1], 'EX', ARGV[2])
end
return 1
";

/// Drops the record and leaves a revocation marker, atomically.
///
/// KEYS: ticket key, revoked key. ARGV: marker TTL seconds.
const DELETE_SCRIPT: &str = r"
redis.call('DEL', KEYS[1])
redis.call('SET', KEYS[2], '1', 'EX', ARGV[1])
return 1
";

/// Redis-based ticket store.
///
/// Every per-key operation is a single Redis command or script, which Redis
/// executes atomically, so the store is linearizable per session index.
pub struct RedisTicketStore {
    client: Client,
    config: RedisConfig,
}

impl RedisTicketStore {
    /// Connects to Redis and creates the store.
    ///
    /// ## Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn connect(config: RedisConfig) -> StoreResult<Self> {
        let redis_config = Config::from_url(&config.connection_url())
            .map_err(|e| StoreError::Configuration(e.to_string()))?;

        let client = Client::new(
            redis_config,
            None,
            None,
            Some(ReconnectPolicy::new_exponential(0, 1000, 30_000, 2)),
        );

        client.init().await.map_err(from_redis_error)?;
        tracing::info!(prefix = %config.key_prefix, "connected ticket store to Redis");

        Ok(Self::new(client, config))
    }

    /// Creates a store over an already initialised client.
    #[must_use]
    pub const fn new(client: Client, config: RedisConfig) -> Self {
        Self { client, config }
    }

    /// Returns the underlying Redis client.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    fn keys(&self, index: &SessionIndex) -> Vec<String> {
        vec![
            self.config.ticket_key(index.as_str()),
            self.config.revoked_key(index.as_str()),
        ]
    }
}

/// Seconds until a record expires, or `0` if it has no expiry.
///
/// An already expired record still gets one second so that Redis removes it.
fn record_ttl_secs(record: &TicketRecord) -> i64 {
    record
        .expires_at
        .map_or(0, |expires_at| (expires_at - Utc::now()).num_seconds().max(1))
}

#[async_trait]
impl TicketStore for RedisTicketStore {
    async fn get(&self, index: &SessionIndex) -> StoreResult<Option<TicketRecord>> {
        let key = self.config.ticket_key(index.as_str());
        let value: Option<String> = self.client.get(&key).await.map_err(from_redis_error)?;

        match value {
            Some(v) => {
                let record: TicketRecord = serde_json::from_str(&v).map_err(from_serde_error)?;
                // Redis expiry has one second granularity.
                if record.is_expired() {
                    return Ok(None);
                }
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, record: &TicketRecord) -> StoreResult<PutOutcome> {
        let serialized = serde_json::to_string(record).map_err(from_serde_error)?;
        let args = vec![serialized, record_ttl_secs(record).to_string()];

        let stored: i64 = self
            .client
            .eval(PUT_SCRIPT, self.keys(&record.session_index), args)
            .await
            .map_err(from_redis_error)?;

        if stored == 1 {
            Ok(PutOutcome::Stored)
        } else {
            tracing::debug!(
                session_index = %record.session_index,
                "discarding ticket record for revoked session"
            );
            Ok(PutOutcome::Revoked)
        }
    }

    async fn delete(&self, index: &SessionIndex) -> StoreResult<()> {
        let args = vec![self.config.revocation_ttl_secs.max(1).to_string()];

        let _: i64 = self
            .client
            .eval(DELETE_SCRIPT, self.keys(index), args)
            .await
            .map_err(from_redis_error)?;

        tracing::debug!(session_index = %index, "revoked ticket record");
        Ok(())
    }

    async fn remove_expired(&self) -> StoreResult<u64> {
        // Records and revocation markers carry Redis TTLs.
        Ok(0)
    }
}
