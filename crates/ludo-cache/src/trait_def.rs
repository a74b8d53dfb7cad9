use crate::error::CacheError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Opaque key→string mapping with TTL and bounded list-push/trim operations
/// (§6 "Shared cache"). Every room-scoped key this workspace writes
/// (`room:{id}:state`, `room:{id}:moves`, `engagement:{roomId}:...`,
/// `taunt:{roomId}:state`) goes through this trait, so the backend can be
/// swapped or dropped to memory-only without touching callers. Kept
/// non-generic (plain strings) so it stays object-safe behind `Arc<dyn Cache>`;
/// [`CacheExt`] layers JSON convenience on top.
#[async_trait::async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Pushes `entry` onto the front of the list at `key`, trims it to
    /// `max_items`, and refreshes the key's TTL.
    async fn push_log(&self, key: &str, entry: String, max_items: usize, ttl: Option<Duration>) -> Result<(), CacheError>;

    async fn read_log(&self, key: &str, limit: usize) -> Result<Vec<String>, CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Cheap liveness probe backing `GET /health`'s `cacheConnected` field.
    async fn ping(&self) -> Result<(), CacheError>;
}

#[async_trait::async_trait]
pub trait CacheExt: Cache {
    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<(), CacheError> {
        self.set(key, serde_json::to_string(value)?, ttl).await
    }

    async fn push_log_json<T: Serialize + Sync>(
        &self,
        key: &str,
        entry: &T,
        max_items: usize,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        self.push_log(key, serde_json::to_string(entry)?, max_items, ttl).await
    }

    async fn read_log_json<T: DeserializeOwned>(&self, key: &str, limit: usize) -> Result<Vec<T>, CacheError> {
        let raw = self.read_log(key, limit).await?;
        raw.iter().map(|s| serde_json::from_str(s).map_err(CacheError::from)).collect()
    }
}

impl<C: Cache + ?Sized> CacheExt for C {}
