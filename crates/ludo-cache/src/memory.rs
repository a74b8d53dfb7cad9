use crate::error::CacheError;
use crate::trait_def::Cache;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

/// In-memory fallback used when `REDIS_URL` is unset, per §6 "If
/// unavailable, the system degrades to memory-only for runtime state."
#[derive(Default)]
pub struct MemoryCache {
    values: Mutex<HashMap<String, Entry>>,
    lists: Mutex<HashMap<String, (VecDeque<String>, Option<Instant>)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut values = self.values.lock().unwrap();
        if let Some(entry) = values.get(key) {
            if entry.expires_at.is_some_and(|t| Instant::now() > t) {
                values.remove(key);
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        let expires_at = ttl.map(|d| Instant::now() + d);
        self.values.lock().unwrap().insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn push_log(&self, key: &str, entry: String, max_items: usize, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut lists = self.lists.lock().unwrap();
        let expires_at = ttl.map(|d| Instant::now() + d);
        let slot = lists.entry(key.to_string()).or_insert_with(|| (VecDeque::new(), None));
        slot.0.push_front(entry);
        while slot.0.len() > max_items {
            slot.0.pop_back();
        }
        slot.1 = expires_at;
        Ok(())
    }

    async fn read_log(&self, key: &str, limit: usize) -> Result<Vec<String>, CacheError> {
        let mut lists = self.lists.lock().unwrap();
        if let Some((items, expires_at)) = lists.get(key) {
            if expires_at.is_some_and(|t| Instant::now() > t) {
                lists.remove(key);
                return Ok(Vec::new());
            }
            return Ok(items.iter().take(limit).cloned().collect());
        }
        Ok(Vec::new())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.values.lock().unwrap().remove(key);
        self.lists.lock().unwrap().remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trait_def::CacheExt;

    #[tokio::test]
    async fn set_then_get_json_round_trips() {
        let cache = MemoryCache::new();
        cache.set_json("room:1:state", &42u32, None).await.unwrap();
        let value: Option<u32> = cache.get_json("room:1:state").await.unwrap();
        assert_eq!(value, Some(42));
    }

    #[tokio::test]
    async fn push_log_trims_to_max_items() {
        let cache = MemoryCache::new();
        for i in 0..5 {
            cache.push_log("room:1:moves", i.to_string(), 3, None).await.unwrap();
        }
        let items = cache.read_log("room:1:moves", 10).await.unwrap();
        assert_eq!(items, vec!["4", "3", "2"]);
    }
}
