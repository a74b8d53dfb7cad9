use crate::error::CacheError;
use crate::trait_def::Cache;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

/// Redis-backed implementation, grounded on the `redis` crate's
/// `connection-manager` feature for transparent reconnects under a shared
/// `Arc`.
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait::async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        match ttl {
            Some(ttl) => {
                let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
            }
            None => {
                let _: () = conn.set(key, value).await?;
            }
        }
        Ok(())
    }

    async fn push_log(&self, key: &str, entry: String, max_items: usize, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.lpush(key, entry).await?;
        let _: () = conn.ltrim(key, 0, max_items as isize - 1).await?;
        if let Some(ttl) = ttl {
            let _: () = conn.expire(key, ttl.as_secs() as i64).await?;
        }
        Ok(())
    }

    async fn read_log(&self, key: &str, limit: usize) -> Result<Vec<String>, CacheError> {
        let mut conn = self.conn.clone();
        Ok(conn.lrange(key, 0, limit as isize - 1).await?)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
