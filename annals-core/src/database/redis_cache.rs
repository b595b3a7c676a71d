use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use tracing::{debug, info};

use crate::database::ports::QueryCache;
use crate::error::{AnnalsError, Result};

/// Redis-backed query cache. Values are JSON strings written with `SETEX`.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

impl RedisCache {
    pub async fn new(redis_url: &str) -> Result<Self> {
        info!("Connecting to Redis cache at {}", redis_url);

        let client = redis::Client::open(redis_url).map_err(|e| {
            AnnalsError::Cache(format!("Failed to create Redis client: {e}"))
        })?;

        let conn = ConnectionManager::new(client).await.map_err(|e| {
            AnnalsError::Cache(format!("Failed to connect to Redis: {e}"))
        })?;

        info!("Successfully connected to Redis cache");

        Ok(Self { conn })
    }
}

#[async_trait]
impl QueryCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        debug!("Cache GET: {}", key);

        let mut conn = self.conn.clone();
        let data: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| AnnalsError::Cache(format!("Redis GET failed: {e}")))?;

        match &data {
            Some(_) => debug!("Cache HIT: {}", key),
            None => debug!("Cache MISS: {}", key),
        }
        Ok(data)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        debug!("Cache SET: {} (TTL: {:?})", key, ttl);

        // SETEX rejects a zero expiry
        let seconds = ttl.as_secs().max(1);
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(|e| AnnalsError::Cache(format!("Redis SETEX failed: {e}")))?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        debug!("Cache DELETE: {}", key);

        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| AnnalsError::Cache(format!("Redis DEL failed: {e}")))?;

        Ok(())
    }
}
