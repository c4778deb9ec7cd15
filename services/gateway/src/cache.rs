//! Best-effort response cache. A failing cache never fails a request:
//! set/delete errors are logged and swallowed, get errors read as misses.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Vec<u8>>;
    async fn set(&self, key: &str, data: Vec<u8>, ttl: Duration);
    async fn delete(&self, key: &str);
}

pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        tracing::info!("redis connection established");
        Ok(Self { manager })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut conn = self.manager.clone();
        match conn.get::<_, Option<Vec<u8>>>(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(key, error = %e, "cache get failed");
                None
            }
        }
    }

    async fn set(&self, key: &str, data: Vec<u8>, ttl: Duration) {
        let mut conn = self.manager.clone();
        if let Err(e) = conn
            .set_ex::<_, _, ()>(key, data, ttl.as_secs().max(1))
            .await
        {
            tracing::error!(key, error = %e, "cache set failed");
        }
    }

    async fn delete(&self, key: &str) {
        let mut conn = self.manager.clone();
        if let Err(e) = conn.del::<_, ()>(key).await {
            tracing::error!(key, error = %e, "cache delete failed");
        }
    }
}
