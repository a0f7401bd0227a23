//! Valkey backed cache and publisher using a `fred` connection pool.

use std::time::Duration;

use async_trait::async_trait;
use fred::prelude::*;
use futures::future::try_join_all;

use super::{Cache, Publisher};
use crate::error::Error;

#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
}

impl RedisCache {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.pool.get::<Option<String>, _>(key).await?)
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, Error> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .pool
            .mget::<Vec<Option<String>>, _>(keys.to_vec())
            .await?)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), Error> {
        self.pool
            .set::<(), _, _>(
                key,
                value,
                Some(Expiration::EX(ttl.as_secs() as i64)),
                None,
                false,
            )
            .await?;
        Ok(())
    }

    async fn set_many(&self, entries: Vec<(String, String)>, ttl: Duration) -> Result<(), Error> {
        let seconds = ttl.as_secs() as i64;

        try_join_all(entries.into_iter().map(|(key, value)| {
            let pool = self.pool.clone();
            async move {
                pool.set::<(), _, _>(key, value, Some(Expiration::EX(seconds)), None, false)
                    .await
            }
        }))
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.pool.del::<(), _>(key).await?;
        Ok(())
    }
}

#[async_trait]
impl Publisher for RedisCache {
    async fn publish(&self, channel: &str, message: String) -> Result<(), Error> {
        self.pool
            .next()
            .publish::<(), _, _>(channel, message)
            .await?;
        Ok(())
    }
}

#[cfg(all(test, feature = "redis-test"))]
mod tests {
    use wreckage_test_utils::prelude::*;

    use super::*;

    /// Expect published messages to reach a subscriber of the channel
    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let redis = RedisTest::new().await.unwrap();
        let channel = format!("{}:notifications", redis.namespace());
        let cache = RedisCache::new(redis.redis_pool.clone());

        let subscriber = redis.redis_pool.next().clone_new();
        subscriber.init().await.unwrap();
        let mut messages = subscriber.message_rx();
        subscriber.subscribe(channel.as_str()).await.unwrap();

        cache
            .publish(&channel, r#"{"id":1,"hash":"abc"}"#.to_string())
            .await
            .unwrap();

        let message = tokio::time::timeout(Duration::from_secs(5), messages.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            message.value.as_string().as_deref(),
            Some(r#"{"id":1,"hash":"abc"}"#)
        );

        subscriber.quit().await.unwrap();
        redis.cleanup().await.unwrap();
    }
}
