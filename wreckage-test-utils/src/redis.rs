//! Valkey test setup for tests behind the `redis-test` feature.

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::{SystemTime, UNIX_EPOCH},
};

use fred::prelude::*;

use crate::TestError;

/// Key suffixes a killmail queue namespace may hold
const NAMESPACE_SUFFIXES: [&str; 5] = ["processing", "recalculate", "invalid", "dead", "attempts"];

/// Connection pool plus a namespace unique to one test
pub struct RedisTest {
    pub redis_pool: Pool,
    namespace: String,
}

impl RedisTest {
    /// Connects to the local Valkey instance at `REDIS_TEST_URL` or `redis://127.0.0.1:6379`
    pub async fn new() -> Result<Self, TestError> {
        let url = std::env::var("REDIS_TEST_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let redis_config = Config::from_url(&url)?;
        let redis_pool = Pool::new(redis_config, None, None, None, 5)?;
        redis_pool.init().await?;

        Ok(RedisTest {
            redis_pool,
            namespace: Self::generate_unique_namespace(),
        })
    }

    /// Key prefix that no other test uses
    pub fn namespace(&self) -> String {
        self.namespace.clone()
    }

    fn generate_unique_namespace() -> String {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or_default();

        let mut hasher = DefaultHasher::new();
        timestamp.hash(&mut hasher);
        std::thread::current().id().hash(&mut hasher);

        format!("test:{}:{:x}:killmail", timestamp, hasher.finish())
    }

    /// Remove every key of the namespace
    pub async fn cleanup(self) -> Result<(), TestError> {
        let keys: Vec<String> = NAMESPACE_SUFFIXES
            .iter()
            .map(|suffix| format!("{}:{}", self.namespace, suffix))
            .collect();

        self.redis_pool.del::<(), _>(keys).await?;
        Ok(())
    }
}
