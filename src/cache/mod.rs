//! Fast cache used by the cache-aside services.
//!
//! [`Cache`] abstracts the few key/value operations the services need so they can run against
//! Valkey in production ([`RedisCache`]) and an in-process map in tests ([`MemoryCache`]).
//! Values are JSON strings; decode failures are reported as [`Error::CacheCorrupted`] because
//! the cache only ever holds data this crate wrote.

pub mod key;
pub mod memory;
pub mod redis;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Error;

pub use memory::MemoryCache;
pub use redis::RedisCache;

/// Cache shared between services and workers
pub type SharedCache = Arc<dyn Cache>;

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Batched lookup, result has one slot per key in input order
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, Error>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), Error>;

    /// Batched write applying `ttl` to every key
    async fn set_many(&self, entries: Vec<(String, String)>, ttl: Duration) -> Result<(), Error>;

    async fn delete(&self, key: &str) -> Result<(), Error>;
}

/// Publishes messages onto a pub/sub channel
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, channel: &str, message: String) -> Result<(), Error>;
}

/// Reads and decodes a JSON value
pub async fn get_json<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> Result<Option<T>, Error> {
    match cache.get(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| Error::CacheCorrupted {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Reads and decodes many JSON values, keeping input order
pub async fn get_many_json<T: DeserializeOwned>(
    cache: &dyn Cache,
    keys: &[String],
) -> Result<Vec<Option<T>>, Error> {
    let raw = cache.get_many(keys).await?;

    raw.into_iter()
        .zip(keys)
        .map(|(value, key)| match value {
            Some(value) => serde_json::from_str(&value)
                .map(Some)
                .map_err(|source| Error::CacheCorrupted {
                    key: key.clone(),
                    source,
                }),
            None => Ok(None),
        })
        .collect()
}

pub async fn set_json<T: Serialize + ?Sized>(
    cache: &dyn Cache,
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<(), Error> {
    let raw = serde_json::to_string(value)?;
    cache.set(key, raw, ttl).await
}

pub async fn set_many_json<T: Serialize>(
    cache: &dyn Cache,
    entries: Vec<(String, &T)>,
    ttl: Duration,
) -> Result<(), Error> {
    if entries.is_empty() {
        return Ok(());
    }

    let encoded = entries
        .into_iter()
        .map(|(key, value)| serde_json::to_string(value).map(|raw| (key, raw)))
        .collect::<Result<Vec<_>, _>>()?;

    cache.set_many(encoded, ttl).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn corrupt_value_is_fatal() {
        let cache = MemoryCache::new();
        cache
            .set("alliance:1", "{not json".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        let result = get_json::<entity::eve_alliance::Model>(&cache, "alliance:1").await;

        assert!(matches!(result, Err(Error::CacheCorrupted { ref key, .. }) if key == "alliance:1"));
    }

    #[tokio::test]
    async fn get_many_keeps_input_order() {
        let cache = MemoryCache::new();
        set_json(&cache, "type:2", &2_i64, Duration::from_secs(60))
            .await
            .unwrap();

        let keys = vec!["type:1".to_string(), "type:2".to_string()];
        let values: Vec<Option<i64>> = get_many_json(&cache, &keys).await.unwrap();

        assert_eq!(values, vec![None, Some(2)]);
    }
}
