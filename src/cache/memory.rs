//! In-process cache and publisher.
//!
//! Backed by a `RwLock<HashMap>` with per-key expiry. Used by tests and for running the
//! pipeline without Valkey. Published messages are retained for inspection.

use std::{
    collections::HashMap,
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use tokio::{sync::RwLock, time::Instant};

use super::{Cache, Publisher};
use crate::error::Error;

#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, (String, Instant)>>>,
    published: Arc<RwLock<Vec<(String, String)>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages published so far as `(channel, message)`
    pub async fn published(&self) -> Vec<(String, String)> {
        self.published.read().await.clone()
    }

    /// Number of live keys
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let entries = self.entries.read().await;

        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(value, _)| value.clone()))
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, Error> {
        let entries = self.entries.read().await;
        let now = Instant::now();

        Ok(keys
            .iter()
            .map(|key| {
                entries
                    .get(key)
                    .filter(|(_, expires_at)| *expires_at > now)
                    .map(|(value, _)| value.clone())
            })
            .collect())
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), Error> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }

    async fn set_many(&self, entries: Vec<(String, String)>, ttl: Duration) -> Result<(), Error> {
        let expires_at = Instant::now() + ttl;
        let mut map = self.entries.write().await;

        for (key, value) in entries {
            map.insert(key, (value, expires_at));
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[async_trait]
impl Publisher for MemoryCache {
    async fn publish(&self, channel: &str, message: String) -> Result<(), Error> {
        self.published
            .write()
            .await
            .push((channel.to_string(), message));
        Ok(())
    }
}
