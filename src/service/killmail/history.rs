//! Historical backfill from the killboard's daily history index.
//!
//! Each day is published as `{history_url}/{YYYYMMDD}.json`, a JSON object mapping killmail IDs
//! to hashes. Days are exported newest first and pushed with the low priority score so live
//! killmails keep precedence. When a hold threshold is set the exporter waits for the queue
//! to drain below it before moving to the next day.

use std::{collections::HashMap, time::Duration};

use chrono::NaiveDate;
use reqwest::header::{HeaderMap, USER_AGENT};

use crate::{
    error::Error,
    model::killmail::KillmailReference,
    service::retry::RetryContext,
    worker::queue::{KillmailQueue, LOW_PRIORITY_SCORE},
};

/// References pushed per queue round trip
const PUSH_BATCH_SIZE: usize = 250;

#[derive(Debug, Clone)]
pub struct HistoryConfig {
    pub history_url: String,
    pub user_agent: String,
    /// Queue length at which the exporter waits before the next day
    pub hold_threshold: Option<u64>,
    pub hold_interval: Duration,
}

impl HistoryConfig {
    pub fn new(history_url: &str, user_agent: &str) -> Self {
        Self {
            history_url: history_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
            hold_threshold: None,
            hold_interval: Duration::from_secs(10),
        }
    }

    pub fn with_hold_threshold(mut self, threshold: u64) -> Self {
        self.hold_threshold = Some(threshold);
        self
    }
}

pub struct HistoryExporter<'a> {
    http: reqwest::Client,
    queue: &'a KillmailQueue,
    config: HistoryConfig,
    retry: RetryContext,
}

impl<'a> HistoryExporter<'a> {
    pub fn new(queue: &'a KillmailQueue, config: HistoryConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            config.user_agent.parse().map_err(|_| {
                Error::InternalError(format!("invalid user agent: {}", config.user_agent))
            })?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            queue,
            config,
            retry: RetryContext::new(),
        })
    }

    pub fn with_retry(mut self, retry: RetryContext) -> Self {
        self.retry = retry;
        self
    }

    /// Export every day from `newest` back to `oldest` inclusive, returns references queued
    pub async fn export(&self, oldest: NaiveDate, newest: NaiveDate) -> Result<u64, Error> {
        let mut date = newest;
        let mut queued = 0;

        while date >= oldest {
            queued += self.export_day(date).await?;

            let Some(previous) = date.pred_opt() else {
                break;
            };
            date = previous;

            if date >= oldest {
                self.hold().await?;
            }
        }

        Ok(queued)
    }

    /// Queue every reference of a single day
    pub async fn export_day(&self, date: NaiveDate) -> Result<u64, Error> {
        let day = date.format("%Y%m%d").to_string();
        let url = format!("{}/{}.json", self.config.history_url, day);

        let hashes = self
            .retry
            .execute_with_retry(&format!("killboard history for {day}"), || async {
                let response = self.http.get(&url).send().await?.error_for_status()?;
                Ok(response.json::<HashMap<String, String>>().await?)
            })
            .await?;

        let mut references: Vec<(KillmailReference, f64)> = hashes
            .into_iter()
            .filter_map(|(id, hash)| match id.parse::<i64>() {
                Ok(id) => Some((KillmailReference::new(id, hash), LOW_PRIORITY_SCORE)),
                Err(_) => {
                    tracing::warn!(date = %day, id = %id, "skipping history entry with invalid id");
                    None
                }
            })
            .collect();
        references.sort_by_key(|(reference, _)| reference.id);

        let mut queued = 0;
        for batch in references.chunks(PUSH_BATCH_SIZE) {
            queued += self.queue.push_batch(batch).await?;
        }

        tracing::info!(date = %day, found = references.len(), queued, "exported killmail history");

        Ok(queued)
    }

    async fn hold(&self) -> Result<(), Error> {
        let Some(threshold) = self.config.hold_threshold else {
            return Ok(());
        };

        loop {
            let len = self.queue.len().await?;
            if len < threshold {
                return Ok(());
            }

            tracing::info!(len, threshold, "queue above hold threshold, waiting");
            tokio::time::sleep(self.config.hold_interval).await;
        }
    }
}

#[cfg(all(test, feature = "redis-test"))]
mod tests {
    use wreckage_test_utils::prelude::*;

    use super::*;
    use crate::worker::queue::KillmailQueueConfig;

    fn setup_queue(redis: &RedisTest) -> KillmailQueue {
        KillmailQueue::new(
            redis.redis_pool.clone(),
            KillmailQueueConfig::processing().with_namespace(redis.namespace()),
        )
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    /// Expect every day in the range to be queued at low priority
    #[tokio::test]
    async fn exports_each_day_in_range() {
        let test = TestBuilder::new()
            .with_json_endpoint(
                "/20240615.json",
                serde_json::json!({ "101": "aaa", "102": "bbb" }),
                1,
            )
            .with_json_endpoint("/20240614.json", serde_json::json!({ "99": "ccc" }), 1)
            .build()
            .await
            .unwrap();
        let redis = RedisTest::new().await.unwrap();
        let queue = setup_queue(&redis);
        let exporter =
            HistoryExporter::new(&queue, HistoryConfig::new(&test.server_url(), TEST_USER_AGENT))
                .unwrap();

        let queued = exporter.export(date(14), date(15)).await.unwrap();

        assert_eq!(queued, 3);
        assert_eq!(queue.len().await.unwrap(), 3);
        test.assert_mocks();

        redis.cleanup().await.unwrap();
    }

    /// Expect a day that keeps failing to abort the export after three attempts
    #[tokio::test]
    async fn failing_day_retried_then_reported() {
        let test = TestBuilder::new()
            .with_status_endpoint("/20240615.json", 503, 3)
            .build()
            .await
            .unwrap();
        let redis = RedisTest::new().await.unwrap();
        let queue = setup_queue(&redis);
        let exporter =
            HistoryExporter::new(&queue, HistoryConfig::new(&test.server_url(), TEST_USER_AGENT))
                .unwrap()
                .with_retry(RetryContext::new().with_initial_backoff(Duration::from_millis(1)));

        let result = exporter.export_day(date(15)).await;

        assert!(result.is_err());
        test.assert_mocks();

        redis.cleanup().await.unwrap();
    }
}
