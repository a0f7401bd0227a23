//! Durable score-ordered killmail queue.
//!
//! References are stored as JSON members of a Valkey sorted set and popped highest score
//! first. Producers pick the score: the killmail ID for live feeds so newer killmails come
//! first, `0` for historical backfills and retries so they only run once the live feed is
//! drained. All multi-step operations run as Lua scripts so they stay atomic across workers.

mod config;
mod lua;

pub use config::{KillmailQueueConfig, DEFAULT_MAX_ATTEMPTS, PROCESSING_QUEUE, RECALCULATE_QUEUE};

use chrono::Utc;
use fred::prelude::*;

use crate::{
    error::{worker::WorkerError, Error},
    model::killmail::KillmailReference,
};

use self::lua::{INVALID_SCRIPT, POP_SCRIPT, PUSH_SCRIPT, REQUEUE_SCRIPT};

/// Score used for retries and historical backfills
pub const LOW_PRIORITY_SCORE: f64 = 0.0;

/// What happened to a reference handed back after a failed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequeueOutcome {
    /// Back on the queue, `attempt` failures so far
    Requeued { attempt: u32 },
    /// Failed too often and moved to the dead-letter set
    DeadLettered,
}

#[derive(Clone)]
pub struct KillmailQueue {
    pool: Pool,
    config: KillmailQueueConfig,
}

impl KillmailQueue {
    pub fn new(pool: Pool, config: KillmailQueueConfig) -> Self {
        Self { pool, config }
    }

    pub fn config(&self) -> &KillmailQueueConfig {
        &self.config
    }

    /// Push a single reference, returns false if it was already queued
    pub async fn push(&self, reference: &KillmailReference, score: f64) -> Result<bool, Error> {
        let added = self.push_batch(&[(reference.clone(), score)]).await?;

        Ok(added == 1)
    }

    /// Push many references in one round trip, returns how many were new
    pub async fn push_batch(&self, entries: &[(KillmailReference, f64)]) -> Result<u64, Error> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut args = Vec::with_capacity(entries.len() * 2);
        for (reference, score) in entries {
            args.push(score.to_string());
            args.push(encode(reference)?);
        }

        let added: i64 = self
            .pool
            .eval(PUSH_SCRIPT, vec![self.config.queue_key()], args)
            .await?;

        Ok(added.max(0) as u64)
    }

    /// Pop up to `count` references, highest score first.
    ///
    /// Members that are not valid references are moved to the invalid set and skipped.
    pub async fn pop(&self, count: usize) -> Result<Vec<KillmailReference>, Error> {
        let members: Vec<String> = self
            .pool
            .eval(
                POP_SCRIPT,
                vec![self.config.queue_key()],
                vec![count.max(1).to_string()],
            )
            .await?;

        let mut references = Vec::with_capacity(members.len());
        for member in members {
            match serde_json::from_str::<KillmailReference>(&member) {
                Ok(reference) => references.push(reference),
                Err(e) => {
                    tracing::warn!(member, "discarding malformed queue entry: {}", e);
                    self.park_invalid(member).await?;
                }
            }
        }

        Ok(references)
    }

    pub async fn len(&self) -> Result<u64, Error> {
        Ok(self.pool.zcard::<u64, _>(self.config.queue_key()).await?)
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }

    /// Return a reference whose fetch failed, dead-lettering it after too many failures
    pub async fn requeue(&self, reference: &KillmailReference) -> Result<RequeueOutcome, Error> {
        let result: i64 = self
            .pool
            .eval(
                REQUEUE_SCRIPT,
                vec![
                    self.config.queue_key(),
                    self.config.attempts_key(),
                    self.config.dead_letter_key(),
                ],
                vec![
                    encode(reference)?,
                    self.config.max_attempts.to_string(),
                    LOW_PRIORITY_SCORE.to_string(),
                    Utc::now().timestamp().to_string(),
                ],
            )
            .await?;

        match result {
            -1 => Ok(RequeueOutcome::DeadLettered),
            attempt if attempt > 0 => Ok(RequeueOutcome::Requeued {
                attempt: attempt as u32,
            }),
            other => Err(WorkerError::Script {
                script: "requeue",
                reason: format!("unexpected attempt count {other}"),
            }
            .into()),
        }
    }

    /// Park a reference with an invalid hash, it is never retried
    pub async fn mark_invalid(&self, reference: &KillmailReference) -> Result<bool, Error> {
        self.park_invalid(encode(reference)?).await
    }

    /// Forget failed attempts of a reference that was processed
    pub async fn complete(&self, reference: &KillmailReference) -> Result<(), Error> {
        self.pool
            .hdel::<i64, _, _>(self.config.attempts_key(), encode(reference)?)
            .await?;

        Ok(())
    }

    pub async fn is_invalid(&self, reference: &KillmailReference) -> Result<bool, Error> {
        Ok(self
            .pool
            .sismember::<bool, _, _>(self.config.invalid_key(), encode(reference)?)
            .await?)
    }

    /// References in the dead-letter set, oldest first
    pub async fn dead_letters(&self) -> Result<Vec<KillmailReference>, Error> {
        let members: Vec<String> = self
            .pool
            .zrange(self.config.dead_letter_key(), 0, -1, None, false, None, false)
            .await?;

        Ok(members
            .iter()
            .filter_map(|member| serde_json::from_str(member).ok())
            .collect())
    }

    async fn park_invalid(&self, member: String) -> Result<bool, Error> {
        let added: i64 = self
            .pool
            .eval(
                INVALID_SCRIPT,
                vec![self.config.invalid_key(), self.config.attempts_key()],
                vec![member],
            )
            .await?;

        Ok(added == 1)
    }
}

fn encode(reference: &KillmailReference) -> Result<String, Error> {
    serde_json::to_string(reference)
        .map_err(|e| WorkerError::SerializationError(e.to_string()).into())
}

#[cfg(all(test, feature = "redis-test"))]
mod tests;
