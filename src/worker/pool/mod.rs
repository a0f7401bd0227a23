//! Worker pool draining a killmail queue with bounded concurrency.
//!
//! Dispatcher tasks pop references from the [`KillmailQueue`] and spawn one task per
//! reference, a semaphore caps how many run at once. Each task hands the reference to the
//! [`MessageHandler`] under a timeout and applies the returned [`Disposition`] to the queue.
//! The configured message sleep is taken while the task still holds its permit, which caps
//! throughput regardless of how fast ESI answers.

mod config;

pub use config::WorkerPoolConfig;

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{Notify, OwnedSemaphorePermit, RwLock, Semaphore},
    task::JoinHandle,
};

use crate::{
    error::{retry::ErrorRetryStrategy, Error},
    model::killmail::KillmailReference,
    worker::{
        handler::{Disposition, MessageHandler},
        queue::{KillmailQueue, RequeueOutcome},
    },
};

/// Worker pool for processing killmail references.
///
/// Cloning is cheap, clones share dispatchers and permits.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<WorkerPoolRef>,
}

struct WorkerPoolRef {
    config: WorkerPoolConfig,
    queue: KillmailQueue,
    handler: Arc<dyn MessageHandler>,
    semaphore: Arc<Semaphore>,
    shutdown: Arc<Notify>,
    dispatcher_handles: RwLock<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Creates a stopped worker pool, call [`WorkerPool::start`] to begin processing.
    pub fn new(
        config: WorkerPoolConfig,
        queue: KillmailQueue,
        handler: Arc<dyn MessageHandler>,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let shutdown = Arc::new(Notify::new());

        Self {
            inner: Arc::new(WorkerPoolRef {
                config,
                queue,
                handler,
                semaphore,
                shutdown,
                dispatcher_handles: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Spawns the dispatcher tasks and returns immediately.
    ///
    /// Calling it on a running pool logs a warning and does nothing.
    pub async fn start(&self) -> Result<(), Error> {
        let mut handles = self.inner.dispatcher_handles.write().await;

        if !handles.is_empty() {
            tracing::warn!("Worker pool is already running");
            return Ok(());
        }

        tracing::info!(
            "Starting worker pool for {} with {} dispatcher(s) (max {} concurrent jobs)",
            self.inner.queue.config().queue_key(),
            self.inner.config.dispatcher_count,
            self.inner.config.max_concurrent_jobs
        );

        for id in 0..self.inner.config.dispatcher_count {
            handles.push(self.spawn_dispatcher(id));
        }

        Ok(())
    }

    fn spawn_dispatcher(&self, id: usize) -> JoinHandle<()> {
        let config = self.inner.config.clone();
        let queue = self.inner.queue.clone();
        let handler = Arc::clone(&self.inner.handler);
        let semaphore = Arc::clone(&self.inner.semaphore);
        let shutdown = Arc::clone(&self.inner.shutdown);

        tokio::spawn(async move {
            tracing::info!("Dispatcher {} started", id);

            loop {
                tokio::select! {
                    // Shutdown wins over popping the next reference
                    biased;

                    _ = shutdown.notified() => {
                        tracing::debug!("Dispatcher {} received shutdown signal", id);
                        break;
                    }

                    _ = Self::process_messages(id, &config, &queue, &handler, &semaphore) => {}
                }
            }

            tracing::info!("Dispatcher {} stopped", id);
        })
    }

    /// Waits for a free permit, then pops and spawns one reference.
    ///
    /// The permit is taken before popping so a reference never sits popped while the pool is
    /// at capacity.
    async fn process_messages(
        dispatcher_id: usize,
        config: &WorkerPoolConfig,
        queue: &KillmailQueue,
        handler: &Arc<dyn MessageHandler>,
        semaphore: &Arc<Semaphore>,
    ) {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                // Closed during shutdown, wait for the shutdown signal
                tokio::time::sleep(config.poll_interval()).await;
                return;
            }
        };

        match queue.pop(1).await {
            Ok(references) => match references.into_iter().next() {
                Some(reference) => {
                    let queue = queue.clone();
                    let handler = Arc::clone(handler);
                    let timeout = config.job_timeout();
                    let message_sleep = config.message_sleep();

                    tokio::spawn(async move {
                        Self::execute_message(
                            reference,
                            queue,
                            handler,
                            timeout,
                            message_sleep,
                            permit,
                        )
                        .await;
                    });
                }
                None => {
                    drop(permit);
                    tokio::time::sleep(config.poll_interval()).await;
                }
            },
            Err(e) => {
                drop(permit);
                tracing::error!("Dispatcher {} queue error: {}", dispatcher_id, e);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }

    async fn execute_message(
        reference: KillmailReference,
        queue: KillmailQueue,
        handler: Arc<dyn MessageHandler>,
        timeout: Duration,
        message_sleep: Duration,
        _permit: OwnedSemaphorePermit,
    ) {
        let disposition = match tokio::time::timeout(timeout, handler.handle(&reference)).await {
            Ok(Ok(disposition)) => disposition,
            Ok(Err(e)) => {
                match e.to_retry_strategy() {
                    ErrorRetryStrategy::Retry => {
                        tracing::warn!(killmail_id = reference.id, "Message failed: {}", e)
                    }
                    ErrorRetryStrategy::Fail => {
                        tracing::error!(killmail_id = reference.id, "Message failed: {}", e)
                    }
                }
                Disposition::Requeue {
                    reason: e.to_string(),
                }
            }
            Err(_) => {
                tracing::error!(
                    killmail_id = reference.id,
                    "Message timed out after {} seconds",
                    timeout.as_secs()
                );
                Disposition::Requeue {
                    reason: "timed out".to_string(),
                }
            }
        };

        if let Err(e) = Self::settle(&queue, &reference, disposition).await {
            tracing::error!(
                killmail_id = reference.id,
                "Failed to update queue after message: {}",
                e
            );
        }

        if !message_sleep.is_zero() {
            tokio::time::sleep(message_sleep).await;
        }
    }

    /// Applies a handler's disposition to the queue entry
    async fn settle(
        queue: &KillmailQueue,
        reference: &KillmailReference,
        disposition: Disposition,
    ) -> Result<(), Error> {
        match disposition {
            Disposition::Done => queue.complete(reference).await,
            Disposition::Invalid => {
                tracing::warn!(
                    killmail_id = reference.id,
                    "Killmail hash rejected, parked as invalid"
                );
                queue.mark_invalid(reference).await?;
                queue.complete(reference).await
            }
            Disposition::Requeue { reason } => match queue.requeue(reference).await? {
                RequeueOutcome::Requeued { attempt } => {
                    tracing::info!(
                        killmail_id = reference.id,
                        attempt,
                        "Killmail requeued: {}",
                        reason
                    );
                    Ok(())
                }
                RequeueOutcome::DeadLettered => {
                    tracing::error!(
                        killmail_id = reference.id,
                        "Killmail moved to dead letters after repeated failures: {}",
                        reason
                    );
                    Ok(())
                }
            },
        }
    }

    /// Stops the dispatchers, in-flight messages run to completion.
    pub async fn stop(&self) -> Result<(), Error> {
        if !self.is_running().await {
            tracing::debug!("Worker pool is already stopped");
            return Ok(());
        }

        tracing::info!("Shutting down worker pool...");

        self.inner.semaphore.close();
        self.inner.shutdown.notify_waiters();

        let mut handles = self.inner.dispatcher_handles.write().await;
        let dispatcher_count = handles.len();

        for (i, handle) in handles.drain(..).enumerate() {
            match tokio::time::timeout(self.inner.config.shutdown_timeout(), handle).await {
                Ok(Ok(())) => tracing::debug!("Dispatcher {} stopped cleanly", i),
                Ok(Err(e)) => tracing::error!("Dispatcher {} panicked: {:?}", i, e),
                Err(_) => tracing::warn!("Dispatcher {} did not stop within timeout", i),
            }
        }

        tracing::info!(
            "Worker pool shut down ({} dispatchers stopped, in-flight messages will complete)",
            dispatcher_count
        );

        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        !self.inner.dispatcher_handles.read().await.is_empty()
    }

    pub fn available_permits(&self) -> usize {
        self.inner.semaphore.available_permits()
    }

    /// Messages currently being processed
    pub fn active_job_count(&self) -> usize {
        self.inner.config.max_concurrent_jobs - self.inner.semaphore.available_permits()
    }
}

#[cfg(all(test, feature = "redis-test"))]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use wreckage_test_utils::prelude::*;

    use super::*;
    use crate::worker::queue::KillmailQueueConfig;

    /// Records handled references and answers with a fixed disposition
    struct RecordingHandler {
        disposition: Disposition,
        handled: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl MessageHandler for RecordingHandler {
        async fn handle(&self, reference: &KillmailReference) -> Result<Disposition, Error> {
            self.handled.lock().unwrap().push(reference.id);
            Ok(self.disposition.clone())
        }
    }

    fn setup(redis: &RedisTest, max_attempts: u32) -> KillmailQueue {
        KillmailQueue::new(
            redis.redis_pool.clone(),
            KillmailQueueConfig::processing()
                .with_namespace(redis.namespace())
                .with_max_attempts(max_attempts),
        )
    }

    fn config() -> WorkerPoolConfig {
        let mut config = WorkerPoolConfig::new(2);
        config.poll_interval_ms = 10;
        config.shutdown_timeout_seconds = 1;
        config
    }

    async fn drain(queue: &KillmailQueue) {
        for _ in 0..200 {
            if queue.is_empty().await.unwrap() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        // Let the last spawned message settle
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    #[tokio::test]
    async fn processes_every_reference() {
        let redis = RedisTest::new().await.unwrap();
        let queue = setup(&redis, 5);
        for id in 1..=3 {
            queue
                .push(&KillmailReference::new(id, format!("hash{id}")), id as f64)
                .await
                .unwrap();
        }
        let handler = Arc::new(RecordingHandler {
            disposition: Disposition::Done,
            handled: Mutex::new(Vec::new()),
        });

        let pool = WorkerPool::new(config(), queue.clone(), handler.clone());
        pool.start().await.unwrap();
        drain(&queue).await;
        pool.stop().await.unwrap();

        let mut handled = handler.handled.lock().unwrap().clone();
        handled.sort();
        assert_eq!(handled, vec![1, 2, 3]);
        assert!(!pool.is_running().await);

        redis.cleanup().await.unwrap();
    }

    /// Expect a reference that keeps failing to end up in the dead-letter set
    #[tokio::test]
    async fn failing_reference_dead_lettered() {
        let redis = RedisTest::new().await.unwrap();
        let queue = setup(&redis, 2);
        let reference = KillmailReference::new(1, "hash1");
        queue.push(&reference, 1.0).await.unwrap();
        let handler = Arc::new(RecordingHandler {
            disposition: Disposition::Requeue {
                reason: "esi unavailable".to_string(),
            },
            handled: Mutex::new(Vec::new()),
        });

        let pool = WorkerPool::new(config(), queue.clone(), handler.clone());
        pool.start().await.unwrap();
        drain(&queue).await;
        pool.stop().await.unwrap();

        assert_eq!(handler.handled.lock().unwrap().len(), 2);
        assert_eq!(queue.dead_letters().await.unwrap(), vec![reference]);

        redis.cleanup().await.unwrap();
    }

    #[tokio::test]
    async fn invalid_reference_parked() {
        let redis = RedisTest::new().await.unwrap();
        let queue = setup(&redis, 5);
        let reference = KillmailReference::new(1, "bad");
        queue.push(&reference, 1.0).await.unwrap();
        let handler = Arc::new(RecordingHandler {
            disposition: Disposition::Invalid,
            handled: Mutex::new(Vec::new()),
        });

        let pool = WorkerPool::new(config(), queue.clone(), handler);
        pool.start().await.unwrap();
        drain(&queue).await;
        pool.stop().await.unwrap();

        assert!(queue.is_invalid(&reference).await.unwrap());
        assert!(queue.is_empty().await.unwrap());

        redis.cleanup().await.unwrap();
    }

    #[tokio::test]
    async fn start_twice_keeps_dispatchers() {
        let redis = RedisTest::new().await.unwrap();
        let queue = setup(&redis, 5);
        let handler = Arc::new(RecordingHandler {
            disposition: Disposition::Done,
            handled: Mutex::new(Vec::new()),
        });

        let pool = WorkerPool::new(config(), queue, handler);
        pool.start().await.unwrap();
        pool.start().await.unwrap();

        assert!(pool.is_running().await);
        assert!(pool.active_job_count() <= 2);

        pool.stop().await.unwrap();
        assert!(!pool.is_running().await);

        redis.cleanup().await.unwrap();
    }
}
