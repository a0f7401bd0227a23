use std::time::Duration;

/// Configuration for the worker pool
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Maximum killmails processed simultaneously.
    ///
    /// Every in-flight killmail holds a database connection while it persists, keep this below
    /// the PostgreSQL pool size.
    pub max_concurrent_jobs: usize,

    /// Number of dispatcher tasks that pop from the queue.
    ///
    /// Calculated as 1 dispatcher per 40 concurrent jobs (minimum 1).
    pub dispatcher_count: usize,

    /// How long to wait between polls when the queue is empty (milliseconds).
    pub poll_interval_ms: u64,

    /// Maximum time a message can run before it is cancelled and requeued (seconds).
    pub job_timeout_seconds: u64,

    /// Maximum time to wait for a dispatcher to shutdown (seconds).
    pub shutdown_timeout_seconds: u64,

    /// Pause after each message before its slot is released (milliseconds).
    ///
    /// Caps throughput against the shared ESI limits.
    pub message_sleep_ms: u64,
}

impl WorkerPoolConfig {
    /// Create a new configuration with default timings
    ///
    /// # Arguments
    /// * `max_concurrent_jobs` - Maximum killmails processed at once
    pub fn new(max_concurrent_jobs: usize) -> Self {
        let max_concurrent_jobs = max_concurrent_jobs.max(1);
        // 1 dispatcher per 40 concurrent jobs, ceiling division
        let dispatcher_count = max_concurrent_jobs.div_ceil(40).max(1);

        Self {
            max_concurrent_jobs,
            dispatcher_count,
            poll_interval_ms: 50,
            job_timeout_seconds: 60,
            shutdown_timeout_seconds: 5,
            message_sleep_ms: 0,
        }
    }

    pub fn with_message_sleep(mut self, message_sleep_ms: u64) -> Self {
        self.message_sleep_ms = message_sleep_ms;
        self
    }

    /// Get job timeout as Duration
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_seconds)
    }

    /// Get poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }

    pub fn message_sleep(&self) -> Duration {
        Duration::from_millis(self.message_sleep_ms)
    }
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self::new(4)
    }
}
