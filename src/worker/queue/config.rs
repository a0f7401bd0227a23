//! Killmail queue key layout and retry settings.
//!
//! Every queue lives under a namespace shared with its invalid set, dead-letter set and
//! attempt counters, e.g. `killmail:queue:processing` and `killmail:queue:dead`. Tests use a
//! unique namespace per test for isolation.

const DEFAULT_NAMESPACE: &str = "killmail:queue";

pub const PROCESSING_QUEUE: &str = "processing";
pub const RECALCULATE_QUEUE: &str = "recalculate";

/// Failed fetches before a reference is dead-lettered
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
pub struct KillmailQueueConfig {
    /// Prefix shared by all keys of the queue
    pub namespace: String,
    /// Name of the sorted set within the namespace
    pub queue: String,
    /// Failed attempts before a reference is moved to the dead-letter set
    pub max_attempts: u32,
}

impl KillmailQueueConfig {
    pub fn new(queue: &str) -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            queue: queue.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Main import queue
    pub fn processing() -> Self {
        Self::new(PROCESSING_QUEUE)
    }

    pub fn recalculate() -> Self {
        Self::new(RECALCULATE_QUEUE)
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn queue_key(&self) -> String {
        format!("{}:{}", self.namespace, self.queue)
    }

    pub fn invalid_key(&self) -> String {
        format!("{}:invalid", self.namespace)
    }

    pub fn dead_letter_key(&self) -> String {
        format!("{}:dead", self.namespace)
    }

    pub fn attempts_key(&self) -> String {
        format!("{}:attempts", self.namespace)
    }
}

impl Default for KillmailQueueConfig {
    fn default() -> Self {
        Self::processing()
    }
}
