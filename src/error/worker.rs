//! Worker queue error types.
//!
//! Worker errors indicate malformed queue entries or Valkey script failures that prevent
//! killmail references from being enqueued or popped.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    /// Queue entry could not be converted to or from JSON.
    ///
    /// Indicates a producer writing entries in an unexpected shape.
    #[error("Failed to serialize/deserialize queue message: {0}")]
    SerializationError(String),

    /// Queue script returned an unexpected value.
    #[error("Queue script {script} returned unexpected result: {reason}")]
    Script { script: &'static str, reason: String },

    /// Pool was started twice.
    #[error("Worker pool is already running")]
    AlreadyRunning,
}
