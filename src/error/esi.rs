//! ESI request error types.
//!
//! These errors are carried inside [`crate::esi::EsiMeta`] rather than returned directly so
//! callers always get the status code and headers alongside the failure.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EsiError {
    /// Network failure, timeout or TLS error before a status was received.
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// Non-success status that is not handled as a first class outcome.
    #[error("unexpected status {code} from {path}")]
    Status { code: u16, path: String },
    /// Status 422, ESI rejected the request parameters (killmail hash mismatch).
    #[error("ESI rejected request to {path} as unprocessable")]
    Unprocessable { path: String },
    /// Server errors persisted through every attempt.
    #[error("request to {path} failed after {attempts} attempts with status {code}")]
    MaxAttempts { path: String, attempts: u32, code: u16 },
    /// Response body did not match the expected model.
    #[error("failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// The shared error budget is exhausted, request was not sent.
    #[error("ESI error budget exhausted, request to {path} withheld")]
    Throttled { path: String },
}
