//! Error types for the wreckage killmail pipeline.
//!
//! Domain errors live in their own submodules (configuration, ESI, pricing, worker queue) and
//! are aggregated into [`Error`] using `thiserror`'s `#[from]` conversions so that the `?`
//! operator can be used across layer boundaries. Operation context is attached with
//! [`ResultExt::context`] so top-level log lines read like
//! `unable to cache alliance in redis: <original error>`.

pub mod config;
pub mod esi;
pub mod pricing;
pub mod retry;
pub mod worker;

use thiserror::Error;

use crate::error::{config::ConfigError, esi::EsiError, pricing::PricingError, worker::WorkerError};

/// Main error type for the wreckage crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (missing or invalid environment variables).
    #[error(transparent)]
    ConfigError(#[from] ConfigError),
    /// ESI request failed or returned an unexpected response.
    #[error(transparent)]
    EsiError(#[from] EsiError),
    /// Pricing engine error (blueprint cycles).
    #[error(transparent)]
    PricingError(#[from] PricingError),
    /// Worker queue error (message decoding, queue scripts).
    #[error(transparent)]
    WorkerError(#[from] WorkerError),
    /// Entity is absent from both the store and ESI.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    /// A cached value could not be decoded, the cache holds corrupt data.
    #[error("cached value at {key} is corrupt: {source}")]
    CacheCorrupted {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// Lower level error wrapped with the operation that produced it.
    #[error("{message}: {source}")]
    Context {
        message: String,
        #[source]
        source: Box<Error>,
    },
    /// Internal error indicating a bug in the pipeline.
    #[error("Internal error: {0}")]
    InternalError(String),
    /// Database error (query failures, connection issues, constraint violations).
    #[error(transparent)]
    DbErr(#[from] sea_orm::DbErr),
    /// Valkey/Redis error (connection, command or script execution).
    #[error(transparent)]
    RedisError(#[from] fred::error::Error),
    /// JSON serialization error outside of the cache.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    /// Raw HTTP client error outside of ESI (killboard history).
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    /// Cron scheduler error (job registration, scheduler startup).
    #[error(transparent)]
    SchedulerError(#[from] tokio_cron_scheduler::JobSchedulerError),
}

impl Error {
    /// Strips any [`Error::Context`] layers and returns the underlying error
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            err => err,
        }
    }

    /// Whether the underlying error is a typed not-found
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Error::NotFound { .. })
    }
}

/// Attaches operation context to errors crossing a layer boundary.
pub trait ResultExt<T> {
    fn context<S: Into<String>>(self, message: S) -> Result<T, Error>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<Error>,
{
    fn context<S: Into<String>>(self, message: S) -> Result<T, Error> {
        self.map_err(|err| Error::Context {
            message: message.into(),
            source: Box::new(err.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_prefixes_original_error() {
        let result: Result<(), Error> = Err(Error::NotFound {
            entity: "alliance",
            id: 99000001,
        });

        let err = result.context("unable to fetch alliance").unwrap_err();

        assert_eq!(
            err.to_string(),
            "unable to fetch alliance: alliance 99000001 not found"
        );
        assert!(err.is_not_found());
    }
}
