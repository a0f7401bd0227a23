use sea_orm::DbErr;

use super::{esi::EsiError, Error};

/// Strategy for handling errors in a retry context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorRetryStrategy {
    /// Retry with backoff (server errors, dropped connections)
    Retry,
    /// Failed permanently (bad request, bug, corrupt data)
    Fail,
}

impl Error {
    /// Determine error retry strategy based upon application Error type
    pub fn to_retry_strategy(&self) -> ErrorRetryStrategy {
        match self {
            Self::EsiError(esi_error) => match esi_error {
                // Network error or connection issue
                EsiError::Transport { .. } => ErrorRetryStrategy::Retry,
                // ESI is temporarily unavailable, try again once it recovers
                EsiError::MaxAttempts { .. } => ErrorRetryStrategy::Retry,
                EsiError::Throttled { .. } => ErrorRetryStrategy::Retry,
                EsiError::Status { code, .. } if *code >= 500 => ErrorRetryStrategy::Retry,
                // 420 error limited, the budget resets within a minute
                EsiError::Status { code: 420, .. } => ErrorRetryStrategy::Retry,
                // We're making invalid requests to ESI
                EsiError::Status { .. } => ErrorRetryStrategy::Fail,
                EsiError::Unprocessable { .. } => ErrorRetryStrategy::Fail,
                EsiError::Decode { .. } => ErrorRetryStrategy::Fail,
            },

            Self::Reqwest(reqwest_error) => match reqwest_error.status() {
                Some(status) if status.is_server_error() => ErrorRetryStrategy::Retry,
                Some(_) => ErrorRetryStrategy::Fail,
                None => ErrorRetryStrategy::Retry,
            },

            Self::DbErr(db_err) => match db_err {
                // Connection errors - transient, should retry
                DbErr::ConnectionAcquire(_) => ErrorRetryStrategy::Retry,
                DbErr::Conn(_) => ErrorRetryStrategy::Retry,
                // Constraint violations, type conversions, missing records
                _ => ErrorRetryStrategy::Fail,
            },

            // Valkey connection issues
            Self::RedisError(_) => ErrorRetryStrategy::Retry,

            Self::Context { source, .. } => source.to_retry_strategy(),

            Self::ConfigError(_) => ErrorRetryStrategy::Fail,
            Self::PricingError(_) => ErrorRetryStrategy::Fail,
            Self::WorkerError(_) => ErrorRetryStrategy::Fail,
            Self::NotFound { .. } => ErrorRetryStrategy::Fail,
            Self::CacheCorrupted { .. } => ErrorRetryStrategy::Fail,
            Self::SerdeJson(_) => ErrorRetryStrategy::Fail,
            Self::InternalError(_) => ErrorRetryStrategy::Fail,
            Self::SchedulerError(_) => ErrorRetryStrategy::Fail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retried() {
        let err = Error::EsiError(EsiError::MaxAttempts {
            path: "/killmails/1/abc/".to_string(),
            attempts: 3,
            code: 502,
        });

        assert_eq!(err.to_retry_strategy(), ErrorRetryStrategy::Retry);
    }

    #[test]
    fn client_errors_fail() {
        let err = Error::EsiError(EsiError::Status {
            code: 403,
            path: "/alliances/1/".to_string(),
        });

        assert_eq!(err.to_retry_strategy(), ErrorRetryStrategy::Fail);
    }

    #[test]
    fn context_uses_wrapped_strategy() {
        let err = Error::Context {
            message: "unable to fetch killmail".to_string(),
            source: Box::new(Error::DbErr(DbErr::Conn(sea_orm::RuntimeErr::Internal(
                "connection reset".to_string(),
            )))),
        };

        assert_eq!(err.to_retry_strategy(), ErrorRetryStrategy::Retry);
    }
}
