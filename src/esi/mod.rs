//! Rate governed client for EVE Online's ESI API.
//!
//! Every request returns an [`EsiResponse`] carrying the decoded body (if any) and an
//! [`EsiMeta`] with the status, headers and error instead of failing outright, so callers can
//! treat `304 Not Modified` and `404 Not Found` as ordinary outcomes.
//!
//! Server errors are retried with a fixed backoff up to a small attempt ceiling; client errors
//! return immediately. Each response updates the shared [`EsiTracker`] error budget.

pub mod character;
pub mod killmail;
pub mod market;
pub mod meta;
pub mod tracker;
pub mod universe;

use std::time::Duration;

use reqwest::{
    header::{HeaderMap, IF_NONE_MATCH, USER_AGENT},
    StatusCode,
};
use serde::de::DeserializeOwned;

use crate::error::{esi::EsiError, Error};

pub use meta::{EsiMeta, EsiResponse};
pub use tracker::EsiTracker;

/// Request tuning for [`EsiClient`]
#[derive(Debug, Clone)]
pub struct EsiClientConfig {
    /// Attempts made for requests answered with a server error
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub retry_backoff: Duration,
    /// Overall timeout per attempt
    pub timeout: Duration,
}

impl Default for EsiClientConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff: Duration::from_secs(2),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct EsiClient {
    http: reqwest::Client,
    base_url: String,
    tracker: EsiTracker,
    config: EsiClientConfig,
}

impl EsiClient {
    pub fn new(base_url: &str, user_agent: &str, tracker: EsiTracker) -> Result<Self, Error> {
        Self::with_config(base_url, user_agent, tracker, EsiClientConfig::default())
    }

    pub fn with_config(
        base_url: &str,
        user_agent: &str,
        tracker: EsiTracker,
        config: EsiClientConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            user_agent
                .parse()
                .map_err(|_| Error::InternalError(format!("invalid user agent: {user_agent}")))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tracker,
            config,
        })
    }

    pub fn tracker(&self) -> &EsiTracker {
        &self.tracker
    }

    /// Performs a GET against `path`, optionally as a conditional request.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        etag: Option<&str>,
    ) -> EsiResponse<T> {
        if !self.tracker.watchman() {
            return failed(
                path,
                0,
                HeaderMap::new(),
                EsiError::Throttled {
                    path: path.to_string(),
                },
            );
        }

        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let mut request = self.http.get(&url);
            if let Some(etag) = etag {
                request = request.header(IF_NONE_MATCH, etag);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    self.tracker.record_transport_failure();

                    if attempt < self.config.max_attempts && (e.is_timeout() || e.is_connect()) {
                        tracing::warn!(path, attempt, "ESI request failed, retrying: {}", e);
                        tokio::time::sleep(self.config.retry_backoff).await;
                        continue;
                    }

                    return failed(
                        path,
                        0,
                        HeaderMap::new(),
                        EsiError::Transport {
                            path: path.to_string(),
                            source: e,
                        },
                    );
                }
            };

            let status = response.status();
            let code = status.as_u16();
            let headers = response.headers().clone();
            self.tracker.record_response(code, &headers);

            match status {
                StatusCode::OK => {
                    let body = match response.bytes().await {
                        Ok(body) => body,
                        Err(e) => {
                            return failed(
                                path,
                                code,
                                headers,
                                EsiError::Transport {
                                    path: path.to_string(),
                                    source: e,
                                },
                            )
                        }
                    };

                    return match serde_json::from_slice::<T>(&body) {
                        Ok(data) => EsiResponse {
                            data: Some(data),
                            meta: EsiMeta {
                                path: path.to_string(),
                                code,
                                headers,
                                error: None,
                            },
                        },
                        Err(e) => failed(
                            path,
                            code,
                            headers,
                            EsiError::Decode {
                                path: path.to_string(),
                                source: e,
                            },
                        ),
                    };
                }
                StatusCode::NOT_MODIFIED => {
                    return EsiResponse {
                        data: None,
                        meta: EsiMeta {
                            path: path.to_string(),
                            code,
                            headers,
                            error: None,
                        },
                    }
                }
                StatusCode::UNPROCESSABLE_ENTITY => {
                    return failed(
                        path,
                        code,
                        headers,
                        EsiError::Unprocessable {
                            path: path.to_string(),
                        },
                    )
                }
                s if s.is_server_error() => {
                    if attempt < self.config.max_attempts {
                        tracing::warn!(
                            path,
                            attempt,
                            code,
                            "ESI responded with server error, retrying"
                        );
                        tokio::time::sleep(self.config.retry_backoff).await;
                        continue;
                    }

                    return failed(
                        path,
                        code,
                        headers,
                        EsiError::MaxAttempts {
                            path: path.to_string(),
                            attempts: attempt,
                            code,
                        },
                    );
                }
                _ => {
                    return failed(
                        path,
                        code,
                        headers,
                        EsiError::Status {
                            code,
                            path: path.to_string(),
                        },
                    )
                }
            }
        }
    }
}

fn failed<T>(path: &str, code: u16, headers: HeaderMap, error: EsiError) -> EsiResponse<T> {
    EsiResponse {
        data: None,
        meta: EsiMeta {
            path: path.to_string(),
            code,
            headers,
            error: Some(error),
        },
    }
}

/// Client pointed at a mock server with no retry backoff
#[cfg(test)]
pub(crate) fn test_client(base_url: &str) -> EsiClient {
    EsiClient::with_config(
        base_url,
        wreckage_test_utils::prelude::TEST_USER_AGENT,
        EsiTracker::new(),
        EsiClientConfig {
            max_attempts: 3,
            retry_backoff: Duration::from_millis(0),
            timeout: Duration::from_secs(5),
        },
    )
    .unwrap()
}

#[cfg(test)]
mod tests;
