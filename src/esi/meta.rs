use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, ETAG, EXPIRES};

use crate::{error::esi::EsiError, util::time};

/// Outcome of an ESI request: status, headers and the error if the call did not succeed.
///
/// `304 Not Modified` is a success without a body.
#[derive(Debug)]
pub struct EsiMeta {
    pub path: String,
    /// Status code of the final attempt, 0 when no response was received
    pub code: u16,
    pub headers: HeaderMap,
    pub error: Option<EsiError>,
}

impl EsiMeta {
    pub fn is_ok(&self) -> bool {
        self.code == 200 && self.error.is_none()
    }

    pub fn is_not_modified(&self) -> bool {
        self.code == 304
    }

    pub fn is_not_found(&self) -> bool {
        self.code == 404
    }

    pub fn is_unprocessable(&self) -> bool {
        self.code == 422
    }

    pub fn etag(&self) -> Option<String> {
        self.headers
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string())
    }

    /// Cache expiry reported by ESI, one hour from now when absent
    pub fn expires(&self) -> DateTime<Utc> {
        self.headers
            .get(EXPIRES)
            .and_then(|value| value.to_str().ok())
            .and_then(time::parse_http_date)
            .unwrap_or_else(|| time::default_expiry(Utc::now()))
    }
}

/// Decoded body paired with the request metadata.
#[derive(Debug)]
pub struct EsiResponse<T> {
    pub data: Option<T>,
    pub meta: EsiMeta,
}

impl<T> EsiResponse<T> {
    /// Converts the response into its body, turning every non-200 outcome into an error
    pub fn into_result(self) -> Result<(T, EsiMeta), EsiError> {
        let EsiResponse { data, mut meta } = self;

        if let Some(err) = meta.error.take() {
            return Err(err);
        }

        match data {
            Some(data) => Ok((data, meta)),
            None => Err(EsiError::Status {
                code: meta.code,
                path: meta.path,
            }),
        }
    }
}
