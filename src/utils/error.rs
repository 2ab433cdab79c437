//! Error types for remote cover fetching
//!
//! This module defines the failure taxonomy of a single cover fetch.

use thiserror::Error;

/// Errors that can occur while fetching one cover from the cover service
///
/// Every variant collapses into a `RemoteFailure` outcome at the fetch
/// boundary; the variants only exist so that logs and single-cover lookups
/// can tell the failure modes apart.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status returned by the cover service
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Cover does not exist on the cover service (404)
    #[error("Cover not found")]
    NotFound,

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Response body is not a valid cover document
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Classify a transport error from reqwest
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }

    /// Map a non-success HTTP status to an error
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            other => Self::ServerError(other),
        }
    }

    /// HTTP status code reported by the service, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServerError(code) => Some(*code),
            Self::NotFound => Some(404),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
