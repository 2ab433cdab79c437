//! HTTP client for the remote cover service
//!
//! One call fetches one cover document. The client applies a request rate
//! limit, decodes the body with case-insensitive field matching, and wires
//! the shared [`CancellationSignal`] into the transport so an outstanding
//! request is dropped the moment a sibling fetch fails.

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client,
};
use std::num::NonZeroU32;
use url::Url;

use crate::config::CoverServiceConfig;
use crate::covers::signal::CancellationSignal;
use crate::models::{CoverId, CoverRecord, FetchOutcome};
use crate::utils::error::FetchError;
use crate::utils::{parse_http_url, truncate_text};

/// Path segments under which the cover service serves cover documents
pub const COVERS_PATH: [&str; 2] = ["api", "bookcovers"];

/// Cover service client
pub struct CoverFetchClient {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Rate limiter to control request frequency
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    /// Base URL of the cover service
    base_url: Url,
}

impl CoverFetchClient {
    /// Create a new client from cover service configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` if the base URL is not an absolute
    /// http(s) URL, or `FetchError::Http` if the HTTP client cannot be created
    pub fn new(config: &CoverServiceConfig) -> Result<Self, FetchError> {
        let base_url = parse_http_url(&config.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{e:#}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(config.request_timeout())
            .gzip(true)
            .build()?;

        let rate = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate));

        Ok(Self {
            client,
            rate_limiter,
            base_url,
        })
    }

    /// Create a client with default settings against `base_url`
    ///
    /// # Errors
    ///
    /// Same as [`CoverFetchClient::new`]
    pub fn with_base_url(base_url: &str) -> Result<Self, FetchError> {
        Self::new(&CoverServiceConfig::default().with_base_url(base_url))
    }

    /// Build `{base}/api/bookcovers/{cover_id}`
    ///
    /// The cover identifier is one percent-encoded path segment.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` if the base URL cannot carry a path
    pub fn cover_url(&self, cover_id: &CoverId) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(COVERS_PATH)
            .push(cover_id.as_str());
        Ok(url)
    }

    /// Fetch one cover, observing `signal`
    ///
    /// Never fails: every path ends in a [`FetchOutcome`]. A remote failure
    /// triggers `signal` so that sibling fetches abandon their work. If the
    /// signal fires while this request is outstanding, the request future is
    /// dropped (closing its connection) and the outcome is `Cancelled`.
    pub async fn fetch(&self, url: Url, signal: &CancellationSignal) -> FetchOutcome {
        let result = signal
            .run_until_cancelled(async {
                self.rate_limiter.until_ready().await;
                self.request(&url).await
            })
            .await;

        settle(url.as_str(), result, signal)
    }

    /// Fetch the cover named by `cover_id`, observing `signal`
    pub async fn fetch_cover(&self, cover_id: &CoverId, signal: &CancellationSignal) -> FetchOutcome {
        match self.cover_url(cover_id) {
            Ok(url) => self.fetch(url, signal).await,
            Err(err) => settle(cover_id.as_str(), Some(Err(err)), signal),
        }
    }

    /// Look up a single cover without fan-out or cancellation
    ///
    /// # Errors
    ///
    /// Returns `FetchError::NotFound` for a 404, `FetchError::ServerError`
    /// for any other non-success status, `FetchError::Decode` for a body
    /// that is not a cover document, and transport errors otherwise
    pub async fn get_cover(&self, cover_id: &CoverId) -> Result<CoverRecord, FetchError> {
        self.rate_limiter.until_ready().await;

        let url = self.cover_url(cover_id)?;
        tracing::debug!(url = %url, "Fetching single cover");
        self.request(&url).await
    }

    /// Issue the GET and decode the body
    async fn request(&self, url: &Url) -> Result<CoverRecord, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(FetchError::from_transport)?;

        CoverRecord::from_json_case_insensitive(&body).inspect_err(|err| {
            tracing::debug!(
                url = %url,
                error = %err,
                body = %truncate_text(&String::from_utf8_lossy(&body), 120),
                "Cover document rejected"
            );
        })
    }
}

/// Turn the result of a cancellable request into its outcome
///
/// `None` means the signal won the race. A transport error seen after the
/// signal fired is the torn-down connection of a cancelled request, not a
/// remote failure. Any other error triggers the signal.
fn settle(
    url: &str,
    result: Option<Result<CoverRecord, FetchError>>,
    signal: &CancellationSignal,
) -> FetchOutcome {
    match result {
        None => {
            tracing::debug!(url = %url, "Cover fetch cancelled");
            FetchOutcome::Cancelled
        }
        Some(Ok(record)) => {
            tracing::debug!(url = %url, cover_id = %record.id, "Cover fetched");
            FetchOutcome::Success(record)
        }
        Some(Err(FetchError::Http(_) | FetchError::Timeout)) if signal.is_triggered() => {
            tracing::debug!(url = %url, "Cover transport aborted after cancellation");
            FetchOutcome::Cancelled
        }
        Some(Err(err)) => {
            if signal.trigger() {
                tracing::warn!(
                    url = %url,
                    status = ?err.status(),
                    error = %err,
                    "Cover fetch failed, cancelling sibling fetches"
                );
            } else {
                tracing::debug!(url = %url, error = %err, "Cover fetch failed");
            }
            FetchOutcome::RemoteFailure(err)
        }
    }
}
