//! Fan-out/fan-in of cover fetches for one book
//!
//! A retrieval request spawns one task per cover slot. All tasks share a
//! single [`CancellationSignal`] created for that request; the first remote
//! failure triggers it and every other task abandons its work. The
//! coordinator always waits for every task to reach a terminal
//! [`FetchOutcome`], stores each outcome at its dispatch index, and only
//! then decides the aggregate result.
//!
//! # Aggregation policy
//!
//! All slots succeeded: the covers are returned in slot order. Anything else
//! is an [`AggregateCancellation`], which [`FanOutCoordinator::fetch_all_covers`]
//! turns into an empty list. Partial successes are never returned. A task
//! panic is not a cancellation and propagates as [`Error::Unexpected`].

use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::CoverServiceConfig;
use crate::covers::client::CoverFetchClient;
use crate::covers::signal::CancellationSignal;
use crate::error::{Error, Result};
use crate::models::{BookId, CoverId, CoverRecord, FetchOutcome};

/// The fan-out did not complete cleanly
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cover fan-out aborted: {failed} failed, {cancelled} cancelled")]
pub struct AggregateCancellation {
    /// Number of remote failures
    pub failed: usize,

    /// Number of fetches that observed the cancellation signal
    pub cancelled: usize,
}

/// Every outcome of one fan-out, in dispatch order
#[derive(Debug)]
pub struct FanOutReport {
    book_id: BookId,
    outcomes: Vec<FetchOutcome>,
}

impl FanOutReport {
    pub fn new(book_id: BookId, outcomes: Vec<FetchOutcome>) -> Self {
        Self { book_id, outcomes }
    }

    pub fn book_id(&self) -> &BookId {
        &self.book_id
    }

    pub fn outcomes(&self) -> &[FetchOutcome] {
        &self.outcomes
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_remote_failure()).count()
    }

    pub fn cancelled(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_cancelled()).count()
    }

    /// Apply the all-or-nothing aggregation policy
    ///
    /// # Errors
    ///
    /// Returns `AggregateCancellation` if any outcome is not a success
    pub fn into_covers(self) -> std::result::Result<Vec<CoverRecord>, AggregateCancellation> {
        let failed = self.failed();
        let cancelled = self.cancelled();
        if failed > 0 || cancelled > 0 {
            return Err(AggregateCancellation { failed, cancelled });
        }

        Ok(self
            .outcomes
            .into_iter()
            .filter_map(FetchOutcome::into_record)
            .collect())
    }
}

/// Run one fetch per cover identifier concurrently and join them all
///
/// `fetch` builds the future for one identifier; it receives a clone of the
/// request's cancellation signal. At most `max_concurrent` fetches run at
/// once; a task still waiting for its turn when the signal fires reports
/// `Cancelled` without calling `fetch`'s future.
///
/// The returned vector has exactly one outcome per identifier, at the
/// identifier's index.
///
/// # Errors
///
/// Returns `Error::Unexpected` if a task panics. Remaining tasks are
/// cancelled and awaited before returning.
pub async fn fan_out<F, Fut>(
    cover_ids: Vec<CoverId>,
    max_concurrent: usize,
    fetch: F,
) -> Result<Vec<FetchOutcome>>
where
    F: Fn(CoverId, CancellationSignal) -> Fut,
    Fut: Future<Output = FetchOutcome> + Send + 'static,
{
    let dispatched = cover_ids.len();
    let signal = CancellationSignal::new();
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let mut tasks = JoinSet::new();

    for (index, cover_id) in cover_ids.into_iter().enumerate() {
        let task_signal = signal.clone();
        let semaphore = Arc::clone(&semaphore);
        let work = fetch(cover_id, signal.clone());

        tasks.spawn(async move {
            let outcome = match task_signal
                .run_until_cancelled(semaphore.acquire_owned())
                .await
            {
                Some(Ok(_permit)) => work.await,
                Some(Err(_)) | None => FetchOutcome::Cancelled,
            };
            (index, outcome)
        });
    }

    join_outcomes(tasks, dispatched, &signal).await
}

/// Join every fan-out task and place each outcome at its dispatch index
///
/// A task that was aborted without reporting leaves its slot as
/// `Cancelled`, so the result always has `dispatched` entries.
async fn join_outcomes(
    mut tasks: JoinSet<(usize, FetchOutcome)>,
    dispatched: usize,
    signal: &CancellationSignal,
) -> Result<Vec<FetchOutcome>> {
    let mut slots: Vec<Option<FetchOutcome>> = (0..dispatched).map(|_| None).collect();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, outcome)) => {
                tracing::trace!(slot = index + 1, outcome = outcome.label(), "Cover task finished");
                slots[index] = Some(outcome);
            }
            Err(e) if e.is_panic() => {
                signal.trigger();
                tasks.shutdown().await;
                tracing::error!(error = %e, "Cover fetch task panicked");
                return Err(Error::Unexpected(format!("cover fetch task panicked: {e}")));
            }
            Err(e) => {
                tracing::debug!(error = %e, "Cover fetch task aborted");
            }
        }
    }

    Ok(slots
        .into_iter()
        .map(|slot| slot.unwrap_or(FetchOutcome::Cancelled))
        .collect())
}

/// Fetches all cover slots of a book against the cover service
pub struct FanOutCoordinator {
    client: Arc<CoverFetchClient>,
    cover_slots: usize,
    max_concurrent_fetches: usize,
}

impl FanOutCoordinator {
    /// Create a coordinator around an existing client
    pub fn new(client: Arc<CoverFetchClient>, config: &CoverServiceConfig) -> Self {
        Self {
            client,
            cover_slots: config.cover_slots,
            max_concurrent_fetches: config.max_concurrent_fetches,
        }
    }

    /// Create a coordinator and its client from configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Fetch` if the client cannot be built
    pub fn from_config(config: &CoverServiceConfig) -> Result<Self> {
        let client = CoverFetchClient::new(config)?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn client(&self) -> &Arc<CoverFetchClient> {
        &self.client
    }

    /// Cover identifiers probed for `book_id`, in dispatch order
    pub fn cover_identifiers(&self, book_id: &BookId) -> Vec<CoverId> {
        CoverId::for_book(book_id, self.cover_slots)
    }

    /// Fetch every cover slot of `book_id` and report each outcome
    ///
    /// # Errors
    ///
    /// Returns `Error::Unexpected` if a fetch task panics
    pub async fn dispatch(&self, book_id: &BookId) -> Result<FanOutReport> {
        let cover_ids = self.cover_identifiers(book_id);
        tracing::debug!(
            book_id = %book_id,
            slots = cover_ids.len(),
            max_concurrent = self.max_concurrent_fetches,
            "Dispatching cover fetches"
        );

        let client = Arc::clone(&self.client);
        let outcomes = fan_out(cover_ids, self.max_concurrent_fetches, move |cover_id, signal| {
            let client = Arc::clone(&client);
            async move { client.fetch_cover(&cover_id, &signal).await }
        })
        .await?;

        let report = FanOutReport::new(*book_id, outcomes);
        tracing::debug!(
            book_id = %book_id,
            succeeded = report.succeeded(),
            failed = report.failed(),
            cancelled = report.cancelled(),
            "Cover fan-out joined"
        );

        Ok(report)
    }

    /// Fetch all covers of `book_id`
    ///
    /// Returns every cover in slot order when all fetches succeed, and an
    /// empty list as soon as any fetch failed or was cancelled.
    ///
    /// # Errors
    ///
    /// Returns `Error::Unexpected` if a fetch task panics
    pub async fn fetch_all_covers(&self, book_id: &BookId) -> Result<Vec<CoverRecord>> {
        let report = self.dispatch(book_id).await?;

        match report.into_covers() {
            Ok(covers) => Ok(covers),
            Err(aggregate) => {
                tracing::warn!(
                    book_id = %book_id,
                    failed = aggregate.failed,
                    cancelled = aggregate.cancelled,
                    "Cover fan-out did not complete, returning no covers"
                );
                Ok(Vec::new())
            }
        }
    }
}
