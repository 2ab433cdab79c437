//! Unified error handling for the bookcovers crate
//!
//! Fetch-level failures never escape a fan-out: they are recorded as
//! outcomes and aggregated by the coordinator. What remains here is the set
//! of conditions a caller of the public surface can actually observe.

use thiserror::Error;

use crate::models::BookId;

pub use crate::utils::error::FetchError;

/// Unified error type for the bookcovers crate
#[derive(Error, Debug)]
pub enum Error {
    /// Single-cover fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The book store has no record for the requested identifier
    #[error("Book not found: {0}")]
    BookNotFound(BookId),

    /// A fan-out task failed in a way other than a remote failure or
    /// cancellation (for example a panic inside the task)
    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl Error {
    /// True when the error is the "no such book" signal of the facade
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::BookNotFound(_))
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
