//! bookcovers - Concurrent book cover retrieval
//!
//! Fetches the cover images of a book from a remote cover service. Every
//! cover slot is requested concurrently; the first failing request cancels
//! its siblings, and the caller receives either all covers or none.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`covers`] - Cover fetching, fan-out coordination and cancellation
//! - [`models`] - Core data structures and types
//! - [`storage`] - Book store abstraction
//! - [`error`] - Unified error type
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bookcovers::config::Config;
//! use bookcovers::covers::{BookCoverService, FanOutCoordinator};
//! use bookcovers::models::Book;
//! use bookcovers::storage::InMemoryBookStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let coordinator = FanOutCoordinator::from_config(&config.cover_service)?;
//!
//!     let book = Book::new("Dune", "Frank Herbert");
//!     let store = Arc::new(InMemoryBookStore::with_books([book.clone()]));
//!     let service = BookCoverService::new(store, coordinator);
//!
//!     let covers = service.get_covers(&book.id).await?;
//!     println!("{} covers", covers.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod covers;
pub mod error;
pub mod models;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::covers::{
        BookCoverService, CancellationSignal, CoverFetchClient, FanOutCoordinator,
    };
    pub use crate::error::{Error, Result};
    pub use crate::models::{Book, BookId, CoverId, CoverRecord, FetchOutcome};
    pub use crate::storage::{BookStore, InMemoryBookStore};
}

// Direct re-exports for convenience
pub use models::{BookId, CoverId, CoverRecord, FetchOutcome};
