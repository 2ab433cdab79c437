//! Book cover retrieval
//!
//! Given a book identifier, fetch every cover slot from the remote cover
//! service concurrently and return the covers only if all of them arrived.
//!
//! ```text
//! BookCoverService ─▶ FanOutCoordinator ─┬─▶ task 1 ─▶ CoverFetchClient ─┐
//!                                        ├─▶ task 2 ─▶ CoverFetchClient ─┤
//!                                        └─▶ task N ─▶ CoverFetchClient ─┤
//!                                                                        │
//!                         one CancellationSignal shared by all tasks ◀───┘
//! ```

pub mod client;
pub mod coordinator;
pub mod service;
pub mod signal;

pub use client::CoverFetchClient;
pub use coordinator::{AggregateCancellation, FanOutCoordinator, FanOutReport};
pub use service::BookCoverService;
pub use signal::CancellationSignal;
