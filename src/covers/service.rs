//! Entry point used by the surrounding API layer

use crate::covers::coordinator::FanOutCoordinator;
use crate::error::{Error, Result};
use crate::models::{Book, BookId, BookWithCovers, CoverRecord};
use crate::storage::SharedBookStore;

/// Looks books up in the book store and retrieves their covers
pub struct BookCoverService {
    store: SharedBookStore,
    coordinator: FanOutCoordinator,
}

impl BookCoverService {
    pub fn new(store: SharedBookStore, coordinator: FanOutCoordinator) -> Self {
        Self { store, coordinator }
    }

    pub fn coordinator(&self) -> &FanOutCoordinator {
        &self.coordinator
    }

    /// Covers of an existing book
    ///
    /// An empty list means the book exists but its covers could not all be
    /// retrieved.
    ///
    /// # Errors
    ///
    /// Returns `Error::BookNotFound` if the store has no such book, store
    /// errors as-is, and `Error::Unexpected` if a fetch task panics
    pub async fn get_covers(&self, book_id: &BookId) -> Result<Vec<CoverRecord>> {
        self.require_book(book_id).await?;
        self.coordinator.fetch_all_covers(book_id).await
    }

    /// A book record together with its covers
    ///
    /// # Errors
    ///
    /// Same as [`BookCoverService::get_covers`]
    pub async fn get_book_with_covers(&self, book_id: &BookId) -> Result<BookWithCovers> {
        let book = self.require_book(book_id).await?;
        let covers = self.coordinator.fetch_all_covers(book_id).await?;

        tracing::info!(
            book_id = %book_id,
            covers = covers.len(),
            "Retrieved book with covers"
        );

        Ok(BookWithCovers { book, covers })
    }

    async fn require_book(&self, book_id: &BookId) -> Result<Book> {
        match self.store.get_book(book_id).await? {
            Some(book) => Ok(book),
            None => {
                tracing::debug!(book_id = %book_id, "Book not found");
                Err(Error::BookNotFound(*book_id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoverServiceConfig;
    use crate::storage::InMemoryBookStore;
    use std::sync::Arc;

    fn service_with(books: Vec<Book>) -> BookCoverService {
        // No cover service listens here; only lookups that stop before
        // the fan-out are exercised
        let config = CoverServiceConfig::default().with_base_url("http://127.0.0.1:1");
        let coordinator = FanOutCoordinator::from_config(&config).unwrap();
        BookCoverService::new(Arc::new(InMemoryBookStore::with_books(books)), coordinator)
    }

    #[tokio::test]
    async fn test_unknown_book_is_not_found() {
        let service = service_with(vec![Book::new("Dune", "Frank Herbert")]);
        let missing = BookId::new();

        let err = service.get_covers(&missing).await.unwrap_err();
        assert!(matches!(err, Error::BookNotFound(id) if id == missing));

        let err = service.get_book_with_covers(&missing).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unreachable_cover_service_yields_empty_list() {
        let book = Book::new("Dune", "Frank Herbert");
        let service = service_with(vec![book.clone()]);

        let covers = service.get_covers(&book.id).await.unwrap();
        assert!(covers.is_empty());
    }
}
