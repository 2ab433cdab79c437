//! Book store abstraction
//!
//! Cover retrieval only needs to know whether a book exists and what its
//! record looks like. The storage technology behind it belongs to the
//! surrounding application, so it is hidden behind [`BookStore`].
//!
//! ```text
//! ┌──────────────────────┐      ┌─────────────────────┐
//! │   BookCoverService   │ ───▶ │   dyn BookStore     │
//! └──────────────────────┘      └─────────────────────┘
//!                                  │               │
//!                                  ▼               ▼
//!                          InMemoryBookStore   (application store)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::{Book, BookId};

/// Read-only lookup of book records
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Find a book by identifier
    async fn get_book(&self, id: &BookId) -> Result<Option<Book>>;

    /// Find all books whose identifier is in `ids`
    async fn get_books(&self, ids: &[BookId]) -> Result<Vec<Book>>;

    /// Check whether a book exists
    async fn book_exists(&self, id: &BookId) -> Result<bool> {
        Ok(self.get_book(id).await?.is_some())
    }
}

/// Shared book store handle
pub type SharedBookStore = Arc<dyn BookStore>;

/// Book store kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryBookStore {
    books: RwLock<HashMap<BookId, Book>>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `books`
    pub fn with_books(books: impl IntoIterator<Item = Book>) -> Self {
        let books = books.into_iter().map(|book| (book.id, book)).collect();
        Self {
            books: RwLock::new(books),
        }
    }

    /// Insert or replace a book
    pub async fn add_book(&self, book: Book) {
        tracing::debug!(book_id = %book.id, title = %book.title, "Adding book");
        self.books.write().await.insert(book.id, book);
    }

    pub async fn len(&self) -> usize {
        self.books.read().await.len()
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn get_book(&self, id: &BookId) -> Result<Option<Book>> {
        Ok(self.books.read().await.get(id).cloned())
    }

    async fn get_books(&self, ids: &[BookId]) -> Result<Vec<Book>> {
        let books = self.books.read().await;
        Ok(ids.iter().filter_map(|id| books.get(id).cloned()).collect())
    }
}
