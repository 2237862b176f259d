//! Persistence seam for books.
//!
//! Handlers never see a connection: they go through `BookService`, which owns
//! an `Arc<dyn BookStore>` injected at start-up. Production uses
//! [`MySqlBookStore`]; tests substitute [`MemoryBookStore`].

mod memory;
mod mysql;

pub use memory::MemoryBookStore;
pub use mysql::MySqlBookStore;
pub(crate) use mysql::CREATE_TABLE;

use async_trait::async_trait;
use bookshelf_db::DbError;

use super::models::{Book, BookInput};

/// Data access for the `books` table.
///
/// Listing and search return newest first (`created_at` descending, later ids
/// first on equal timestamps).
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a row and return it with its assigned id and timestamps.
    async fn insert(&self, input: &BookInput) -> Result<Book, DbError>;

    async fn list(&self) -> Result<Vec<Book>, DbError>;

    async fn find(&self, id: i64) -> Result<Option<Book>, DbError>;

    /// Overwrite all editable fields and bump `updated_at`. `None` when the id
    /// does not exist.
    async fn update(&self, id: i64, input: &BookInput) -> Result<Option<Book>, DbError>;

    /// Remove the row and return it as it was just before deletion.
    async fn delete(&self, id: i64) -> Result<Option<Book>, DbError>;

    /// Case-insensitive substring match over title, author and genre. Accents
    /// are significant.
    async fn search(&self, term: &str) -> Result<Vec<Book>, DbError>;
}
