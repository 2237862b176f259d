use std::sync::Arc;

use bookshelf_http::AppError;

use super::models::{Book, BookPayload};
use super::store::BookStore;

const NOT_FOUND: &str = "Book not found";

/// The six book operations. Validation happens here, before any store call;
/// store failures convert into `AppError` at this boundary.
#[derive(Clone)]
pub struct BookService {
    store: Arc<dyn BookStore>,
}

impl BookService {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, payload: BookPayload) -> Result<Book, AppError> {
        let input = payload.validate()?;
        let book = self.store.insert(&input).await?;

        tracing::info!(book_id = book.id, "book created");
        Ok(book)
    }

    pub async fn list(&self) -> Result<Vec<Book>, AppError> {
        Ok(self.store.list().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Book, AppError> {
        self.store
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))
    }

    pub async fn update(&self, id: i64, payload: BookPayload) -> Result<Book, AppError> {
        let input = payload.validate()?;
        let book = self
            .store
            .update(id, &input)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

        tracing::info!(book_id = book.id, "book updated");
        Ok(book)
    }

    /// Delete and return the record as it was just before removal.
    pub async fn delete(&self, id: i64) -> Result<Book, AppError> {
        let book = self
            .store
            .delete(id)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

        tracing::info!(book_id = book.id, "book deleted");
        Ok(book)
    }

    pub async fn search(&self, term: Option<&str>) -> Result<Vec<Book>, AppError> {
        let term = term
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                AppError::validation(
                    vec![serde_json::json!({ "field": "q", "error": "required" })],
                    "Search query is required",
                )
            })?;

        Ok(self.store.search(term).await?)
    }
}
