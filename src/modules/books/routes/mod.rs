//! HTTP handlers for the books module. Each one is a thin adapter:
//! extract, call `BookService`, wrap the result in an envelope.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequestParts, Path, Query, State,
    },
    http::request::Parts,
    routing::get,
    Json, Router,
};
use bookshelf_http::{AppError, Envelope};

use super::models::{Book, BookPayload, SearchParams};
use super::service::BookService;

/// Book id taken from the path. Ids that are not integers cannot match a row,
/// so they are reported as not found.
pub struct BookId(pub i64);

impl<S> FromRequestParts<S> for BookId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::not_found("Book not found"))?;

        raw.parse::<i64>()
            .map(Self)
            .map_err(|_| AppError::not_found("Book not found"))
    }
}

/// Routes relative to the module mount point
pub fn router(service: BookService) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/search", get(search_books))
        .route("/{id}", get(get_book).put(update_book).delete(delete_book))
        .with_state(service)
}

/// POST /books
async fn create_book(
    State(service): State<BookService>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<Envelope<Book>, AppError> {
    let Json(payload) = payload?;
    let book = service.create(payload).await?;
    Ok(Envelope::new("Book created successfully", book))
}

/// GET /books
async fn list_books(State(service): State<BookService>) -> Result<Envelope<Vec<Book>>, AppError> {
    let books = service.list().await?;
    Ok(Envelope::list("Books retrieved successfully", books))
}

/// GET /books/search?q=term
async fn search_books(
    State(service): State<BookService>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Envelope<Vec<Book>>, AppError> {
    let Query(params) = params?;
    let books = service.search(params.q.as_deref()).await?;
    Ok(Envelope::list("Search completed successfully", books))
}

/// GET /books/{id}
async fn get_book(
    State(service): State<BookService>,
    BookId(id): BookId,
) -> Result<Envelope<Book>, AppError> {
    let book = service.get(id).await?;
    Ok(Envelope::new("Book retrieved successfully", book))
}

/// PUT /books/{id}
async fn update_book(
    State(service): State<BookService>,
    BookId(id): BookId,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<Envelope<Book>, AppError> {
    let Json(payload) = payload?;
    let book = service.update(id, payload).await?;
    Ok(Envelope::new("Book updated successfully", book))
}

/// DELETE /books/{id}
async fn delete_book(
    State(service): State<BookService>,
    BookId(id): BookId,
) -> Result<Envelope<Book>, AppError> {
    let book = service.delete(id).await?;
    Ok(Envelope::new("Book deleted", book))
}
