use bookshelf_http::AppError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;

/// A persisted book record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Store-assigned identifier, never reused
    pub id: i64,
    pub title: String,
    pub author: String,
    pub published_year: Option<i32>,
    pub genre: Option<String>,
    /// Set once when the row is inserted
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Refreshed on every successful update
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Request body for create and update.
///
/// Every field is optional at the wire level so that a missing `title` or
/// `author` is reported as a validation error instead of a JSON rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookPayload {
    pub title: Option<String>,
    pub author: Option<String>,
    pub published_year: Option<i32>,
    pub genre: Option<String>,
}

/// Validated field set written by create and update. Update overwrites all
/// four fields, so an absent year or genre clears the stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookInput {
    pub title: String,
    pub author: String,
    pub published_year: Option<i32>,
    pub genre: Option<String>,
}

impl BookPayload {
    /// Check that `title` and `author` are present and not blank.
    pub fn validate(self) -> Result<BookInput, AppError> {
        let title = present(self.title);
        let author = present(self.author);

        match (title, author) {
            (Some(title), Some(author)) => Ok(BookInput {
                title,
                author,
                published_year: self.published_year,
                genre: present(self.genre),
            }),
            (title, author) => {
                let details = [("title", title.is_none()), ("author", author.is_none())]
                    .into_iter()
                    .filter(|(_, missing)| *missing)
                    .map(|(field, _)| json!({ "field": field, "error": "required" }))
                    .collect();

                Err(AppError::validation(details, "Title and author are required"))
            }
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Query string of the search endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}
