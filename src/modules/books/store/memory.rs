//! In-process book store with the same contract as the MySQL one.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bookshelf_db::DbError;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;

use super::BookStore;
use crate::modules::books::models::{Book, BookInput};

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, Book>,
}

/// Book store held in memory; used as the test double and for demos.
#[derive(Default)]
pub struct MemoryBookStore {
    table: RwLock<Table>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Current time at microsecond precision, like a `TIMESTAMP(6)` column.
fn now() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_microsecond(now.microsecond()).unwrap_or(now)
}

fn newest_first(mut books: Vec<Book>) -> Vec<Book> {
    books.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    books
}

/// Case-insensitive, accent-sensitive: `e` does not match `é`. The MySQL
/// store compares under `utf8mb4_bin` to the same effect.
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn insert(&self, input: &BookInput) -> Result<Book, DbError> {
        let mut table = self.table.write().await;
        table.next_id += 1;

        let stamp = now();
        let book = Book {
            id: table.next_id,
            title: input.title.clone(),
            author: input.author.clone(),
            published_year: input.published_year,
            genre: input.genre.clone(),
            created_at: stamp,
            updated_at: stamp,
        };

        table.rows.insert(book.id, book.clone());
        Ok(book)
    }

    async fn list(&self) -> Result<Vec<Book>, DbError> {
        let table = self.table.read().await;
        Ok(newest_first(table.rows.values().cloned().collect()))
    }

    async fn find(&self, id: i64) -> Result<Option<Book>, DbError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn update(&self, id: i64, input: &BookInput) -> Result<Option<Book>, DbError> {
        let mut table = self.table.write().await;
        let Some(book) = table.rows.get_mut(&id) else {
            return Ok(None);
        };

        book.title = input.title.clone();
        book.author = input.author.clone();
        book.published_year = input.published_year;
        book.genre = input.genre.clone();
        book.updated_at = now().max(book.updated_at + Duration::microseconds(1));

        Ok(Some(book.clone()))
    }

    async fn delete(&self, id: i64) -> Result<Option<Book>, DbError> {
        Ok(self.table.write().await.rows.remove(&id))
    }

    async fn search(&self, term: &str) -> Result<Vec<Book>, DbError> {
        let needle = term.to_lowercase();
        let table = self.table.read().await;

        let matches = table
            .rows
            .values()
            .filter(|book| {
                contains_ignore_case(&book.title, &needle)
                    || contains_ignore_case(&book.author, &needle)
                    || book
                        .genre
                        .as_deref()
                        .is_some_and(|genre| contains_ignore_case(genre, &needle))
            })
            .cloned()
            .collect();

        Ok(newest_first(matches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str, author: &str, genre: Option<&str>) -> BookInput {
        BookInput {
            title: title.to_string(),
            author: author.to_string(),
            published_year: None,
            genre: genre.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn ids_are_unique_and_never_reused() {
        let store = MemoryBookStore::new();
        let first = store.insert(&input("A", "X", None)).await.unwrap();
        store.delete(first.id).await.unwrap();
        let second = store.insert(&input("B", "Y", None)).await.unwrap();

        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryBookStore::new();
        let older = store.insert(&input("Old", "X", None)).await.unwrap();
        let newer = store.insert(&input("New", "Y", None)).await.unwrap();

        let ids: Vec<i64> = store.list().await.unwrap().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn update_moves_updated_at_forward() {
        let store = MemoryBookStore::new();
        let created = store.insert(&input("Dune", "Frank Herbert", None)).await.unwrap();
        let updated = store
            .update(created.id, &input("Dune Messiah", "Frank Herbert", None))
            .await
            .unwrap()
            .unwrap();

        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.id, created.id);
    }

    #[tokio::test]
    async fn missing_rows_report_none() {
        let store = MemoryBookStore::new();
        assert_eq!(store.find(42).await.unwrap(), None);
        assert_eq!(store.update(42, &input("A", "B", None)).await.unwrap(), None);
        assert_eq!(store.delete(42).await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn search_matches_any_field_ignoring_case() {
        let store = MemoryBookStore::new();
        let dune = store
            .insert(&input("Dune", "Frank Herbert", Some("Sci-Fi")))
            .await
            .unwrap();
        let emma = store
            .insert(&input("Emma", "Jane Austen", Some("Romance")))
            .await
            .unwrap();

        let by_genre = store.search("sci").await.unwrap();
        assert_eq!(by_genre, vec![dune.clone()]);

        let by_author = store.search("AUSTEN").await.unwrap();
        assert_eq!(by_author, vec![emma.clone()]);

        let by_letter = store.search("e").await.unwrap();
        assert_eq!(by_letter, vec![emma, dune]);

        assert!(store.search("tolkien").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_ignores_case_but_not_accents() {
        let store = MemoryBookStore::new();
        let cafe = store
            .insert(&input("Café Stories", "Anon", None))
            .await
            .unwrap();

        assert_eq!(store.search("CAFÉ").await.unwrap(), vec![cafe]);
        assert!(store.search("cafe stories").await.unwrap().is_empty());
    }
}
