//! MySQL-backed book store.
//!
//! Every call checks a connection out of the pool and hands it back when the
//! connection or transaction guard drops, on success and error paths alike.
//! Writes run in a transaction; an early return drops it and rolls back.

use async_trait::async_trait;
use bookshelf_db::{DbError, MySqlPool};

use super::BookStore;
use crate::modules::books::models::{Book, BookInput};

const SELECT_ALL: &str = "SELECT id, title, author, published_year, genre, created_at, updated_at \
     FROM books ORDER BY created_at DESC, id DESC";

const SELECT_BY_ID: &str = "SELECT id, title, author, published_year, genre, created_at, updated_at \
     FROM books WHERE id = ?";

const LOCK_BY_ID: &str = "SELECT id, title, author, published_year, genre, created_at, updated_at \
     FROM books WHERE id = ? FOR UPDATE";

// Binary collation: case folding comes only from LOWER, accents stay significant
const SEARCH: &str = "SELECT id, title, author, published_year, genre, created_at, updated_at \
     FROM books \
     WHERE LOWER(title) COLLATE utf8mb4_bin LIKE ? \
        OR LOWER(author) COLLATE utf8mb4_bin LIKE ? \
        OR LOWER(genre) COLLATE utf8mb4_bin LIKE ? \
     ORDER BY created_at DESC, id DESC";

const INSERT: &str = "INSERT INTO books (title, author, published_year, genre) VALUES (?, ?, ?, ?)";

// updated_at must move strictly forward even when two writes share a microsecond
const UPDATE: &str = "UPDATE books \
     SET title = ?, author = ?, published_year = ?, genre = ?, \
         updated_at = GREATEST(CURRENT_TIMESTAMP(6), updated_at + INTERVAL 1 MICROSECOND) \
     WHERE id = ?";

const DELETE: &str = "DELETE FROM books WHERE id = ?";

/// Table definition contributed to schema bootstrap
pub(crate) const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    id             BIGINT       NOT NULL AUTO_INCREMENT,
    title          VARCHAR(255) NOT NULL,
    author         VARCHAR(255) NOT NULL,
    published_year INT          NULL,
    genre          VARCHAR(100) NULL,
    created_at     TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
    updated_at     TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6) ON UPDATE CURRENT_TIMESTAMP(6),
    PRIMARY KEY (id),
    INDEX idx_books_created_at (created_at)
) ENGINE = InnoDB DEFAULT CHARSET = utf8mb4 COLLATE = utf8mb4_bin
"#;

/// Book store over a shared MySQL pool
#[derive(Clone)]
pub struct MySqlBookStore {
    pool: MySqlPool,
}

impl MySqlBookStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// `%term%` with LIKE wildcards in the term matched literally.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl BookStore for MySqlBookStore {
    async fn insert(&self, input: &BookInput) -> Result<Book, DbError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(INSERT)
            .bind(&input.title)
            .bind(&input.author)
            .bind(input.published_year)
            .bind(&input.genre)
            .execute(&mut *tx)
            .await?;

        let id = i64::try_from(result.last_insert_id()).map_err(|e| {
            sqlx::Error::Decode(format!("insert id out of range: {e}").into())
        })?;

        let book = sqlx::query_as::<_, Book>(SELECT_BY_ID)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(book)
    }

    async fn list(&self) -> Result<Vec<Book>, DbError> {
        let books = sqlx::query_as::<_, Book>(SELECT_ALL)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn find(&self, id: i64) -> Result<Option<Book>, DbError> {
        let book = sqlx::query_as::<_, Book>(SELECT_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn update(&self, id: i64, input: &BookInput) -> Result<Option<Book>, DbError> {
        let mut tx = self.pool.begin().await?;

        // Row lock closes the gap between the existence check and the write
        let current = sqlx::query_as::<_, Book>(LOCK_BY_ID)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if current.is_none() {
            return Ok(None);
        }

        sqlx::query(UPDATE)
            .bind(&input.title)
            .bind(&input.author)
            .bind(input.published_year)
            .bind(&input.genre)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let book = sqlx::query_as::<_, Book>(SELECT_BY_ID)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(book))
    }

    async fn delete(&self, id: i64) -> Result<Option<Book>, DbError> {
        let mut tx = self.pool.begin().await?;

        let Some(book) = sqlx::query_as::<_, Book>(LOCK_BY_ID)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        sqlx::query(DELETE).bind(id).execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(Some(book))
    }

    async fn search(&self, term: &str) -> Result<Vec<Book>, DbError> {
        let pattern = like_pattern(term);

        let books = sqlx::query_as::<_, Book>(SEARCH)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_wraps_and_lowercases() {
        assert_eq!(like_pattern("Dune"), "%dune%");
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("100%_a\\b"), "%100\\%\\_a\\\\b%");
    }

    // Integration tests require a real database
    // Run with: DATABASE_URL=mysql://... cargo test -- --ignored

    async fn store() -> MySqlBookStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = MySqlPool::connect(&url).await.expect("pool creation failed");
        sqlx::raw_sql(CREATE_TABLE)
            .execute(&pool)
            .await
            .expect("schema bootstrap failed");
        MySqlBookStore::new(pool)
    }

    fn input(title: &str) -> BookInput {
        BookInput {
            title: title.to_string(),
            author: "Frank Herbert".to_string(),
            published_year: Some(1965),
            genre: Some("Sci-Fi".to_string()),
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn insert_then_find_round_trips() {
        let store = store().await;
        let created = store.insert(&input("Dune")).await.unwrap();

        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(store.find(created.id).await.unwrap(), Some(created.clone()));

        store.delete(created.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn update_advances_updated_at() {
        let store = store().await;
        let created = store.insert(&input("Dune")).await.unwrap();

        let updated = store
            .update(created.id, &input("Dune Messiah"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);

        store.delete(created.id).await.unwrap();
        assert_eq!(store.update(created.id, &input("gone")).await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn search_ignores_case_but_not_accents() {
        let store = store().await;
        let cafe = store.insert(&input("Café Stories")).await.unwrap();

        let by_case = store.search("CAFÉ").await.unwrap();
        assert!(by_case.iter().any(|b| b.id == cafe.id));

        let unaccented = store.search("cafe stories").await.unwrap();
        assert!(unaccented.iter().all(|b| b.id != cafe.id));

        store.delete(cafe.id).await.unwrap();
    }
}
