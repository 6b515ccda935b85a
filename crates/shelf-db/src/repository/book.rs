//! # Book Repository
//!
//! Persistence and recency-ordered queries for books.
//!
//! ## Key Operations
//! - Insert (registering the owner on the fly)
//! - Positional reads for carousels: `count_*` + `nth_*`
//! - Delete (status rows go with it via ON DELETE CASCADE)
//!
//! ## Positional Reads
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  count_for_user(42)            → 3                                     │
//! │  nth_book_for_user(42, 0)      → newest   (LIMIT 1 OFFSET 0)           │
//! │  nth_book_for_user(42, 2)      → oldest   (LIMIT 1 OFFSET 2)           │
//! │  nth_book_for_user(42, 3)      → None     (out of range, not an error) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use super::{to_count, BOOK_COLUMNS, RECENCY_ORDER};
use crate::error::DbResult;
use crate::repository::user::UserRepository;
use shelf_core::{Book, NewBook};

/// Repository for book database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = BookRepository::new(pool);
///
/// let id = repo.add_book(42, &NewBook::new("Dune", "Herbert", "SciFi")).await?;
/// let newest = repo.nth_book_for_user(42, 0).await?;
/// ```
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    /// Creates a new BookRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookRepository { pool }
    }

    /// Inserts a book for `external_user_id`, registering the user if needed.
    ///
    /// The new book starts with no statuses, not favorite, and `created_at`
    /// set by the store. Input is stored as given; validation happens in the
    /// dispatcher.
    ///
    /// ## Returns
    /// The new book id.
    pub async fn add_book(&self, external_user_id: i64, book: &NewBook) -> DbResult<i64> {
        let owner_id = UserRepository::new(self.pool.clone())
            .ensure_user(external_user_id)
            .await?;

        let result = sqlx::query(
            r#"
            INSERT INTO books (owner_user_id, name, author, genre, photo_reference)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(owner_id)
        .bind(&book.name)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(book.photo_reference.as_deref())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, external_user_id, name = %book.name, "Added book");
        Ok(id)
    }

    /// Gets a book by id.
    ///
    /// ## Returns
    /// * `Ok(Some(Book))` - Book found
    /// * `Ok(None)` - No such book
    pub async fn get_book(&self, book_id: i64) -> DbResult<Option<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books b WHERE b.id = ?1");
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    /// Platform id of the book's owner, or `None` if the book doesn't exist.
    pub async fn owner_external_id(&self, book_id: i64) -> DbResult<Option<i64>> {
        let owner = sqlx::query_scalar(
            r#"
            SELECT u.external_user_id
            FROM books b
            INNER JOIN users u ON u.id = b.owner_user_id
            WHERE b.id = ?1
            "#,
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(owner)
    }

    // =========================================================================
    // Library (all users)
    // =========================================================================

    /// Number of books in the store.
    pub async fn count_all(&self) -> DbResult<u32> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        Ok(to_count(count))
    }

    /// The `index`-th most recent book in the store.
    pub async fn nth_book_overall(&self, index: u32) -> DbResult<Option<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books b {RECENCY_ORDER} LIMIT 1 OFFSET ?1");
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(i64::from(index))
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    /// A page of the store, newest first.
    pub async fn list_all(&self, limit: u32, offset: u32) -> DbResult<Vec<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books b {RECENCY_ORDER} LIMIT ?1 OFFSET ?2");
        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    // =========================================================================
    // Per-user
    // =========================================================================

    /// Number of books owned by `external_user_id`. Unknown users own none.
    pub async fn count_for_user(&self, external_user_id: i64) -> DbResult<u32> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM books b
            INNER JOIN users u ON u.id = b.owner_user_id
            WHERE u.external_user_id = ?1
            "#,
        )
        .bind(external_user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(to_count(count))
    }

    /// The `index`-th most recent book owned by `external_user_id`.
    pub async fn nth_book_for_user(
        &self,
        external_user_id: i64,
        index: u32,
    ) -> DbResult<Option<Book>> {
        let sql = format!(
            r#"
            SELECT {BOOK_COLUMNS}
            FROM books b
            INNER JOIN users u ON u.id = b.owner_user_id
            WHERE u.external_user_id = ?1
            {RECENCY_ORDER}
            LIMIT 1 OFFSET ?2
            "#
        );
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(external_user_id)
            .bind(i64::from(index))
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    /// A page of `external_user_id`'s books, newest first.
    pub async fn list_for_user(
        &self,
        external_user_id: i64,
        limit: u32,
        offset: u32,
    ) -> DbResult<Vec<Book>> {
        let sql = format!(
            r#"
            SELECT {BOOK_COLUMNS}
            FROM books b
            INNER JOIN users u ON u.id = b.owner_user_id
            WHERE u.external_user_id = ?1
            {RECENCY_ORDER}
            LIMIT ?2 OFFSET ?3
            "#
        );
        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(external_user_id)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    /// Deletes a book and, through the cascade, its status rows.
    ///
    /// ## Returns
    /// * `Ok(true)` - The book existed and is gone
    /// * `Ok(false)` - Nothing to delete
    pub async fn delete_book(&self, book_id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?1")
            .bind(book_id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        debug!(book_id, deleted, "Delete book");
        Ok(deleted)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
