//! # Status Repository
//!
//! The toggle engine: reading statuses, the favorite flag, and the
//! per-status and favorites carousels.
//!
//! ## Toggle Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  toggle(book, S)            one transaction                            │
//! │                                                                         │
//! │  DELETE (book, S)                                                      │
//! │       │                                                                 │
//! │       ├── row removed ──────────────────────► commit, return false     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  book exists? ── no ───────────────────────► rollback, NotFound        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT OR IGNORE (book, S)                                            │
//! │  DELETE (book, opposite(S))                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  commit, return true                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Starting with the DELETE takes the write lock first, so the existence
//! check and the inserts all see the same snapshot. At most one of the two
//! statuses is ever active for a book.

use sqlx::SqlitePool;
use tracing::{debug, warn};

use super::{to_count, BOOK_COLUMNS, RECENCY_ORDER};
use crate::error::{DbError, DbResult};
use shelf_core::{Book, ReadingStatus};

/// Repository for status and favorite toggles.
#[derive(Debug, Clone)]
pub struct StatusRepository {
    pool: SqlitePool,
}

impl StatusRepository {
    /// Creates a new StatusRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StatusRepository { pool }
    }

    /// Flips `status` on `book_id`.
    ///
    /// ## Returns
    /// * `Ok(true)` - The status is now active (the opposite one was cleared)
    /// * `Ok(false)` - The status was active and is now cleared
    /// * `Err(DbError::NotFound)` - No such book; nothing changed
    pub async fn toggle(&self, book_id: i64, status: ReadingStatus) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM book_statuses WHERE book_id = ?1 AND status = ?2")
            .bind(book_id)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed > 0 {
            tx.commit()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
            debug!(book_id, %status, "Status cleared");
            return Ok(false);
        }

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM books WHERE id = ?1")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?;

        if exists.is_none() {
            // Dropping the transaction rolls it back
            return Err(DbError::not_found("Book", book_id.to_string()));
        }

        sqlx::query("INSERT OR IGNORE INTO book_statuses (book_id, status) VALUES (?1, ?2)")
            .bind(book_id)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM book_statuses WHERE book_id = ?1 AND status = ?2")
            .bind(book_id)
            .bind(status.opposite().as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(book_id, %status, "Status set");
        Ok(true)
    }

    /// [`toggle`](Self::toggle) for a raw status string.
    ///
    /// Anything outside the status vocabulary (`in_progress`, `in`, `read`)
    /// is a no-op returning `Ok(false)`.
    pub async fn toggle_status(&self, book_id: i64, status: &str) -> DbResult<bool> {
        match status.parse::<ReadingStatus>() {
            Ok(status) => self.toggle(book_id, status).await,
            Err(_) => {
                warn!(book_id, status, "Ignoring toggle of unknown status");
                Ok(false)
            }
        }
    }

    /// Flips the favorite flag in one statement.
    ///
    /// ## Returns
    /// The new value; `false` if the book doesn't exist.
    pub async fn toggle_favorite(&self, book_id: i64) -> DbResult<bool> {
        let favorite: Option<bool> = sqlx::query_scalar(
            r#"
            UPDATE books
            SET is_favorite = CASE is_favorite WHEN 0 THEN 1 ELSE 0 END
            WHERE id = ?1
            RETURNING is_favorite
            "#,
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        debug!(book_id, ?favorite, "Favorite toggled");
        Ok(favorite.unwrap_or(false))
    }

    /// Active statuses of a book, sorted by stored string.
    ///
    /// Stored values outside the vocabulary are skipped.
    pub async fn list_statuses(&self, book_id: i64) -> DbResult<Vec<ReadingStatus>> {
        let rows: Vec<String> =
            sqlx::query_scalar("SELECT status FROM book_statuses WHERE book_id = ?1 ORDER BY status")
                .bind(book_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.iter().filter_map(|s| s.parse().ok()).collect())
    }

    // =========================================================================
    // Status carousels
    // =========================================================================

    /// Number of `external_user_id`'s books carrying `status`.
    pub async fn count_for_user_by_status(
        &self,
        external_user_id: i64,
        status: ReadingStatus,
    ) -> DbResult<u32> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM books b
            INNER JOIN users u ON u.id = b.owner_user_id
            INNER JOIN book_statuses s ON s.book_id = b.id
            WHERE u.external_user_id = ?1 AND s.status = ?2
            "#,
        )
        .bind(external_user_id)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(to_count(count))
    }

    /// The `index`-th most recent of `external_user_id`'s books carrying `status`.
    pub async fn nth_book_for_user_by_status(
        &self,
        external_user_id: i64,
        status: ReadingStatus,
        index: u32,
    ) -> DbResult<Option<Book>> {
        let sql = format!(
            r#"
            SELECT {BOOK_COLUMNS}
            FROM books b
            INNER JOIN users u ON u.id = b.owner_user_id
            INNER JOIN book_statuses s ON s.book_id = b.id
            WHERE u.external_user_id = ?1 AND s.status = ?2
            {RECENCY_ORDER}
            LIMIT 1 OFFSET ?3
            "#
        );
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(external_user_id)
            .bind(status.as_str())
            .bind(i64::from(index))
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    // =========================================================================
    // Favorites carousel
    // =========================================================================

    /// Number of `external_user_id`'s favorite books.
    pub async fn count_user_favorites(&self, external_user_id: i64) -> DbResult<u32> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM books b
            INNER JOIN users u ON u.id = b.owner_user_id
            WHERE u.external_user_id = ?1 AND b.is_favorite = 1
            "#,
        )
        .bind(external_user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(to_count(count))
    }

    /// The `index`-th most recent of `external_user_id`'s favorite books.
    pub async fn nth_user_favorite(
        &self,
        external_user_id: i64,
        index: u32,
    ) -> DbResult<Option<Book>> {
        let sql = format!(
            r#"
            SELECT {BOOK_COLUMNS}
            FROM books b
            INNER JOIN users u ON u.id = b.owner_user_id
            WHERE u.external_user_id = ?1 AND b.is_favorite = 1
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
}

// =============================================================================
// Unit Tests
// =============================================================================
