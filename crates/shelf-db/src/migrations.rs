//! # Database Migrations
//!
//! Runtime schema creation and in-place upgrades of older databases.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  App Startup                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ensure_schema ── CREATE ... IF NOT EXISTS (tables, indexes)           │
//! │       │            failure here aborts startup                         │
//! │       ▼                                                                 │
//! │  ensure_favorite_column ── PRAGMA table_info(books)                    │
//! │       │            column missing? ALTER TABLE ... ADD COLUMN          │
//! │       │            failure logged, startup continues                   │
//! │       ▼                                                                 │
//! │  backfill_legacy_statuses (once, recorded in _migrations)              │
//! │       │            books.legacy_status ──► book_statuses               │
//! │       │            failure logged, retried next startup                │
//! │       ▼                                                                 │
//! │  App continues startup                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every step is idempotent: running the whole sequence on an up-to-date
//! database changes nothing.
//!
//! ## Legacy Databases
//! Older databases kept a single status per book in `books.legacy_status`
//! (`my`, `in`/`in_progress`, `read`) and had no `is_favorite` column.

use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};

/// Step id of the legacy status backfill in `_migrations`.
const BACKFILL_STEP_ID: i64 = 1;
const BACKFILL_STEP_NAME: &str = "backfill_legacy_statuses";

/// Schema statements, run in order inside one transaction.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        external_user_id INTEGER NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS books (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_user_id INTEGER NOT NULL REFERENCES users(id),
        name TEXT NOT NULL,
        author TEXT NOT NULL,
        genre TEXT NOT NULL,
        photo_reference TEXT,
        is_favorite INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        legacy_status TEXT NOT NULL DEFAULT 'my'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS book_statuses (
        book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        UNIQUE (book_id, status)
    )
    "#,
    // No index touches is_favorite: on a legacy table the column does not
    // exist yet when this runs.
    "CREATE INDEX IF NOT EXISTS idx_books_owner ON books(owner_user_id)",
    "CREATE INDEX IF NOT EXISTS idx_books_recency ON books(created_at DESC, id DESC)",
    "CREATE INDEX IF NOT EXISTS idx_book_statuses_status ON book_statuses(status)",
    "CREATE INDEX IF NOT EXISTS idx_book_statuses_book ON book_statuses(book_id)",
    r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    )
    "#,
];

/// Runs the full startup sequence.
///
/// ## Failure Policy
/// - `ensure_schema` failing is fatal and returned
/// - The favorite column check and the backfill are best-effort: their
///   errors are logged and swallowed
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking database schema");

    ensure_schema(pool).await?;

    match ensure_favorite_column(pool).await {
        Ok(true) => info!("Added books.is_favorite column"),
        Ok(false) => debug!("books.is_favorite column present"),
        Err(e) => warn!(error = %e, "Favorite column check failed, continuing"),
    }

    match run_once(
        pool,
        BACKFILL_STEP_ID,
        BACKFILL_STEP_NAME,
        backfill_legacy_statuses(pool),
    )
    .await
    {
        Ok(Some(rows)) => info!(rows, "Backfilled legacy reading statuses"),
        Ok(None) => debug!("Legacy status backfill already applied"),
        Err(e) => warn!(error = %e, "Legacy status backfill failed, continuing"),
    }

    Ok(())
}

/// Creates every table and index that does not exist yet.
///
/// Never alters or drops anything already present.
pub async fn ensure_schema(pool: &SqlitePool) -> DbResult<()> {
    let mut tx = pool.begin().await?;

    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::MigrationFailed(e.to_string()))?;
    }

    tx.commit()
        .await
        .map_err(|e| DbError::MigrationFailed(e.to_string()))?;

    Ok(())
}

/// Adds `books.is_favorite` (default 0) when the table predates it.
///
/// ## Returns
/// * `Ok(true)` - The column was added
/// * `Ok(false)` - Already present
pub async fn ensure_favorite_column(pool: &SqlitePool) -> DbResult<bool> {
    let columns = sqlx::query("PRAGMA table_info(books)")
        .fetch_all(pool)
        .await?;

    let mut names = Vec::with_capacity(columns.len());
    for column in &columns {
        names.push(column.try_get::<String, _>("name")?);
    }

    if names.iter().any(|name| name == "is_favorite") {
        return Ok(false);
    }

    sqlx::query("ALTER TABLE books ADD COLUMN is_favorite INTEGER NOT NULL DEFAULT 0")
        .execute(pool)
        .await
        .map_err(|e| DbError::MigrationFailed(e.to_string()))?;

    Ok(true)
}

/// Copies single-column legacy statuses into `book_statuses`.
///
/// ## Mapping
/// ```text
///   legacy_status   →  book_statuses.status
///   'in'            →  'in_progress'
///   'in_progress'   →  'in_progress'
///   'read'          →  'read'
///   'my', other     →  (nothing)
/// ```
///
/// Books that already carry any status row are skipped, so a direct re-run
/// never gives a book both statuses. Returns the number of rows inserted.
pub async fn backfill_legacy_statuses(pool: &SqlitePool) -> DbResult<u64> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO book_statuses (book_id, status)
        SELECT b.id,
               CASE b.legacy_status WHEN 'read' THEN 'read' ELSE 'in_progress' END
        FROM books b
        WHERE b.legacy_status IN ('in', 'in_progress', 'read')
          AND NOT EXISTS (SELECT 1 FROM book_statuses s WHERE s.book_id = b.id)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Runs `step` unless `_migrations` says it already ran, then records it.
///
/// Returns `None` when skipped. A failed step is not recorded.
async fn run_once<T>(
    pool: &SqlitePool,
    id: i64,
    name: &str,
    step: impl std::future::Future<Output = DbResult<T>>,
) -> DbResult<Option<T>> {
    let applied: Option<i64> = sqlx::query_scalar("SELECT id FROM _migrations WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    if applied.is_some() {
        return Ok(None);
    }

    let output = step.await?;

    sqlx::query("INSERT OR IGNORE INTO _migrations (id, name) VALUES (?1, ?2)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await?;

    Ok(Some(output))
}

/// Names of the one-time steps already recorded, in application order.
///
/// For diagnostics and health checks.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<Vec<String>> {
    let names = sqlx::query_scalar("SELECT name FROM _migrations ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(names)
}

// =============================================================================
// Unit Tests
// =============================================================================
