//! # Carousel Controller
//!
//! Maps `(scope, index, acting user)` to something the collaborator renders.
//!
//! ## Render Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  navigate(Favorites, -1, user 42)                                      │
//! │       │                                                                 │
//! │       ▼  clamp                                                          │
//! │  render(Favorites, 0, 42)                                              │
//! │       │                                                                 │
//! │       ├── count_user_favorites(42)      → total                        │
//! │       ├── nth_user_favorite(42, 0)      → book?                        │
//! │       └── list_statuses(book.id)        → statuses                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CarouselView::Page { item, page 1/total, arrows }                     │
//! │  or CarouselView::Empty { "You have no favorite books yet." }          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is remembered between calls. Each render reads the store fresh,
//! so a view always reflects the latest committed state.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::book::BookRepository;
use crate::repository::status::StatusRepository;
use shelf_core::carousel::{clamp_requested_index, reconcile_index};
use shelf_core::{BackRef, BackTarget, Book, CarouselView, ReadingStatus, Scope};

/// A book with its active statuses, as shown on a carousel page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookCard {
    #[serde(flatten)]
    pub book: Book,
    pub statuses: Vec<ReadingStatus>,
}

/// A single-book detail view and where its back control leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookDetails {
    #[serde(flatten)]
    pub card: BookCard,
    pub back: BackTarget,
}

/// Stateless carousel reads over the repositories.
#[derive(Debug, Clone)]
pub struct CarouselController {
    books: BookRepository,
    statuses: StatusRepository,
}

impl CarouselController {
    pub fn new(pool: SqlitePool) -> Self {
        CarouselController {
            books: BookRepository::new(pool.clone()),
            statuses: StatusRepository::new(pool),
        }
    }

    /// Size of `scope`'s collection as seen by `external_user_id`.
    pub async fn count(&self, scope: Scope, external_user_id: i64) -> DbResult<u32> {
        match scope {
            Scope::Library => self.books.count_all().await,
            Scope::Status(status) => {
                self.statuses
                    .count_for_user_by_status(external_user_id, status)
                    .await
            }
            Scope::Favorites => self.statuses.count_user_favorites(external_user_id).await,
        }
    }

    /// Book at `index` in `scope`'s collection; `None` outside `[0, count)`.
    pub async fn nth(
        &self,
        scope: Scope,
        external_user_id: i64,
        index: u32,
    ) -> DbResult<Option<Book>> {
        match scope {
            Scope::Library => self.books.nth_book_overall(index).await,
            Scope::Status(status) => {
                self.statuses
                    .nth_book_for_user_by_status(external_user_id, status, index)
                    .await
            }
            Scope::Favorites => self.statuses.nth_user_favorite(external_user_id, index).await,
        }
    }

    /// Renders `scope` at `index`.
    ///
    /// An empty collection, or an index at or past the end, yields the
    /// scope's empty state rather than an error.
    pub async fn render(
        &self,
        scope: Scope,
        index: u32,
        external_user_id: i64,
    ) -> DbResult<CarouselView<BookCard>> {
        let total = self.count(scope, external_user_id).await?;
        if total == 0 || index >= total {
            debug!(%scope, index, total, "Rendering empty carousel");
            return Ok(CarouselView::empty(scope));
        }

        let item = match self.nth(scope, external_user_id, index).await? {
            Some(book) => Some(self.card(book).await?),
            None => None,
        };

        debug!(%scope, index, total, found = item.is_some(), "Rendered carousel");
        Ok(CarouselView::assemble(scope, index, total, item))
    }

    /// Handles a navigation request. Negative indices land on the first item.
    pub async fn navigate(
        &self,
        scope: Scope,
        requested_index: i64,
        external_user_id: i64,
    ) -> DbResult<CarouselView<BookCard>> {
        self.render(scope, clamp_requested_index(requested_index), external_user_id)
            .await
    }

    /// Re-renders `scope` after a delete made at `old_index`.
    ///
    /// Stays on the same index if it still exists, otherwise moves to the new
    /// last item, and falls back to the empty state when nothing is left.
    pub async fn after_delete(
        &self,
        scope: Scope,
        old_index: u32,
        external_user_id: i64,
    ) -> DbResult<CarouselView<BookCard>> {
        let total = self.count(scope, external_user_id).await?;
        let index = reconcile_index(old_index, total);
        debug!(%scope, old_index, index, total, "Reconciled index after delete");
        self.render(scope, index, external_user_id).await
    }

    /// The detail view of one book, or `None` if it doesn't exist.
    pub async fn details(&self, book_id: i64, back: Option<BackRef>) -> DbResult<Option<BookDetails>> {
        let Some(book) = self.books.get_book(book_id).await? else {
            return Ok(None);
        };

        Ok(Some(BookDetails {
            card: self.card(book).await?,
            back: BackTarget::from(back),
        }))
    }

    async fn card(&self, book: Book) -> DbResult<BookCard> {
        let statuses = self.statuses.list_statuses(book.id).await?;
        Ok(BookCard { book, statuses })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
