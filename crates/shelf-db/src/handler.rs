//! # Action Handler
//!
//! Executes parsed actions against the store and reduces every result to an
//! [`Outcome`] the rendering collaborator can act on.
//!
//! ## Dispatch
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  payload ──► Request::from_payload ──► handle_request(user, request)   │
//! │                                              │                          │
//! │            Noop ◄────────── malformed ───────┤                          │
//! │                                              ▼                          │
//! │  Navigate        ──► CarouselController::navigate   ──► Carousel       │
//! │  ViewDetails     ──► CarouselController::details    ──► Details        │
//! │  ToggleStatus    ──► owner? ──► toggle + details     ──► StatusToggled  │
//! │  ToggleFavorite  ──► owner? ──► toggle + details     ──► FavoriteToggled│
//! │  Delete          ──► owner? ──► delete + after_delete ──► Deleted      │
//! │  AddBook         ──► validate ──► add_book           ──► BookAdded     │
//! │  ReturnToMenu    ────────────────────────────────────► Menu            │
//! │                                                                         │
//! │  DbError::NotFound ──► NotFound      any other DbError ──► Failed      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `handle` never returns an error. A failed store write leaves state as it
//! was and the collaborator shows a transient alert.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, error, warn};

use crate::carousel::{BookCard, BookDetails, CarouselController};
use crate::error::{DbError, DbResult};
use crate::repository::book::BookRepository;
use crate::repository::status::StatusRepository;
use shelf_core::validation::validate_new_book;
use shelf_core::{Action, BackRef, CarouselView, NewBook, ReadingStatus, Request};

/// Message carried by [`Outcome::Failed`].
pub const FAILED_MESSAGE: &str = "Something went wrong, please try again.";

/// What happened, in a form ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Malformed or explicit no-op request. Nothing to render.
    Noop,

    /// Show the top-level menu.
    Menu,

    Carousel { view: CarouselView<BookCard> },

    Details { details: BookDetails },

    /// The detail view, refreshed after the toggle.
    StatusToggled {
        status: ReadingStatus,
        active: bool,
        details: BookDetails,
    },

    FavoriteToggled { active: bool, details: BookDetails },

    /// `view` is the re-rendered carousel; `None` means go to the menu.
    Deleted {
        book_id: i64,
        view: Option<CarouselView<BookCard>>,
    },

    BookAdded { book_id: i64 },

    /// The book doesn't exist or isn't the acting user's to change.
    NotFound { book_id: Option<i64> },

    /// Add-book input was rejected; nothing was stored.
    Invalid { message: String },

    /// The store failed; nothing changed.
    Failed { message: String },
}

/// Dispatches actions for one acting user at a time.
#[derive(Debug, Clone)]
pub struct ActionHandler {
    books: BookRepository,
    statuses: StatusRepository,
    carousel: CarouselController,
}

impl ActionHandler {
    pub fn new(pool: SqlitePool) -> Self {
        ActionHandler {
            books: BookRepository::new(pool.clone()),
            statuses: StatusRepository::new(pool.clone()),
            carousel: CarouselController::new(pool),
        }
    }

    /// Handles a raw request; `Request::Noop` short-circuits.
    pub async fn handle_request(&self, external_user_id: i64, request: Request) -> Outcome {
        match request {
            Request::Action(action) => self.handle(external_user_id, action).await,
            Request::Noop => {
                debug!(external_user_id, "Ignoring no-op request");
                Outcome::Noop
            }
        }
    }

    /// Executes `action` on behalf of `external_user_id`.
    pub async fn handle(&self, external_user_id: i64, action: Action) -> Outcome {
        let book_id = action.book_id();
        debug!(external_user_id, ?action, "Handling action");

        match self.execute(external_user_id, action).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_not_found() => {
                debug!(external_user_id, ?book_id, "Book not found");
                Outcome::NotFound { book_id }
            }
            Err(e) => {
                error!(external_user_id, ?book_id, error = %e, "Action failed");
                Outcome::Failed {
                    message: FAILED_MESSAGE.to_string(),
                }
            }
        }
    }

    async fn execute(&self, external_user_id: i64, action: Action) -> DbResult<Outcome> {
        match action {
            Action::Navigate { scope, index } => {
                let view = self.carousel.navigate(scope, index, external_user_id).await?;
                Ok(Outcome::Carousel { view })
            }

            Action::ViewDetails { book_id, back } => {
                let details = self.details(book_id, back).await?;
                Ok(Outcome::Details { details })
            }

            Action::ToggleStatus { status, book_id } => {
                self.ensure_owner(book_id, external_user_id).await?;
                let active = self.statuses.toggle(book_id, status).await?;
                let details = self.details(book_id, None).await?;
                Ok(Outcome::StatusToggled {
                    status,
                    active,
                    details,
                })
            }

            Action::ToggleFavorite { book_id } => {
                self.ensure_owner(book_id, external_user_id).await?;
                let active = self.statuses.toggle_favorite(book_id).await?;
                let details = self.details(book_id, None).await?;
                Ok(Outcome::FavoriteToggled { active, details })
            }

            Action::Delete { book_id, back } => {
                self.ensure_owner(book_id, external_user_id).await?;
                if !self.books.delete_book(book_id).await? {
                    return Err(DbError::not_found("Book", book_id.to_string()));
                }

                let view = match back {
                    Some(BackRef { scope, index }) => {
                        match self.carousel.after_delete(scope, index, external_user_id).await {
                            Ok(view) => Some(view),
                            Err(e) => {
                                // The delete is committed; fall back to the menu.
                                warn!(book_id, error = %e, "Re-render after delete failed");
                                None
                            }
                        }
                    }
                    None => None,
                };

                Ok(Outcome::Deleted { book_id, view })
            }

            Action::AddBook {
                external_user_id: owner,
                book,
            } => self.add_book(external_user_id, owner, book).await,

            Action::ReturnToMenu => Ok(Outcome::Menu),
        }
    }

    async fn add_book(&self, acting_user: i64, owner: i64, book: NewBook) -> DbResult<Outcome> {
        if owner != acting_user {
            warn!(acting_user, owner, "Rejected add for another user");
            return Ok(Outcome::Invalid {
                message: "Books can only be added to your own shelf.".to_string(),
            });
        }

        let book = match validate_new_book(book) {
            Ok(book) => book,
            Err(e) => {
                debug!(acting_user, error = %e, "Rejected book input");
                return Ok(Outcome::Invalid {
                    message: e.to_string(),
                });
            }
        };

        let book_id = self.books.add_book(owner, &book).await?;
        Ok(Outcome::BookAdded { book_id })
    }

    async fn details(&self, book_id: i64, back: Option<BackRef>) -> DbResult<BookDetails> {
        self.carousel
            .details(book_id, back)
            .await?
            .ok_or_else(|| DbError::not_found("Book", book_id.to_string()))
    }

    /// Books owned by someone else are reported as absent.
    async fn ensure_owner(&self, book_id: i64, external_user_id: i64) -> DbResult<()> {
        match self.books.owner_external_id(book_id).await? {
            Some(owner) if owner == external_user_id => Ok(()),
            Some(owner) => {
                warn!(book_id, owner, external_user_id, "Mutation of another user's book");
                Err(DbError::not_found("Book", book_id.to_string()))
            }
            None => Err(DbError::not_found("Book", book_id.to_string())),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use shelf_core::{BackTarget, Scope, ValidationError};

    const ME: i64 = 100;
    const SOMEONE_ELSE: i64 = 200;

    async fn setup() -> (Database, ActionHandler) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let handler = db.handler();
        (db, handler)
    }

    async fn add(handler: &ActionHandler, user: i64, name: &str) -> i64 {
        let outcome = handler
            .handle(
                user,
                Action::AddBook {
                    external_user_id: user,
                    book: NewBook::new(name, "Author", "Genre"),
                },
            )
            .await;
        match outcome {
            Outcome::BookAdded { book_id } => book_id,
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    async fn press(handler: &ActionHandler, user: i64, payload: &str) -> Outcome {
        handler
            .handle_request(user, Request::from_payload(payload))
            .await
    }

    #[tokio::test]
    async fn test_malformed_payload_is_noop() {
        let (db, handler) = setup().await;
        add(&handler, ME, "Dune").await;

        assert_eq!(press(&handler, ME, "sttoggle:oops").await, Outcome::Noop);
        assert_eq!(press(&handler, ME, "noop").await, Outcome::Noop);
        assert_eq!(db.books().count_all().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_status_toggle_scenario() {
        let (_db, handler) = setup().await;
        let id = add(&handler, ME, "Dune").await;

        let outcome = press(&handler, ME, &format!("sttoggle:in:{id}")).await;
        let Outcome::StatusToggled { active, details, .. } = outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert!(active);
        assert_eq!(details.card.statuses, vec![ReadingStatus::InProgress]);

        let outcome = press(&handler, ME, &format!("sttoggle:read:{id}")).await;
        let Outcome::StatusToggled { active, details, .. } = outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert!(active);
        assert_eq!(details.card.statuses, vec![ReadingStatus::Read]);

        let outcome = press(&handler, ME, &format!("sttoggle:read:{id}")).await;
        let Outcome::StatusToggled { active, details, .. } = outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert!(!active);
        assert!(details.card.statuses.is_empty());
        assert_eq!(details.back, BackTarget::Menu);
    }

    #[tokio::test]
    async fn test_favorite_toggle() {
        let (_db, handler) = setup().await;
        let id = add(&handler, ME, "Dune").await;

        let outcome = press(&handler, ME, &format!("favtoggle:{id}")).await;
        assert!(matches!(outcome, Outcome::FavoriteToggled { active: true, .. }));

        let outcome = press(&handler, ME, &format!("favtoggle:{id}")).await;
        assert!(matches!(outcome, Outcome::FavoriteToggled { active: false, .. }));
    }

    #[tokio::test]
    async fn test_missing_book() {
        let (_db, handler) = setup().await;

        for payload in ["book:404", "sttoggle:read:404", "favtoggle:404", "delete:404:lib:0"] {
            assert_eq!(
                press(&handler, ME, payload).await,
                Outcome::NotFound { book_id: Some(404) },
                "payload {payload}"
            );
        }
    }

    #[tokio::test]
    async fn test_other_users_books_cannot_be_changed() {
        let (db, handler) = setup().await;
        let theirs = add(&handler, SOMEONE_ELSE, "Theirs").await;

        for payload in [
            format!("sttoggle:read:{theirs}"),
            format!("favtoggle:{theirs}"),
            format!("delete:{theirs}"),
        ] {
            assert_eq!(
                press(&handler, ME, &payload).await,
                Outcome::NotFound { book_id: Some(theirs) }
            );
        }

        let book = db.books().get_book(theirs).await.unwrap().unwrap();
        assert!(!book.is_favorite);
        assert!(db.statuses().list_statuses(theirs).await.unwrap().is_empty());

        // Viewing stays possible: the library is shared.
        assert!(matches!(
            press(&handler, ME, &format!("book:{theirs}:lib:0")).await,
            Outcome::Details { .. }
        ));
    }

    #[tokio::test]
    async fn test_delete_rerenders_scope() {
        let (db, handler) = setup().await;
        let b1 = add(&handler, ME, "B1").await;
        let b2 = add(&handler, ME, "B2").await;
        sqlx::query("UPDATE books SET created_at = '2030-01-01T00:00:00.000Z' WHERE id = ?1")
            .bind(b1)
            .execute(db.pool())
            .await
            .unwrap();

        let outcome = press(&handler, ME, &format!("delete:{b1}:lib:0")).await;
        let Outcome::Deleted { book_id, view: Some(view) } = outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert_eq!(book_id, b1);
        let page = view.page().unwrap();
        assert_eq!((page.index, page.total), (0, 1));
        assert_eq!(page.item.book.id, b2);

        assert!(db.books().get_book(b1).await.unwrap().is_none());
        assert!(db.statuses().list_statuses(b1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_without_context_returns_to_menu() {
        let (_db, handler) = setup().await;
        let id = add(&handler, ME, "Dune").await;

        assert_eq!(
            press(&handler, ME, &format!("delete:{id}")).await,
            Outcome::Deleted { book_id: id, view: None }
        );
    }

    #[tokio::test]
    async fn test_add_book_validation() {
        let (db, handler) = setup().await;

        let outcome = handler
            .handle(
                ME,
                Action::AddBook {
                    external_user_id: ME,
                    book: NewBook::new("  ", "Herbert", "SciFi"),
                },
            )
            .await;
        // The validation message reaches the caller as-is.
        let required = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(
            outcome,
            Outcome::Invalid {
                message: required.to_string()
            }
        );

        let outcome = handler
            .handle(
                ME,
                Action::AddBook {
                    external_user_id: SOMEONE_ELSE,
                    book: NewBook::new("Dune", "Herbert", "SciFi"),
                },
            )
            .await;
        assert!(matches!(outcome, Outcome::Invalid { .. }));

        assert_eq!(db.books().count_all().await.unwrap(), 0);
        assert!(db.users().get_user(ME).await.unwrap().is_none());

        let id = add(&handler, ME, "  Dune ").await;
        assert_eq!(db.books().get_book(id).await.unwrap().unwrap().name, "Dune");
    }

    #[tokio::test]
    async fn test_navigation_and_menu() {
        let (_db, handler) = setup().await;
        add(&handler, ME, "Dune").await;

        let outcome = press(&handler, ME, "book_list").await;
        let Outcome::Carousel { view } = outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert_eq!(view.item().unwrap().book.name, "Dune");

        let outcome = press(&handler, ME, "favorite_books").await;
        assert!(matches!(outcome, Outcome::Carousel { view } if view.is_empty()));

        let outcome = press(&handler, ME, &format!("{}:-1", Scope::Library.code())).await;
        assert!(matches!(outcome, Outcome::Carousel { view } if view.page().is_some_and(|p| p.index == 0)));

        assert_eq!(press(&handler, ME, "back_main").await, Outcome::Menu);
    }

    #[tokio::test]
    async fn test_store_failure_is_reported_not_raised() {
        let (db, handler) = setup().await;
        let id = add(&handler, ME, "Dune").await;

        db.close().await;

        assert_eq!(
            press(&handler, ME, &format!("favtoggle:{id}")).await,
            Outcome::Failed {
                message: FAILED_MESSAGE.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_outcome_serializes_tagged() {
        let (_db, handler) = setup().await;
        let id = add(&handler, ME, "Dune").await;

        let outcome = press(&handler, ME, &format!("book:{id}:fav:2")).await;
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "details");
        assert_eq!(json["details"]["name"], "Dune");
        assert_eq!(json["details"]["back"]["kind"], "carousel");
        assert_eq!(json["details"]["back"]["scope"], "favorites");
        assert_eq!(json["details"]["back"]["index"], 2);
    }
}
