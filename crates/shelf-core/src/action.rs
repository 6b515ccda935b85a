//! # Action Requests
//!
//! The tagged request type every user interaction is turned into.
//!
//! ## Payload Codec
//! The rendering collaborator attaches a short payload string to each button
//! and hands it back verbatim when the button is pressed. Payloads are parsed
//! exactly once, here; nothing downstream looks at the string again.
//!
//! ```text
//! ┌──────────────────────────────────┬──────────────────────────────────────┐
//! │ Payload                          │ Action                               │
//! ├──────────────────────────────────┼──────────────────────────────────────┤
//! │ book_list, library_open          │ Navigate(Library, 0)                 │
//! │ in_process / read_books          │ Navigate(Status(..), 0)              │
//! │ favorite_books                   │ Navigate(Favorites, 0)               │
//! │ lib:<i>  in:<i>  read:<i> fav:<i>│ Navigate(scope, i)                   │
//! │ my:<anything>                    │ Navigate(Library, 0)   (retired)     │
//! │ book:<id>[:<scope>:<i>]          │ ViewDetails(id, back?)               │
//! │ sttoggle:<status>:<id>           │ ToggleStatus(status, id)             │
//! │ favtoggle:<id>                   │ ToggleFavorite(id)                   │
//! │ delete:<id>[:<scope>[:<i>]]      │ Delete(id, back?)                    │
//! │ back_main                        │ ReturnToMenu                         │
//! │ noop, anything else              │ (no action)                          │
//! └──────────────────────────────────┴──────────────────────────────────────┘
//! ```
//!
//! `AddBook` has no payload form; the wizard builds it directly.

use serde::{Deserialize, Serialize};

use crate::types::{NewBook, ReadingStatus, Scope};

/// Carousel position a detail view returns to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackRef {
    pub scope: Scope,
    pub index: u32,
}

impl BackRef {
    pub fn new(scope: Scope, index: u32) -> Self {
        BackRef { scope, index }
    }
}

/// A parsed user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Show `scope` at `index`. Negative indices are clamped by the controller.
    Navigate { scope: Scope, index: i64 },

    /// Open a single book, remembering where to return to.
    ViewDetails { book_id: i64, back: Option<BackRef> },

    /// Flip one reading status of a book.
    ToggleStatus { status: ReadingStatus, book_id: i64 },

    /// Flip the favorite flag of a book.
    ToggleFavorite { book_id: i64 },

    /// Delete a book; `back` is the carousel to re-render afterwards.
    Delete { book_id: i64, back: Option<BackRef> },

    /// Store a book collected by the input wizard.
    AddBook { external_user_id: i64, book: NewBook },

    /// Go back to the top-level menu.
    ReturnToMenu,
}

impl Action {
    /// Parses a button payload.
    ///
    /// Returns `None` for anything malformed or for the explicit `noop`
    /// payload; callers treat both as "do nothing".
    pub fn parse(payload: &str) -> Option<Action> {
        let payload = payload.trim();

        let menu_entry = match payload {
            "book_list" | "library_open" => Some(Scope::Library),
            "in_process" => Some(Scope::Status(ReadingStatus::InProgress)),
            "read_books" => Some(Scope::Status(ReadingStatus::Read)),
            "favorite_books" => Some(Scope::Favorites),
            _ => None,
        };
        if let Some(scope) = menu_entry {
            return Some(Action::Navigate { scope, index: 0 });
        }
        if payload == "back_main" {
            return Some(Action::ReturnToMenu);
        }

        let (tag, rest) = payload.split_once(':')?;
        match tag {
            "lib" | "in" | "read" | "fav" => {
                let scope = Scope::from_code(tag)?;
                let index = rest.parse::<i64>().ok()?;
                Some(Action::Navigate { scope, index })
            }
            // The "my books" view was folded into the library.
            "my" => Some(Action::Navigate {
                scope: Scope::Library,
                index: 0,
            }),
            "book" => {
                let mut parts = rest.split(':');
                let book_id = parts.next()?.parse::<i64>().ok()?;
                let back = match (parts.next(), parts.next()) {
                    (Some(scope), Some(index)) => Some(parse_back_ref(scope, Some(index))?),
                    _ => None,
                };
                Some(Action::ViewDetails { book_id, back })
            }
            "sttoggle" => {
                let (status, book_id) = rest.split_once(':')?;
                let status = status.parse::<ReadingStatus>().ok()?;
                let book_id = book_id.parse::<i64>().ok()?;
                Some(Action::ToggleStatus { status, book_id })
            }
            "favtoggle" => {
                let book_id = rest.parse::<i64>().ok()?;
                Some(Action::ToggleFavorite { book_id })
            }
            "delete" => {
                let mut parts = rest.split(':');
                let book_id = parts.next()?.parse::<i64>().ok()?;
                let back = match parts.next() {
                    Some(scope) => Some(parse_back_ref(scope, parts.next())?),
                    None => None,
                };
                Some(Action::Delete { book_id, back })
            }
            _ => None,
        }
    }

    /// Encodes the action as a button payload.
    ///
    /// `AddBook` has no payload form and yields `None`.
    pub fn to_payload(&self) -> Option<String> {
        let payload = match self {
            Action::Navigate { scope, index } => format!("{}:{}", scope.code(), index),
            Action::ViewDetails { book_id, back } => match back {
                Some(back) => format!("book:{}:{}:{}", book_id, back.scope.code(), back.index),
                None => format!("book:{}", book_id),
            },
            Action::ToggleStatus { status, book_id } => {
                format!("sttoggle:{}:{}", status.code(), book_id)
            }
            Action::ToggleFavorite { book_id } => format!("favtoggle:{}", book_id),
            Action::Delete { book_id, back } => match back {
                Some(back) => format!("delete:{}:{}:{}", book_id, back.scope.code(), back.index),
                None => format!("delete:{}", book_id),
            },
            Action::AddBook { .. } => return None,
            Action::ReturnToMenu => "back_main".to_string(),
        };
        Some(payload)
    }

    /// Book the action refers to, if any.
    pub fn book_id(&self) -> Option<i64> {
        match self {
            Action::ViewDetails { book_id, .. }
            | Action::ToggleStatus { book_id, .. }
            | Action::ToggleFavorite { book_id }
            | Action::Delete { book_id, .. } => Some(*book_id),
            _ => None,
        }
    }
}

/// `index` missing means position 0; a negative index is clamped to 0.
fn parse_back_ref(scope: &str, index: Option<&str>) -> Option<BackRef> {
    let scope = Scope::from_code(scope)?;
    let index = match index {
        Some(raw) => raw.parse::<i64>().ok()?,
        None => 0,
    };
    Some(BackRef {
        scope,
        index: crate::carousel::clamp_requested_index(index),
    })
}

// =============================================================================
// Request
// =============================================================================

/// What arrives at the core: either an action, or nothing to do.
///
/// Malformed payloads become [`Request::Noop`] and never reach the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Action(Action),
    Noop,
}

impl Request {
    pub fn from_payload(payload: &str) -> Self {
        match Action::parse(payload) {
            Some(action) => Request::Action(action),
            None => Request::Noop,
        }
    }
}

impl From<Action> for Request {
    fn from(action: Action) -> Self {
        Request::Action(action)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_entries_open_first_page() {
        assert_eq!(
            Action::parse("book_list"),
            Some(Action::Navigate { scope: Scope::Library, index: 0 })
        );
        assert_eq!(
            Action::parse("read_books"),
            Some(Action::Navigate {
                scope: Scope::Status(ReadingStatus::Read),
                index: 0
            })
        );
        assert_eq!(
            Action::parse("favorite_books"),
            Some(Action::Navigate { scope: Scope::Favorites, index: 0 })
        );
        assert_eq!(Action::parse("back_main"), Some(Action::ReturnToMenu));
    }

    #[test]
    fn test_navigation_keeps_negative_index() {
        // Clamping is the controller's job; the parser preserves the request.
        assert_eq!(
            Action::parse("fav:-1"),
            Some(Action::Navigate { scope: Scope::Favorites, index: -1 })
        );
    }

    #[test]
    fn test_retired_my_route_goes_to_library() {
        assert_eq!(
            Action::parse("my:7"),
            Some(Action::Navigate { scope: Scope::Library, index: 0 })
        );
    }

    #[test]
    fn test_details_with_and_without_back_context() {
        assert_eq!(
            Action::parse("book:12"),
            Some(Action::ViewDetails { book_id: 12, back: None })
        );
        assert_eq!(
            Action::parse("book:12:in:3"),
            Some(Action::ViewDetails {
                book_id: 12,
                back: Some(BackRef::new(Scope::Status(ReadingStatus::InProgress), 3)),
            })
        );
        // Scope without index is not enough context to return to.
        assert_eq!(
            Action::parse("book:12:lib"),
            Some(Action::ViewDetails { book_id: 12, back: None })
        );
    }

    #[test]
    fn test_delete_defaults_index_to_zero() {
        assert_eq!(
            Action::parse("delete:4:fav"),
            Some(Action::Delete {
                book_id: 4,
                back: Some(BackRef::new(Scope::Favorites, 0)),
            })
        );
        assert_eq!(
            Action::parse("delete:4"),
            Some(Action::Delete { book_id: 4, back: None })
        );
    }

    #[test]
    fn test_toggles() {
        assert_eq!(
            Action::parse("sttoggle:in:9"),
            Some(Action::ToggleStatus {
                status: ReadingStatus::InProgress,
                book_id: 9
            })
        );
        assert_eq!(
            Action::parse("sttoggle:in_progress:9"),
            Some(Action::ToggleStatus {
                status: ReadingStatus::InProgress,
                book_id: 9
            })
        );
        assert_eq!(
            Action::parse("favtoggle:9"),
            Some(Action::ToggleFavorite { book_id: 9 })
        );
    }

    #[test]
    fn test_malformed_payloads_are_noops() {
        for payload in [
            "",
            "noop",
            "lib:",
            "lib:abc",
            "book:",
            "book:x:lib:0",
            "book:1:shelf:0",
            "sttoggle:paused:3",
            "sttoggle:read",
            "favtoggle:",
            "delete:abc",
            "delete:1:nowhere",
            "explode:1",
        ] {
            assert_eq!(Request::from_payload(payload), Request::Noop, "payload {payload:?}");
        }
    }

    #[test]
    fn test_payload_encoding_parses_back() {
        let actions = [
            Action::Navigate { scope: Scope::Status(ReadingStatus::Read), index: 5 },
            Action::ViewDetails {
                book_id: 3,
                back: Some(BackRef::new(Scope::Favorites, 2)),
            },
            Action::ToggleStatus { status: ReadingStatus::InProgress, book_id: 3 },
            Action::ToggleFavorite { book_id: 3 },
            Action::Delete { book_id: 3, back: Some(BackRef::new(Scope::Library, 0)) },
            Action::ReturnToMenu,
        ];
        for action in actions {
            let payload = action.to_payload().unwrap();
            assert_eq!(Action::parse(&payload), Some(action));
        }
    }

    #[test]
    fn test_add_book_has_no_payload() {
        let action = Action::AddBook {
            external_user_id: 1,
            book: NewBook::new("Dune", "Herbert", "SciFi"),
        };
        assert_eq!(action.to_payload(), None);
        assert_eq!(action.book_id(), None);
    }
}
