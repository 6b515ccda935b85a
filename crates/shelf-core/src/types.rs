//! # Domain Types
//!
//! Core domain types used throughout Shelf.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │      Book       │   │  ReadingStatus  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│  owner_user_id  │   │  InProgress     │       │
//! │  │  external_id    │   │  name, author   │   │  Read           │       │
//! │  └─────────────────┘   │  genre, photo   │   └─────────────────┘       │
//! │                        │  is_favorite    │                              │
//! │                        │  created_at     │   ┌─────────────────┐       │
//! │                        └─────────────────┘   │      Scope      │       │
//! │                                              │  ─────────────  │       │
//! │                                              │  Library        │       │
//! │                                              │  Status(..)     │       │
//! │                                              │  Favorites      │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity
//! A user has a store id (`id`, used by foreign keys) and the chat platform's
//! id (`external_user_id`, what every incoming request carries).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// =============================================================================
// User
// =============================================================================

/// A chat user. Created on first interaction, never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    /// Store identifier.
    pub id: i64,

    /// Identifier assigned by the chat platform.
    pub external_user_id: i64,
}

// =============================================================================
// Book
// =============================================================================

/// A book record owned by exactly one user.
///
/// Name, author and genre are fixed at creation; only `is_favorite` is ever
/// updated in place. Reading statuses live in their own table and are not
/// part of this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Book {
    pub id: i64,

    /// Store id of the owning [`User`].
    pub owner_user_id: i64,

    pub name: String,
    pub author: String,
    pub genre: String,

    /// Opaque reference to a photo held by the chat platform.
    pub photo_reference: Option<String>,

    pub is_favorite: bool,

    /// Fixes the recency order of every carousel (newest first, id breaks ties).
    pub created_at: DateTime<Utc>,
}

/// Input for a new book, as produced by the collaborator's "add book" wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub name: String,
    pub author: String,
    pub genre: String,
    #[serde(default)]
    pub photo_reference: Option<String>,
}

impl NewBook {
    /// Creates a new book input without a photo.
    pub fn new(
        name: impl Into<String>,
        author: impl Into<String>,
        genre: impl Into<String>,
    ) -> Self {
        NewBook {
            name: name.into(),
            author: author.into(),
            genre: genre.into(),
            photo_reference: None,
        }
    }

    /// Attaches a photo reference.
    pub fn with_photo(mut self, photo_reference: impl Into<String>) -> Self {
        self.photo_reference = Some(photo_reference.into());
        self
    }
}

// =============================================================================
// Reading Status
// =============================================================================

/// The two mutually exclusive reading statuses.
///
/// ## Exclusivity
/// ```text
///   none ──toggle(InProgress)──► {in_progress}
///   {in_progress} ──toggle(Read)──► {read}          (opposite removed)
///   {read} ──toggle(Read)──► none
/// ```
/// At most one of the two is active for a book at any time. The schema would
/// allow both; the toggle engine in shelf-db is what guarantees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    /// "Want to read".
    InProgress,
    /// Finished.
    Read,
}

impl ReadingStatus {
    /// All statuses, in the lexicographic order of their stored form.
    pub const ALL: [ReadingStatus; 2] = [ReadingStatus::InProgress, ReadingStatus::Read];

    /// Value stored in `book_statuses.status`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::InProgress => "in_progress",
            ReadingStatus::Read => "read",
        }
    }

    /// Short code used in action payloads.
    pub const fn code(&self) -> &'static str {
        match self {
            ReadingStatus::InProgress => "in",
            ReadingStatus::Read => "read",
        }
    }

    /// The status that must be cleared when this one is set.
    pub const fn opposite(&self) -> ReadingStatus {
        match self {
            ReadingStatus::InProgress => ReadingStatus::Read,
            ReadingStatus::Read => ReadingStatus::InProgress,
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingStatus {
    type Err = CoreError;

    /// Accepts the stored form, the payload code, and the legacy `in` code
    /// written by older databases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" | "in" => Ok(ReadingStatus::InProgress),
            "read" => Ok(ReadingStatus::Read),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

// =============================================================================
// Scope
// =============================================================================

/// The filter that defines a carousel's collection.
///
/// `Library` spans every book in the store; the other scopes only cover the
/// acting user's books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Library,
    Status(ReadingStatus),
    Favorites,
}

impl Scope {
    /// Every scope a carousel can be opened on.
    pub const ALL: [Scope; 4] = [
        Scope::Library,
        Scope::Status(ReadingStatus::InProgress),
        Scope::Status(ReadingStatus::Read),
        Scope::Favorites,
    ];

    /// Short code used in action payloads.
    pub const fn code(&self) -> &'static str {
        match self {
            Scope::Library => "lib",
            Scope::Status(ReadingStatus::InProgress) => "in",
            Scope::Status(ReadingStatus::Read) => "read",
            Scope::Favorites => "fav",
        }
    }

    /// Parses a payload code (`lib`, `in`, `read`, `fav`).
    pub fn from_code(code: &str) -> Option<Scope> {
        match code {
            "lib" => Some(Scope::Library),
            "in" => Some(Scope::Status(ReadingStatus::InProgress)),
            "read" => Some(Scope::Status(ReadingStatus::Read)),
            "fav" => Some(Scope::Favorites),
            _ => None,
        }
    }

    /// Whether the collection is restricted to the acting user's books.
    pub const fn is_owner_filtered(&self) -> bool {
        !matches!(self, Scope::Library)
    }

    /// Label shown when the collection has nothing to display.
    pub const fn empty_label(&self) -> &'static str {
        match self {
            Scope::Library => "Nothing found.",
            Scope::Status(_) => "You have no books here yet.",
            Scope::Favorites => "You have no favorite books yet.",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Library => f.write_str("library"),
            Scope::Status(status) => write!(f, "status:{}", status.as_str()),
            Scope::Favorites => f.write_str("favorites"),
        }
    }
}

impl FromStr for Scope {
    type Err = CoreError;

    /// Accepts both the display form (`status:read`) and payload codes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(scope) = Scope::from_code(s) {
            return Ok(scope);
        }
        match s {
            "library" => Ok(Scope::Library),
            "favorites" => Ok(Scope::Favorites),
            other => match other.strip_prefix("status:") {
                Some(status) => status
                    .parse()
                    .map(Scope::Status)
                    .map_err(|_| CoreError::UnknownScope(other.to_string())),
                None => Err(CoreError::UnknownScope(other.to_string())),
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_opposites() {
        assert_eq!(ReadingStatus::InProgress.opposite(), ReadingStatus::Read);
        assert_eq!(ReadingStatus::Read.opposite(), ReadingStatus::InProgress);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("in_progress".parse::<ReadingStatus>().unwrap(), ReadingStatus::InProgress);
        assert_eq!("in".parse::<ReadingStatus>().unwrap(), ReadingStatus::InProgress);
        assert_eq!("read".parse::<ReadingStatus>().unwrap(), ReadingStatus::Read);
        assert!("my".parse::<ReadingStatus>().is_err());
        assert!("".parse::<ReadingStatus>().is_err());
    }

    #[test]
    fn test_status_order_matches_stored_strings() {
        let mut stored: Vec<&str> = ReadingStatus::ALL.iter().map(|s| s.as_str()).collect();
        stored.sort();
        let expected: Vec<&str> = ReadingStatus::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(stored, expected);
    }

    #[test]
    fn test_scope_codes_round_trip() {
        for scope in Scope::ALL {
            assert_eq!(Scope::from_code(scope.code()), Some(scope));
            assert_eq!(scope.to_string().parse::<Scope>().unwrap(), scope);
        }
        assert_eq!(Scope::from_code("my"), None);
    }

    #[test]
    fn test_scope_parse_rejects_unknown() {
        assert!("status:paused".parse::<Scope>().is_err());
        assert!("shelf".parse::<Scope>().is_err());
    }

    #[test]
    fn test_only_library_spans_all_users() {
        assert!(!Scope::Library.is_owner_filtered());
        assert!(Scope::Favorites.is_owner_filtered());
        assert!(Scope::Status(ReadingStatus::Read).is_owner_filtered());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&ReadingStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
