//! # Repository Module
//!
//! Store access for Shelf, one repository per concern.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ActionHandler / CarouselController                                    │
//! │       │                                                                 │
//! │       │  db.books().nth_book_for_user(42, 3)                           │
//! │       ▼                                                                 │
//! │  UserRepository      ensure_user, get_user                             │
//! │  BookRepository      add, get, count, nth, list, delete                │
//! │  StatusRepository    toggle statuses + favorite, status/fav carousels  │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering
//! Every "nth" and "list" query orders by `created_at DESC, id DESC`: newest
//! first, and the later insert wins when two books share a timestamp. Counts
//! use the same filters as the matching "nth" query so a carousel's
//! `page/total` always agrees with what it shows.

pub mod book;
pub mod status;
pub mod user;

/// Columns selected for [`shelf_core::Book`], qualified with the `b` alias.
pub(crate) const BOOK_COLUMNS: &str = "b.id, b.owner_user_id, b.name, b.author, b.genre, \
     b.photo_reference, b.is_favorite, b.created_at";

/// Recency order shared by all carousels.
pub(crate) const RECENCY_ORDER: &str = "ORDER BY b.created_at DESC, b.id DESC";

/// SQLite counts are i64; carousels count in u32.
pub(crate) fn to_count(count: i64) -> u32 {
    u32::try_from(count.max(0)).unwrap_or(u32::MAX)
}
