//! # shelf-core: Pure Domain Logic for Shelf
//!
//! Shelf is a personal book-tracking catalog driven through a chat
//! request/response interface. This crate holds everything about it that
//! does not touch the store.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Shelf Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Rendering collaborator (chat transport)            │   │
//! │  │      bubbles, photos, keyboards, the "add book" wizard          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ payload strings / NewBook             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shelf-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  action   │  │ carousel  │  │ validation│  │   │
//! │  │   │   Book    │  │  Action   │  │  clamp    │  │  NewBook  │  │   │
//! │  │   │   Scope   │  │  Request  │  │  reconcile│  │  rules    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    shelf-db (Database Layer)                    │   │
//! │  │      schema, repositories, status toggles, carousel reads       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (User, Book, ReadingStatus, Scope)
//! - [`action`] - Tagged action requests and their payload codec
//! - [`carousel`] - Index clamping, page flags, delete reconciliation
//! - [`validation`] - Input rules for new books
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use shelf_core::{Action, Scope};
//!
//! // Payloads are parsed once at the boundary
//! let action = Action::parse("lib:2").unwrap();
//! assert_eq!(action, Action::Navigate { scope: Scope::Library, index: 2 });
//!
//! // and encoded back when the collaborator builds buttons
//! assert_eq!(action.to_payload().as_deref(), Some("lib:2"));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod action;
pub mod carousel;
pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use action::{Action, BackRef, Request};
pub use carousel::{BackTarget, CarouselPage, CarouselView};
pub use error::{CoreError, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length (in characters) of a book's name, author or genre.
///
/// Chat clients cap a single message well above this, but a carousel caption
/// has to fit the header, counters and three fields together.
pub const MAX_FIELD_CHARS: usize = 256;

/// Maximum length of a stored photo reference.
pub const MAX_PHOTO_REFERENCE_CHARS: usize = 512;
