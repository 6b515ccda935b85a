//! # shelf-db: Database Layer for Shelf
//!
//! Everything that touches the store: the shared connection, schema
//! upgrades, repositories, the carousel controller and the action handler.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shelf Data Flow                                  │
//! │                                                                         │
//! │  Chat transport (shelf-bot)                                            │
//! │       │  (external_user_id, Request)                                   │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     shelf-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ActionHandler ──► CarouselController                          │   │
//! │  │        │                    │                                   │   │
//! │  │        ▼                    ▼                                   │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │◄───│ User / Book / │    │  (runtime)   │   │   │
//! │  │   │  shared pool  │    │ Status        │    │              │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL)                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, pragmas and the process-wide handle
//! - [`migrations`] - Schema creation and legacy upgrades
//! - [`error`] - Database error types
//! - [`repository`] - User, book and status repositories
//! - [`carousel`] - Scope/index rendering
//! - [`handler`] - Action dispatch
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shelf_db::{Database, DbConfig};
//! use shelf_core::Request;
//!
//! let db = Database::connect_global(DbConfig::new("books.db")).await?;
//! let outcome = db.handler().handle_request(42, Request::from_payload("lib:0")).await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod carousel;
pub mod error;
pub mod handler;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use carousel::{BookCard, BookDetails, CarouselController};
pub use error::{DbError, DbResult};
pub use handler::{ActionHandler, Outcome};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::book::BookRepository;
pub use repository::status::StatusRepository;
pub use repository::user::UserRepository;
