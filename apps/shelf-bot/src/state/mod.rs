//! # State Module
//!
//! Process-wide state the request loop shares across users.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────────────┐      ┌──────────────────────────────┐    │
//! │  │   Database (global)      │      │   ViewRegistry               │    │
//! │  │                          │      │                              │    │
//! │  │  OnceCell<Database>      │      │  Arc<Mutex<                  │    │
//! │  │  in shelf-db             │      │    HashMap<user, ViewRef>    │    │
//! │  │                          │      │  >>                          │    │
//! │  └──────────────────────────┘      └──────────────────────────────┘    │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Database: internal connection pool                                  │
//! │  • ViewRegistry: one short lock per record/last/forget                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod registry;

pub use registry::{ViewRef, ViewRegistry};
