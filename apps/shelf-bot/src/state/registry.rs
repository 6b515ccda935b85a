//! # Last-Rendered-View Registry
//!
//! Remembers, per user, the view the chat transport showed last, so the
//! next view can replace it instead of piling up new messages.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  outcome for user 42                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  next_view_id() ──► #7                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  record(42, #7) ──► returns #6 ──► transport replaces #6 with #7       │
//! │                                                                         │
//! │  forget(42)      ──► next view is sent fresh                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entries never expire and the reference is not checked against the
//! transport. A user who deleted the message just gets a fresh one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

/// Handle to a view shown to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ViewRef {
    pub view_id: u64,
}

/// Shared `user → last view` map.
///
/// Cloning is cheap and every clone sees the same map.
#[derive(Debug, Clone, Default)]
pub struct ViewRegistry {
    views: Arc<Mutex<HashMap<i64, ViewRef>>>,
    next_id: Arc<AtomicU64>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new view reference. Ids start at 1 and only grow.
    pub fn next_view(&self) -> ViewRef {
        ViewRef {
            view_id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
        }
    }

    /// Makes `view` the user's last view and returns the one it replaces.
    pub fn record(&self, external_user_id: i64, view: ViewRef) -> Option<ViewRef> {
        self.with_views(|views| views.insert(external_user_id, view))
    }

    /// The user's last view, if any.
    pub fn last(&self, external_user_id: i64) -> Option<ViewRef> {
        self.with_views(|views| views.get(&external_user_id).copied())
    }

    /// Drops the user's entry.
    pub fn forget(&self, external_user_id: i64) -> Option<ViewRef> {
        self.with_views(|views| views.remove(&external_user_id))
    }

    pub fn len(&self) -> usize {
        self.with_views(|views| views.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_views<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut HashMap<i64, ViewRef>) -> R,
    {
        // The map holds plain values, so a panicked holder can't leave it torn.
        let mut views = self.views.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_returns_replaced_view() {
        let registry = ViewRegistry::new();
        let first = registry.next_view();
        let second = registry.next_view();
        assert_eq!((first.view_id, second.view_id), (1, 2));

        assert_eq!(registry.record(42, first), None);
        assert_eq!(registry.record(42, second), Some(first));
        assert_eq!(registry.last(42), Some(second));
    }

    #[test]
    fn test_users_are_independent() {
        let registry = ViewRegistry::new();
        let a = registry.next_view();
        let b = registry.next_view();
        registry.record(1, a);
        registry.record(2, b);

        assert_eq!(registry.last(1), Some(a));
        assert_eq!(registry.last(2), Some(b));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_forget() {
        let registry = ViewRegistry::new();
        let view = registry.next_view();
        registry.record(7, view);

        assert_eq!(registry.forget(7), Some(view));
        assert_eq!(registry.last(7), None);
        assert!(registry.is_empty());
        assert_eq!(registry.forget(7), None);
    }

    #[test]
    fn test_clones_share_state() {
        let registry = ViewRegistry::new();
        let clone = registry.clone();
        let view = clone.next_view();
        clone.record(5, view);

        assert_eq!(registry.last(5), Some(view));
        assert_eq!(registry.next_view().view_id, 2);
    }

    #[test]
    fn test_concurrent_allocation_is_unique() {
        let registry = ViewRegistry::new();
        let handles: Vec<_> = (0..8)
            .map(|user| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    (0..50)
                        .map(|_| {
                            let view = registry.next_view();
                            registry.record(user, view);
                            view.view_id
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 400);
        assert_eq!(registry.len(), 8);
    }
}
