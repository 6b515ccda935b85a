//! # Carousel Math
//!
//! Pure index arithmetic behind every paginated single-item view.
//!
//! A carousel addresses one item of a recency-ordered collection by 0-based
//! index. No position is ever stored server-side: each render re-reads the
//! count and the item, and the functions here turn those two reads into the
//! payload the collaborator renders.
//!
//! ```text
//!   index:      0        1        2
//!             ┌────┐   ┌────┐   ┌────┐
//!             │ B3 │   │ B2 │   │ B1 │      newest first
//!             └────┘   └────┘   └────┘
//!   page:      1/3      2/3      3/3
//!   left:      no       yes      yes
//!   right:     yes      yes      no
//! ```

use serde::Serialize;

use crate::action::BackRef;
use crate::types::Scope;

/// Clamps a requested (possibly negative) index into the valid `u32` range.
///
/// Navigating past the left bound lands on the first item instead of failing.
pub fn clamp_requested_index(requested: i64) -> u32 {
    requested.clamp(0, i64::from(u32::MAX)) as u32
}

/// Position to show after the collection shrank to `new_total` items.
///
/// Stays on the same index when it still exists, otherwise moves to the last
/// item; an empty collection maps to 0 (which then renders as empty).
pub fn reconcile_index(old_index: u32, new_total: u32) -> u32 {
    old_index.min(new_total.saturating_sub(1))
}

// =============================================================================
// Views
// =============================================================================

/// One rendered carousel position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarouselPage<T> {
    pub scope: Scope,
    pub item: T,
    /// 0-based position.
    pub index: u32,
    /// 1-based position for display (`page/total`).
    pub page: u32,
    pub total: u32,
    pub can_go_left: bool,
    pub can_go_right: bool,
}

impl<T> CarouselPage<T> {
    /// Index the left arrow points to.
    pub fn prev_index(&self) -> Option<u32> {
        self.can_go_left.then(|| self.index - 1)
    }

    /// Index the right arrow points to.
    pub fn next_index(&self) -> Option<u32> {
        self.can_go_right.then(|| self.index + 1)
    }

    /// Where a detail view opened from this page returns to.
    pub fn back_ref(&self) -> BackRef {
        BackRef::new(self.scope, self.index)
    }
}

/// Result of rendering a scope at an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CarouselView<T> {
    /// An item exists at the requested index.
    Page(CarouselPage<T>),

    /// Nothing to show. The only navigation offered is the top-level menu.
    Empty { scope: Scope, label: &'static str },
}

impl<T> CarouselView<T> {
    /// Builds the view from a fresh `(total, item)` read.
    ///
    /// An index at or past `total` is empty even if an item came back: the
    /// count and the item were read separately, and a page claiming
    /// `4/3` would be worse than an empty state.
    pub fn assemble(scope: Scope, index: u32, total: u32, item: Option<T>) -> Self {
        match item {
            Some(item) if total > 0 && index < total => CarouselView::Page(CarouselPage {
                scope,
                item,
                index,
                page: index + 1,
                total,
                can_go_left: index > 0,
                can_go_right: index < total - 1,
            }),
            _ => CarouselView::empty(scope),
        }
    }

    /// The empty state for `scope`.
    pub fn empty(scope: Scope) -> Self {
        CarouselView::Empty {
            scope,
            label: scope.empty_label(),
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            CarouselView::Page(page) => page.scope,
            CarouselView::Empty { scope, .. } => *scope,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CarouselView::Empty { .. })
    }

    pub fn page(&self) -> Option<&CarouselPage<T>> {
        match self {
            CarouselView::Page(page) => Some(page),
            CarouselView::Empty { .. } => None,
        }
    }

    pub fn item(&self) -> Option<&T> {
        self.page().map(|page| &page.item)
    }

    /// Transforms the item, keeping position and flags.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CarouselView<U> {
        match self {
            CarouselView::Page(page) => CarouselView::Page(CarouselPage {
                scope: page.scope,
                item: f(page.item),
                index: page.index,
                page: page.page,
                total: page.total,
                can_go_left: page.can_go_left,
                can_go_right: page.can_go_right,
            }),
            CarouselView::Empty { scope, label } => CarouselView::Empty { scope, label },
        }
    }
}

// =============================================================================
// Back Navigation
// =============================================================================

/// Where the "back" control of a detail view leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackTarget {
    /// Restore the carousel the detail view was opened from.
    Carousel { scope: Scope, index: u32 },
    /// No carousel context was carried; go to the top-level menu.
    Menu,
}

impl From<Option<BackRef>> for BackTarget {
    fn from(back: Option<BackRef>) -> Self {
        match back {
            Some(BackRef { scope, index }) => BackTarget::Carousel { scope, index },
            None => BackTarget::Menu,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
