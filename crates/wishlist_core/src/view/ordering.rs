//! Priority orderings for the public wishlist.
//!
//! # Invariants
//! - Spoiler-aware order: open wishes, then the visitor's own fulfilled
//!   wishes, then other fulfilled wishes; priority descending inside each
//!   partition.
//! - No-spoiler order: the visitor's own wishes first, then priority
//!   descending. Fulfillment status is not a sort key, so position does not
//!   reveal which wishes are claimed.

use crate::model::wish::{Wish, WishId};
use crate::view::known::KnownSecrets;
use std::cmp::Reverse;

/// One listed wish as seen by a specific visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WishView {
    pub wish: Wish,
    /// Visitor holds this wish's secret, i.e. fulfilled it themself.
    pub is_own: bool,
    /// Listing hides other visitors' claims.
    pub spoiler_free: bool,
}

impl WishView {
    pub(crate) fn new(wish: Wish, known: &KnownSecrets, spoiler_free: bool) -> Self {
        let is_own = known.contains(wish.secret());
        Self {
            wish,
            is_own,
            spoiler_free,
        }
    }

    /// Whether the visitor may see that this wish is claimed.
    pub fn shows_fulfillment(&self) -> bool {
        self.wish.is_fulfilled() && (!self.spoiler_free || self.is_own)
    }

    /// Giver name the visitor may see, if any.
    pub fn visible_giver(&self) -> Option<&str> {
        if self.shows_fulfillment() {
            Some(self.wish.giver())
        } else {
            None
        }
    }
}

/// Orders active wishes for the regular list view.
pub fn priority_ordered(wishes: Vec<Wish>, known: &KnownSecrets) -> Vec<WishView> {
    let mut views = visible(wishes, known, false);
    views.sort_by_key(|view| {
        (
            view.wish.is_fulfilled(),
            !view.is_own,
            Reverse(view.wish.priority()),
            view.wish.id(),
        )
    });
    views
}

/// Orders active wishes for the no-spoiler list view.
pub fn priority_ordered_no_spoiler(wishes: Vec<Wish>, known: &KnownSecrets) -> Vec<WishView> {
    let mut views = visible(wishes, known, true);
    views.sort_by_key(|view| no_spoiler_key(view.is_own, &view.wish));
    views
}

fn no_spoiler_key(is_own: bool, wish: &Wish) -> (bool, Reverse<i64>, WishId) {
    (!is_own, Reverse(wish.priority()), wish.id())
}

fn visible(wishes: Vec<Wish>, known: &KnownSecrets, spoiler_free: bool) -> Vec<WishView> {
    wishes
        .into_iter()
        .filter(|wish| !wish.is_deleted())
        .map(|wish| WishView::new(wish, known, spoiler_free))
        .collect()
}
