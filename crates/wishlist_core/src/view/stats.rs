//! Admin summary counts.

use crate::model::wish::Wish;
use serde::Serialize;

/// Aggregate wishlist counts for the admin view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WishStats {
    /// Active (non-deleted) wishes.
    pub count: usize,
    /// Active wishes with a giver.
    pub fulfilled: usize,
    /// Soft-deleted wishes.
    #[serde(rename = "nrDeleted")]
    pub nr_deleted: usize,
}

/// Counts over the given wishes; deleted entries are only counted in
/// `nr_deleted`.
pub fn compute_stats<'a>(wishes: impl IntoIterator<Item = &'a Wish>) -> WishStats {
    wishes
        .into_iter()
        .fold(WishStats::default(), |mut stats, wish| {
            if wish.is_deleted() {
                stats.nr_deleted += 1;
            } else {
                stats.count += 1;
                if wish.is_fulfilled() {
                    stats.fulfilled += 1;
                }
            }
            stats
        })
}
