//! Visitor-facing orderings and admin stats.
//!
//! # Responsibility
//! - Merge persisted giver/secret state with a visitor's known secrets.
//! - Produce the spoiler-aware and no-spoiler list orderings.
//! - Aggregate admin stats.
//!
//! # Invariants
//! - All functions here are pure: same wishes + same known secrets give the
//!   same output.
//! - Soft-deleted wishes never appear in a listing.
//! - Ties are broken by ascending id.

pub mod known;
pub mod ordering;
pub mod stats;
