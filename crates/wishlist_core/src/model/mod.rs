//! Wishlist domain model.
//!
//! # Responsibility
//! - Define the single persisted entity (`Wish`) and its form input shape.
//! - Own fulfillment and soft-delete state transitions.
//!
//! # Invariants
//! - `giver` is the single source of truth for open/fulfilled state.
//! - Deletion is represented by a soft-delete timestamp, not hard delete.

pub mod wish;
