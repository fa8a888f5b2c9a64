//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the wish storage contract used by services.
//! - Isolate SQLite query details from use-case orchestration.
//!
//! # Invariants
//! - Repository writes go through `Wish` methods before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `WishFulfilled`,
//!   `SecretMismatch`) in addition to DB transport errors.

pub mod wish_repo;
