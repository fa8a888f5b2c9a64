//! Core domain logic for the wishlist.
//! This crate is the single source of truth for wish invariants, undo
//! capabilities and list ordering.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod secret;
pub mod service;
pub mod view;

pub use config::{load_config, ConfigError, WishlistConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::wish::{
    link_domain, Wish, WishFields, WishId, WishKey, WishKeyError, WishRecord, WishStateError,
    WishValidationError, PRIORITY_MAX, PRIORITY_MIN,
};
pub use repo::wish_repo::{RepoError, RepoResult, SqliteWishRepository, WishRepository};
pub use secret::{generate_secret, secrets_match, verify_secret, SecretMismatch};
pub use service::wish_service::{ServiceResult, WishService, WishServiceError};
pub use view::known::KnownSecrets;
pub use view::ordering::{priority_ordered, priority_ordered_no_spoiler, WishView};
pub use view::stats::{compute_stats, WishStats};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
