//! Wishlist use-case service.
//!
//! # Responsibility
//! - Provide the operations the request layer calls: add/edit, fulfill/undo,
//!   soft delete/restore, listings and stats.
//! - Map repository failures onto the caller-facing error kinds.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/transaction contracts.
//! - Errors propagate unchanged in meaning; nothing is retried or swallowed.
//! - Log events carry ids and error codes only, never givers or secrets.

use crate::model::wish::{Wish, WishFields, WishId, WishKey, WishKeyError, WishValidationError};
use crate::repo::wish_repo::{RepoError, WishRepository};
use crate::view::known::KnownSecrets;
use crate::view::ordering::{priority_ordered, priority_ordered_no_spoiler, WishView};
use crate::view::stats::{compute_stats, WishStats};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Caller-facing error kinds for wishlist operations.
#[derive(Debug)]
pub enum WishServiceError {
    /// Invalid field value; nothing was persisted.
    Validation(WishValidationError),
    /// No wish matches the id or secret.
    NotFound(WishKey),
    /// Someone else claimed the wish first.
    WishFulfilled(WishId),
    /// Endless wishes cannot be claimed.
    EndlessWish(WishId),
    /// Undo link does not match the wish. `None` when the link resolves to
    /// no wish at all, e.g. after the claim was already undone.
    SecretMismatch(Option<WishId>),
    /// Caller broke an argument contract, e.g. both id and secret given.
    InvalidArgument(String),
    /// Storage failure.
    Repo(RepoError),
}

impl WishServiceError {
    /// Stable machine-readable code for logs and presentation mapping.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::WishFulfilled(_) => "wish_fulfilled",
            Self::EndlessWish(_) => "endless_wish",
            Self::SecretMismatch(_) => "secret_mismatch",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Repo(_) => "storage",
        }
    }
}

impl Display for WishServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid wish: {err}"),
            Self::NotFound(key) => write!(f, "wish not found: {key}"),
            Self::WishFulfilled(id) => write!(f, "wish {id} has already been claimed"),
            Self::EndlessWish(id) => write!(f, "wish {id} is endless and cannot be claimed"),
            Self::SecretMismatch(Some(id)) => write!(f, "undo link is not valid for wish {id}"),
            Self::SecretMismatch(None) => write!(f, "undo link is not valid"),
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WishServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for WishServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound(key) => Self::NotFound(key),
            RepoError::WishFulfilled(id) => Self::WishFulfilled(id),
            RepoError::EndlessWish(id) => Self::EndlessWish(id),
            RepoError::SecretMismatch(id) => Self::SecretMismatch(Some(id)),
            other => Self::Repo(other),
        }
    }
}

impl From<WishKeyError> for WishServiceError {
    fn from(value: WishKeyError) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}

impl From<WishValidationError> for WishServiceError {
    fn from(value: WishValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type ServiceResult<T> = Result<T, WishServiceError>;

/// Wishes inserted by `seed_defaults` into an empty list.
fn default_wishes() -> [WishFields; 3] {
    [
        WishFields::new("Shenanigans", 3)
            .with_desc("Für mehr Blödsinn!")
            .with_link("https://youtu.be/dQw4w9WgXcQ?si=B8g9pOJgWpztlIZw"),
        WishFields::new("Weltfrieden", 5),
        WishFields::new("Wäre ganz nett", 1)
            .with_desc("Das hier wäre auch ganz nett. Ist aber nicht besonders wichtig."),
    ]
}

/// Wishlist service facade over a repository implementation.
pub struct WishService<R: WishRepository> {
    repo: R,
}

impl<R: WishRepository> WishService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds a wish from admin form input.
    pub fn add(&self, fields: &WishFields) -> ServiceResult<Wish> {
        logged("wish_add", self.repo.add(fields).map_err(Into::into))
    }

    pub fn get_wish_by_id(&self, id: WishId) -> ServiceResult<Wish> {
        Ok(self.repo.get_by_id(id)?)
    }

    pub fn get_wish(&self, key: &WishKey) -> ServiceResult<Wish> {
        Ok(self.repo.get(key)?)
    }

    /// Resolves an undo link to the id of its wish.
    pub fn get_id_by_secret(&self, secret: &str) -> ServiceResult<WishId> {
        Ok(self.repo.get_by_secret(secret)?.id())
    }

    /// Overwrites all editable fields of a wish (admin edit).
    pub fn modify(&self, id: WishId, fields: &WishFields) -> ServiceResult<Wish> {
        logged("wish_modify", self.repo.modify(id, fields).map_err(Into::into))
    }

    /// Claims a wish for `giver`.
    ///
    /// The returned wish carries the freshly minted secret; the caller hands
    /// it to the visitor as undo link and adds it to their `KnownSecrets`.
    pub fn fulfill(&self, id: WishId, giver: &str) -> ServiceResult<Wish> {
        logged(
            "wish_fulfill",
            self.repo.mark_fulfilled(id, giver).map_err(Into::into),
        )
    }

    /// Reopens the wish addressed by an undo link.
    ///
    /// A link that resolves to no wish (never issued, or already undone)
    /// fails with `SecretMismatch`, not `NotFound`.
    pub fn undo(&self, secret: &str) -> ServiceResult<Wish> {
        let result = match self.repo.get_by_secret(secret) {
            Ok(wish) => self.repo.reopen(wish.id(), secret).map_err(Into::into),
            Err(RepoError::NotFound(WishKey::Secret(_))) => {
                Err(WishServiceError::SecretMismatch(None))
            }
            Err(err) => Err(err.into()),
        };
        logged("wish_undo", result)
    }

    /// Reopens wish `id` if `secret` is its current capability.
    pub fn reopen(&self, id: WishId, secret: &str) -> ServiceResult<Wish> {
        logged(
            "wish_reopen",
            self.repo.reopen(id, secret).map_err(Into::into),
        )
    }

    /// Soft-deletes the wish addressed by exactly one of `id` or `secret`.
    pub fn soft_delete(&self, id: Option<WishId>, secret: Option<&str>) -> ServiceResult<Wish> {
        let result = WishKey::from_parts(id, secret)
            .map_err(WishServiceError::from)
            .and_then(|key| self.repo.soft_delete(&key).map_err(Into::into));
        logged("wish_delete", result)
    }

    /// Restores the wish addressed by exactly one of `id` or `secret`.
    pub fn restore(&self, id: Option<WishId>, secret: Option<&str>) -> ServiceResult<Wish> {
        let result = WishKey::from_parts(id, secret)
            .map_err(WishServiceError::from)
            .and_then(|key| self.repo.restore(&key).map_err(Into::into));
        logged("wish_restore", result)
    }

    /// Active wishes in insertion order.
    pub fn list_active(&self) -> ServiceResult<Vec<Wish>> {
        Ok(self.repo.list_active()?)
    }

    /// Deleted wishes, most recently deleted first.
    pub fn list_deleted(&self) -> ServiceResult<Vec<Wish>> {
        Ok(self.repo.list_deleted()?)
    }

    /// Regular list view for a visitor holding `known` secrets.
    pub fn priority_ordered_wishes(&self, known: &KnownSecrets) -> ServiceResult<Vec<WishView>> {
        Ok(priority_ordered(self.repo.list_active()?, known))
    }

    /// No-spoiler list view for a visitor holding `known` secrets.
    pub fn priority_ordered_wishes_no_spoiler(
        &self,
        known: &KnownSecrets,
    ) -> ServiceResult<Vec<WishView>> {
        Ok(priority_ordered_no_spoiler(self.repo.list_active()?, known))
    }

    /// Single active wish as seen by a visitor holding `known` secrets.
    ///
    /// The view is spoiler-free: the giver is only visible on the visitor's
    /// own claims. Soft-deleted wishes are not found.
    pub fn wish_view(&self, id: WishId, known: &KnownSecrets) -> ServiceResult<WishView> {
        let wish = self.repo.get_by_id(id)?;
        if wish.is_deleted() {
            return Err(WishServiceError::NotFound(WishKey::Id(id)));
        }
        Ok(WishView::new(wish, known, true))
    }

    /// Admin counts over current storage state.
    pub fn stats(&self) -> ServiceResult<WishStats> {
        let active = self.repo.list_active()?;
        let deleted = self.repo.list_deleted()?;
        Ok(compute_stats(active.iter().chain(deleted.iter())))
    }

    /// Inserts the demo wishes when storage holds no wishes at all.
    ///
    /// Returns the number of inserted wishes.
    pub fn seed_defaults(&self) -> ServiceResult<usize> {
        if !self.repo.list_active()?.is_empty() || !self.repo.list_deleted()?.is_empty() {
            return Ok(0);
        }

        let defaults = default_wishes();
        for fields in &defaults {
            self.repo.add(fields)?;
        }
        info!(
            "event=wish_seed module=service status=ok inserted={}",
            defaults.len()
        );
        Ok(defaults.len())
    }
}

fn logged(event: &str, result: ServiceResult<Wish>) -> ServiceResult<Wish> {
    match &result {
        Ok(wish) => info!(
            "event={event} module=service status=ok wish_id={}",
            wish.id()
        ),
        Err(err) => warn!(
            "event={event} module=service status=error error_code={}",
            err.code()
        ),
    }
    result
}
