//! Wish domain model.
//!
//! # Responsibility
//! - Define the canonical wish record and the form input used to create/edit it.
//! - Provide fulfillment and soft-delete lifecycle helpers.
//!
//! # Invariants
//! - `priority` is always within `PRIORITY_MIN..=PRIORITY_MAX`.
//! - `title` is never blank after trimming.
//! - `giver` and `secret` are both empty (open) or both set (fulfilled).
//! - `endless` wishes never carry a giver.
//! - `deleted` keeps the first soft-delete timestamp until restored.

use crate::secret::generate_secret;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use url::Url;

/// System-assigned wish identifier.
pub type WishId = i64;

/// Lowest accepted priority.
pub const PRIORITY_MIN: i64 = 1;
/// Highest accepted priority.
pub const PRIORITY_MAX: i64 = 5;

const UNASSIGNED_ID: WishId = 0;
const SECRET_PREVIEW_CHARS: usize = 4;

/// Field-level validation failures for wish create/edit/read paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WishValidationError {
    /// Title is empty after trimming whitespace.
    EmptyTitle,
    /// Priority outside `PRIORITY_MIN..=PRIORITY_MAX`.
    PriorityOutOfRange(i64),
    /// An endless wish was given a giver.
    EndlessFulfilled,
    /// Exactly one of `giver`/`secret` is set.
    GiverSecretMismatch,
    /// Giver name is empty after trimming.
    BlankGiver,
}

impl Display for WishValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be blank"),
            Self::PriorityOutOfRange(value) => write!(
                f,
                "priority must be between {PRIORITY_MIN} and {PRIORITY_MAX}, got {value}"
            ),
            Self::EndlessFulfilled => write!(f, "endless wish cannot be fulfilled"),
            Self::GiverSecretMismatch => {
                write!(f, "giver and secret must be set or cleared together")
            }
            Self::BlankGiver => write!(f, "giver name must not be blank"),
        }
    }
}

impl Error for WishValidationError {}

/// Rejected fulfillment transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WishStateError {
    /// Wish already has a giver.
    AlreadyFulfilled,
    /// Wish is endless and can never be fulfilled.
    Endless,
    /// Transition input failed field validation.
    Invalid(WishValidationError),
}

impl Display for WishStateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyFulfilled => write!(f, "wish is already fulfilled"),
            Self::Endless => write!(f, "endless wish cannot be fulfilled"),
            Self::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WishStateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

impl From<WishValidationError> for WishStateError {
    fn from(value: WishValidationError) -> Self {
        Self::Invalid(value)
    }
}

/// Addresses one wish either by id or by its capability secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WishKey {
    Id(WishId),
    Secret(String),
}

/// Caller supplied both or neither of id and secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishKeyError {
    Both,
    Neither,
}

impl Display for WishKeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Both => write!(f, "exactly one of id or secret must be given, got both"),
            Self::Neither => write!(f, "exactly one of id or secret must be given, got neither"),
        }
    }
}

impl Error for WishKeyError {}

impl WishKey {
    /// Builds a key from optional form/query parts.
    ///
    /// A blank secret counts as absent.
    pub fn from_parts(id: Option<WishId>, secret: Option<&str>) -> Result<Self, WishKeyError> {
        let secret = secret.map(str::trim).filter(|value| !value.is_empty());
        match (id, secret) {
            (Some(_), Some(_)) => Err(WishKeyError::Both),
            (None, None) => Err(WishKeyError::Neither),
            (Some(id), None) => Ok(Self::Id(id)),
            (None, Some(secret)) => Ok(Self::Secret(secret.to_string())),
        }
    }
}

impl From<WishId> for WishKey {
    fn from(value: WishId) -> Self {
        Self::Id(value)
    }
}

impl Display for WishKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            // Secrets are bearer capabilities; only a short prefix is shown.
            Self::Secret(secret) => {
                let preview: String = secret.chars().take(SECRET_PREVIEW_CHARS).collect();
                write!(f, "secret {preview}...")
            }
        }
    }
}

/// Form input for adding or fully editing a wish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishFields {
    pub title: String,
    pub priority: i64,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub endless: bool,
    #[serde(default)]
    pub giver: String,
}

impl WishFields {
    /// Creates form input with empty optional fields.
    pub fn new(title: impl Into<String>, priority: i64) -> Self {
        Self {
            title: title.into(),
            priority,
            desc: String::new(),
            link: String::new(),
            endless: false,
            giver: String::new(),
        }
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn endless(mut self, endless: bool) -> Self {
        self.endless = endless;
        self
    }

    pub fn with_giver(mut self, giver: impl Into<String>) -> Self {
        self.giver = giver.into();
        self
    }

    /// Returns a trimmed copy, or the first violated field rule.
    ///
    /// Out-of-range priorities are rejected, never clamped.
    pub fn normalized(&self) -> Result<Self, WishValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(WishValidationError::EmptyTitle);
        }
        check_priority(self.priority)?;

        let giver = self.giver.trim();
        if self.endless && !giver.is_empty() {
            return Err(WishValidationError::EndlessFulfilled);
        }

        Ok(Self {
            title: title.to_string(),
            priority: self.priority,
            desc: self.desc.clone(),
            link: self.link.trim().to_string(),
            endless: self.endless,
            giver: giver.to_string(),
        })
    }
}

/// Flat wish shape used for storage rows and serialization.
///
/// Converting into [`Wish`] re-checks every invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishRecord {
    pub id: WishId,
    pub title: String,
    pub priority: i64,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub endless: bool,
    #[serde(default)]
    pub giver: String,
    #[serde(default)]
    pub secret: String,
    /// Unix epoch milliseconds of the soft delete, if any.
    #[serde(default)]
    pub deleted: Option<i64>,
}

/// Canonical wish entity.
///
/// Fields are private so that every mutation goes through a method that
/// keeps the invariants listed at module level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WishRecord", into = "WishRecord")]
pub struct Wish {
    id: WishId,
    title: String,
    priority: i64,
    desc: String,
    link: String,
    endless: bool,
    giver: String,
    secret: String,
    deleted: Option<i64>,
}

impl Wish {
    /// Creates a not-yet-persisted wish from form input.
    ///
    /// # Invariants
    /// - `id` stays unassigned (`0`) until the repository inserts the wish.
    /// - A non-empty giver mints a fresh secret.
    /// - `deleted` starts as `None`.
    pub fn create(fields: &WishFields) -> Result<Self, WishValidationError> {
        let fields = fields.normalized()?;
        let secret = if fields.giver.is_empty() {
            String::new()
        } else {
            generate_secret()
        };

        Ok(Self {
            id: UNASSIGNED_ID,
            title: fields.title,
            priority: fields.priority,
            desc: fields.desc,
            link: fields.link,
            endless: fields.endless,
            giver: fields.giver,
            secret,
            deleted: None,
        })
    }

    pub(crate) fn with_assigned_id(mut self, id: WishId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> WishId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn priority(&self) -> i64 {
        self.priority
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn endless(&self) -> bool {
        self.endless
    }

    pub fn giver(&self) -> &str {
        &self.giver
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Soft-delete timestamp in Unix epoch milliseconds.
    pub fn deleted(&self) -> Option<i64> {
        self.deleted
    }

    /// Returns whether someone has claimed this wish.
    pub fn is_fulfilled(&self) -> bool {
        !self.giver.is_empty()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }

    /// Claims this wish for `giver` and mints a fresh capability secret.
    ///
    /// # Errors
    /// - `Endless` for endless wishes.
    /// - `AlreadyFulfilled` when a giver is already set; the first giver is kept.
    /// - `Invalid(BlankGiver)` when `giver` is empty after trimming.
    pub fn mark_fulfilled(&mut self, giver: &str) -> Result<(), WishStateError> {
        if self.endless {
            return Err(WishStateError::Endless);
        }
        if self.is_fulfilled() {
            return Err(WishStateError::AlreadyFulfilled);
        }
        let giver = giver.trim();
        if giver.is_empty() {
            return Err(WishValidationError::BlankGiver.into());
        }

        self.giver = giver.to_string();
        self.secret = generate_secret();
        Ok(())
    }

    /// Clears giver and secret. Idempotent.
    ///
    /// Secret verification is the caller's job.
    pub fn reopen(&mut self) {
        self.giver.clear();
        self.secret.clear();
    }

    /// Marks this wish as soft-deleted, keeping an earlier timestamp if set.
    pub fn delete(&mut self) {
        if self.deleted.is_none() {
            self.deleted = Some(now_epoch_ms());
        }
    }

    /// Clears the soft-delete marker.
    pub fn undelete(&mut self) {
        self.deleted = None;
    }

    /// Overwrites all editable fields with admin form input.
    ///
    /// Giver changes keep `secret` consistent: clearing the giver clears the
    /// secret, setting a giver on an open wish mints one, and renaming an
    /// existing giver keeps the current secret valid.
    pub fn apply_fields(&mut self, fields: &WishFields) -> Result<(), WishValidationError> {
        let fields = fields.normalized()?;

        if fields.giver.is_empty() {
            self.secret.clear();
        } else if self.secret.is_empty() {
            self.secret = generate_secret();
        }

        self.title = fields.title;
        self.priority = fields.priority;
        self.desc = fields.desc;
        self.link = fields.link;
        self.endless = fields.endless;
        self.giver = fields.giver;
        Ok(())
    }

    /// Display-safe host of `link`, without a leading `www.`.
    pub fn link_domain(&self) -> String {
        link_domain(&self.link)
    }

    /// Re-checks all entity invariants.
    pub fn validate(&self) -> Result<(), WishValidationError> {
        if self.title.trim().is_empty() {
            return Err(WishValidationError::EmptyTitle);
        }
        check_priority(self.priority)?;
        if self.giver.is_empty() != self.secret.is_empty() {
            return Err(WishValidationError::GiverSecretMismatch);
        }
        if self.endless && self.is_fulfilled() {
            return Err(WishValidationError::EndlessFulfilled);
        }
        Ok(())
    }
}

impl TryFrom<WishRecord> for Wish {
    type Error = WishValidationError;

    fn try_from(value: WishRecord) -> Result<Self, Self::Error> {
        let wish = Self {
            id: value.id,
            title: value.title,
            priority: value.priority,
            desc: value.desc,
            link: value.link,
            endless: value.endless,
            giver: value.giver,
            secret: value.secret,
            deleted: value.deleted,
        };
        wish.validate()?;
        Ok(wish)
    }
}

impl From<Wish> for WishRecord {
    fn from(value: Wish) -> Self {
        Self {
            id: value.id,
            title: value.title,
            priority: value.priority,
            desc: value.desc,
            link: value.link,
            endless: value.endless,
            giver: value.giver,
            secret: value.secret,
            deleted: value.deleted,
        }
    }
}

/// Derives a display-safe host name from a shop link.
///
/// Returns an empty string for empty, unparsable or host-less links.
pub fn link_domain(link: &str) -> String {
    let trimmed = link.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    match Url::parse(trimmed) {
        Ok(url) => url
            .host_str()
            .map(|host| host.strip_prefix("www.").unwrap_or(host).to_string())
            .unwrap_or_default(),
        Err(_) => String::new(),
    }
}

fn check_priority(priority: i64) -> Result<(), WishValidationError> {
    if (PRIORITY_MIN..=PRIORITY_MAX).contains(&priority) {
        Ok(())
    } else {
        Err(WishValidationError::PriorityOutOfRange(priority))
    }
}

fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
