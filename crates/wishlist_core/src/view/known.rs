//! Visitor-held set of capability secrets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Secrets a visitor received from their own fulfillments.
///
/// Usually decoded from a cookie or session value by the request layer.
/// Blank entries are dropped, so an open wish (empty secret) never counts
/// as known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnownSecrets(BTreeSet<String>);

impl KnownSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a secret after a successful fulfillment. Returns `false` for
    /// blank or already-known values.
    pub fn remember(&mut self, secret: impl Into<String>) -> bool {
        let secret = secret.into();
        let trimmed = secret.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.0.insert(trimmed.to_string())
    }

    /// Drops a secret, e.g. after the visitor undid their fulfillment.
    pub fn forget(&mut self, secret: &str) -> bool {
        self.0.remove(secret.trim())
    }

    pub fn contains(&self, secret: &str) -> bool {
        !secret.is_empty() && self.0.contains(secret)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for KnownSecrets {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut known = Self::new();
        for secret in iter {
            known.remember(secret);
        }
        known
    }
}
