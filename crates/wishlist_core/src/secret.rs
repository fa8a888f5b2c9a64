//! Capability secrets for undoing a fulfillment.
//!
//! # Responsibility
//! - Mint unguessable, URL-safe bearer tokens.
//! - Compare caller-supplied tokens against stored ones.
//!
//! # Invariants
//! - Every token carries `SECRET_BYTES * 8` bits from the OS CSPRNG.
//! - Tokens are never derived from wish data.
//! - An empty token never matches, not even another empty token.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::error::Error;
use std::fmt::{Display, Formatter};
use subtle::ConstantTimeEq;

/// Random bytes per token before base64 encoding.
pub const SECRET_BYTES: usize = 18;

/// Supplied secret does not grant access to the addressed wish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretMismatch;

impl Display for SecretMismatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "secret does not match")
    }
}

impl Error for SecretMismatch {}

/// Generates a fresh URL-safe capability token.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compares two secrets in constant time.
///
/// Both values are hashed first so the comparison does not leak length.
pub fn secrets_match(provided: &str, stored: &str) -> bool {
    if provided.is_empty() || stored.is_empty() {
        return false;
    }

    let provided_digest = Sha256::digest(provided.as_bytes());
    let stored_digest = Sha256::digest(stored.as_bytes());
    provided_digest
        .as_slice()
        .ct_eq(stored_digest.as_slice())
        .into()
}

/// Fails with `SecretMismatch` unless `provided` matches `stored`.
pub fn verify_secret(provided: &str, stored: &str) -> Result<(), SecretMismatch> {
    if secrets_match(provided, stored) {
        Ok(())
    } else {
        Err(SecretMismatch)
    }
}
