//! Password verifier: salted SHA-512 digest plus constant-time equality.
//!
//! The record key acts as a per-record salt, so identical passwords on
//! different records hash differently. The empty password is legitimate
//! and produces a full-length verifier, so verifier length never reveals
//! whether a password was set.

use constant_time_eq::constant_time_eq;
use sha2::{Digest, Sha512};

/// Hex digest of `SHA-512(password ‖ key)`; 128 chars.
pub fn verifier(password: &str, key: &str) -> String {
    let mut h = Sha512::new();
    h.update(password.as_bytes());
    h.update(key.as_bytes());
    hex::encode(h.finalize())
}

/// Constant-time comparison of a candidate password against a stored
/// verifier.
pub fn check(candidate: &str, stored: &str, key: &str) -> bool {
    constant_time_eq(verifier(candidate, key).as_bytes(), stored.as_bytes())
}
