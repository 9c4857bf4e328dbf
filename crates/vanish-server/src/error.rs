//! Error taxonomy for the service.
//!
//! Handlers map these onto HTTP responses; everything that is not a
//! client mistake collapses to a generic 500 page with the detail kept
//! in the logs.

use deadpool_redis::redis;
use thiserror::Error;

use crate::store::keys::MAX_COLLISIONS;

/// Failures inside the payload codec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Empty plaintext, empty service key, undersized ciphertext or
    /// malformed hex.
    #[error("invalid codec input: {0}")]
    InvalidInput(&'static str),

    /// The block cipher could not be constructed (wrong key length).
    #[error("cipher construction failed")]
    CipherInit,

    /// The OS random source failed while sampling an IV.
    #[error("random generation failed")]
    RandFailure,
}

/// Top-level service error.
#[derive(Debug, Error)]
pub enum Error {
    /// A create-form field failed validation.
    #[error("validation: {0}")]
    Validation(String),

    /// The record does not exist (or its lifetime has ended).
    #[error("record not found")]
    NotFound,

    /// The supplied password does not match the stored verifier.
    #[error("wrong password")]
    WrongPassword,

    /// Any failure talking to the store, including timeouts.
    #[error("store i/o: {0}")]
    Store(#[from] redis::RedisError),

    /// The store connection pool could not hand out a connection.
    #[error("store pool: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Every random key candidate collided with a live record.
    #[error("could not allocate a unique key after {} attempts", MAX_COLLISIONS)]
    KeyCollision,

    /// The atomic write batch did not report success for all operations.
    #[error("store rejected the write batch")]
    StoreWrite,

    /// The final DEL after the last read did not report success.
    #[error("record {0} was not deleted")]
    DeletionFailed(String),
}
