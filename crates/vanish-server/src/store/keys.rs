//! Opaque record identifiers.
//!
//! 64 random bytes, hex-encoded to 128 lowercase chars. 512 bits of
//! entropy makes a genuine collision effectively impossible; the probe
//! loop only bounds latency against a misbehaving store.

use deadpool_redis::Connection;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{CodecError, Error};

/// Number of random bytes in a record key (hex length is twice this).
pub const KEY_BYTES: usize = 64;

/// Attempts to draw a non-colliding key before giving up.
pub const MAX_COLLISIONS: usize = 16;

/// Draw a random candidate key.
pub(crate) fn random_key() -> Result<String, CodecError> {
    let mut b = [0u8; KEY_BYTES];
    OsRng
        .try_fill_bytes(&mut b)
        .map_err(|_| CodecError::RandFailure)?;
    Ok(hex::encode(b))
}

/// Generate a key that no live record uses, probing the store for each
/// candidate. Fails with [`Error::KeyCollision`] once the attempt budget
/// is exhausted.
pub async fn new_key(conn: &mut Connection) -> Result<String, Error> {
    for _ in 0..MAX_COLLISIONS {
        let candidate = random_key()?;
        if !super::repository::exists(conn, &candidate).await? {
            return Ok(candidate);
        }
    }
    Err(Error::KeyCollision)
}
