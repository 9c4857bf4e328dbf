//! Record persistence and atomic consumption against Redis.
//!
//! One hash per record: fields `content` (ciphertext hex), `password`
//! (verifier hex, present even without a password) and `times`
//! (remaining reads), with a key-level expiry. The write batch in
//! [`save`] is a single MULTI/EXEC so a partial record is never
//! observable; the HINCRBY in [`read`] is the sole point where a read
//! quota is claimed, which makes it the race arbiter for concurrent
//! readers.

use deadpool_redis::redis::{cmd, pipe};
use deadpool_redis::Connection;
use tracing::debug;

use super::{codec, keys, verifier};
use crate::error::Error;
use crate::store::model::Item;

pub(crate) const FIELD_CONTENT: &str = "content";
pub(crate) const FIELD_PASSWORD: &str = "password";
pub(crate) const FIELD_TIMES: &str = "times";

/// Persist a fresh item. Allocates the key, derives the verifier,
/// encrypts the content and commits everything in one atomic batch.
/// Returns the item with its key filled in.
pub async fn save(conn: &mut Connection, mut item: Item, service_key: &[u8]) -> Result<Item, Error> {
    item.key = keys::new_key(conn).await?;
    let stored_verifier = verifier::verifier(&item.password, &item.key);
    let cipher_hex = codec::encrypt(&item.content, service_key, &item.password)?;

    // Four operations, four results; each position coerces to bool.
    let (content_set, password_set, times_set, expire_set): (bool, bool, bool, bool) = pipe()
        .atomic()
        .cmd("HSET")
        .arg(&item.key)
        .arg(FIELD_CONTENT)
        .arg(&cipher_hex)
        .cmd("HSET")
        .arg(&item.key)
        .arg(FIELD_PASSWORD)
        .arg(&stored_verifier)
        .cmd("HSET")
        .arg(&item.key)
        .arg(FIELD_TIMES)
        .arg(item.times)
        .cmd("EXPIRE")
        .arg(&item.key)
        .arg(item.ttl)
        .query_async(conn)
        .await?;

    if !(content_set && password_set && times_set && expire_set) {
        return Err(Error::StoreWrite);
    }
    debug!(key = %item.key, "stored record");
    Ok(item)
}

/// True if a record with this key is live in the store.
pub async fn exists(conn: &mut Connection, key: &str) -> Result<bool, Error> {
    let found: bool = cmd("HEXISTS")
        .arg(key)
        .arg(FIELD_CONTENT)
        .query_async(conn)
        .await?;
    Ok(found)
}

/// Compare a candidate password against the record's stored verifier.
/// Expected to run after [`exists`].
pub async fn check_password(
    conn: &mut Connection,
    key: &str,
    candidate: &str,
) -> Result<bool, Error> {
    let stored: String = cmd("HGET")
        .arg(key)
        .arg(FIELD_PASSWORD)
        .query_async(conn)
        .await?;
    Ok(verifier::check(candidate, &stored, key))
}

/// Consume one read quota and return the decrypted item, or `None` when
/// the record's lifetime has already ended.
///
/// HINCRBY totally orders all concurrent readers: with an initial quota
/// of T, exactly T callers observe a non-negative counter and exactly
/// one of them observes zero and deletes the record. A negative counter
/// means another reader drove it to zero first; HINCRBY on an absent key
/// recreates it, so that path checks for and removes the phantom.
pub async fn read(
    conn: &mut Connection,
    item: &Item,
    service_key: &[u8],
) -> Result<Option<Item>, Error> {
    if item.key.is_empty() {
        return Ok(None);
    }
    let times: i64 = cmd("HINCRBY")
        .arg(&item.key)
        .arg(FIELD_TIMES)
        .arg(-1)
        .query_async(conn)
        .await?;

    if times < 0 {
        if exists(conn, &item.key).await? {
            // A concurrent reader holds the final quota and will delete.
            return Ok(None);
        }
        // The record was already gone; HINCRBY resurrected the key.
        delete(conn, &item.key).await?;
        debug!(key = %item.key, "removed phantom key");
        return Ok(None);
    }

    let content: String = cmd("HGET")
        .arg(&item.key)
        .arg(FIELD_CONTENT)
        .query_async(conn)
        .await?;
    let plaintext = codec::decrypt(&content, service_key, &item.password)?;

    if times == 0 {
        if !delete(conn, &item.key).await? {
            return Err(Error::DeletionFailed(item.key.clone()));
        }
        debug!(key = %item.key, "record consumed and deleted");
    }

    Ok(Some(Item {
        key: item.key.clone(),
        content: plaintext,
        ttl: item.ttl,
        times,
        password: String::new(),
    }))
}

/// Remove a record unconditionally. True if the key existed.
pub async fn delete(conn: &mut Connection, key: &str) -> Result<bool, Error> {
    let removed: bool = cmd("DEL").arg(key).query_async(conn).await?;
    Ok(removed)
}

/// Store liveness probe used at startup and by the version endpoint.
pub async fn is_ok(conn: &mut Connection) -> bool {
    matches!(
        cmd("PING").query_async::<String>(conn).await,
        Ok(ref pong) if pong == "PONG"
    )
}
