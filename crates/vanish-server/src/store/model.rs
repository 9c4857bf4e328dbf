//! Per-request item view and create-form validation.

use serde::Deserialize;
use zeroize::ZeroizeOnDrop;

use crate::config::Limits;
use crate::error::Error;

/// Working view of one secret record for the duration of a request.
/// Plaintext and password are wiped when the value is dropped.
#[derive(Debug, Clone, Default, ZeroizeOnDrop)]
pub struct Item {
    /// 128-char lowercase hex identifier; empty until saved.
    pub key: String,
    /// Plaintext on the way in, decrypted plaintext on the way out.
    pub content: String,
    /// Requested lifetime in seconds.
    pub ttl: i64,
    /// Remaining read quota.
    pub times: i64,
    /// Optional user password, never persisted.
    pub password: String,
}

impl Item {
    /// View for the read path, where only the key and the candidate
    /// password are known up front.
    pub fn for_read(key: String, password: String) -> Self {
        Item {
            key,
            content: String::new(),
            ttl: 0,
            times: 0,
            password,
        }
    }
}

/// Raw create-form submission. Fields arrive as strings and are range
/// checked here; nothing is trimmed or normalized.
#[derive(Debug, Default, Deserialize)]
pub struct CreateForm {
    pub content: Option<String>,
    pub ttl: Option<String>,
    pub times: Option<String>,
    pub password: Option<String>,
}

/// Form posted to a record URL to unlock it.
#[derive(Debug, Default, Deserialize)]
pub struct ConsumeForm {
    pub password: Option<String>,
}

impl CreateForm {
    /// Validate the submission against the service limits and build a
    /// fresh [`Item`].
    pub fn into_item(self, limits: Limits) -> Result<Item, Error> {
        let content = match self.content {
            Some(c) if !c.is_empty() => c,
            _ => return Err(Error::Validation("required field content".into())),
        };
        let ttl = parse_range(self.ttl.as_deref(), "ttl", limits.max_ttl)?;
        let times = parse_range(self.times.as_deref(), "times", limits.max_times)?;
        Ok(Item {
            key: String::new(),
            content,
            ttl,
            times,
            password: self.password.unwrap_or_default(),
        })
    }
}

/// Parse a decimal integer and check it lies in `[1, max]`.
fn parse_range(value: Option<&str>, field: &'static str, max: i64) -> Result<i64, Error> {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ => return Err(Error::Validation(format!("required field {field}"))),
    };
    let n: i64 = value
        .parse()
        .map_err(|_| Error::Validation(format!("field {field} is not an integer")))?;
    if n < 1 || n > max {
        return Err(Error::Validation(format!(
            "field {field}={n} but available range [1 - {max}]"
        )));
    }
    Ok(n)
}
