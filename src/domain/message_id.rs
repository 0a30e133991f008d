//! Generated message identifiers.
//!
//! Identifiers have the shape `{prefix}-{base36 timestamp}-{4 base36 chars}`,
//! e.g. `corr-lx2k9a1b-4f0z`. Uniqueness is best-effort (millisecond
//! timestamp plus a short random suffix), not cryptographic.

use std::fmt;

use serde::{Deserialize, Serialize};

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 4;

/// A generated `Id` / `CorrelationId` value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generates a fresh identifier with the given prefix.
    #[must_use]
    pub fn generate(prefix: &str) -> Self {
        let millis = chrono::Utc::now().timestamp_millis().unsigned_abs();
        let mut noise = uuid::Uuid::new_v4().as_u128();
        let mut suffix = String::with_capacity(SUFFIX_LEN);
        for _ in 0..SUFFIX_LEN {
            suffix.push(base36_digit(noise));
            noise /= 36;
        }
        Self(format!("{prefix}-{}-{suffix}", to_base36(u128::from(millis))))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier, returning the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<MessageId> for String {
    fn from(id: MessageId) -> Self {
        id.0
    }
}

fn base36_digit(n: u128) -> char {
    // n % 36 always indexes inside BASE36
    BASE36
        .get(usize::try_from(n % 36).unwrap_or(0))
        .map_or('0', |b| char::from(*b))
}

fn to_base36(mut n: u128) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(base36_digit(n));
        n /= 36;
    }
    digits.iter().rev().collect()
}
