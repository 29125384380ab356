/// Record identifiers
///
/// Every stored record (users and tasks) is identified by a 24-character
/// hexadecimal string generated by the service from 12 random bytes. The
/// same shape is enforced on every id that arrives from a client before any
/// store lookup happens.
///
/// # Example
///
/// ```
/// use tasklist_shared::models::id::RecordId;
///
/// let id = RecordId::generate();
/// assert_eq!(id.as_str().len(), 24);
///
/// let parsed: RecordId = "65a1f0c2e4b0a1b2c3d4e5f6".parse().unwrap();
/// assert_eq!(parsed.as_str(), "65a1f0c2e4b0a1b2c3d4e5f6");
///
/// assert!("abc".parse::<RecordId>().is_err());
/// ```

use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of random bytes behind an id
const ID_BYTES: usize = 12;

/// Length of the hex-encoded id
pub const ID_LENGTH: usize = ID_BYTES * 2;

/// Error returned when a string is not a valid record id
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid record id: expected {ID_LENGTH} hexadecimal characters, got {0:?}")]
pub struct IdError(pub String);

/// A 24-character lowercase hexadecimal record id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generates a new random id
    pub fn generate() -> Self {
        let mut bytes = [0u8; ID_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Checks whether a string has the shape of a record id
    ///
    /// Exactly 24 hexadecimal characters, either case.
    pub fn is_valid(value: &str) -> bool {
        value.len() == ID_LENGTH && value.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the id, returning the inner string
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FromStr for RecordId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_valid(s) {
            Ok(Self(s.to_ascii_lowercase()))
        } else {
            Err(IdError(s.to_string()))
        }
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
