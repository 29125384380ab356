/// User model
///
/// Users are created on signup and are never mutated afterwards. Usernames
/// and emails are each globally unique; the store enforces both.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id VARCHAR(24) PRIMARY KEY,
///     username VARCHAR(30) NOT NULL UNIQUE,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::RecordId;

/// Minimum username length
pub const USERNAME_MIN_LENGTH: u64 = 3;

/// Maximum username length
pub const USERNAME_MAX_LENGTH: u64 = 30;

/// Maximum email length, matching the `users.email` column
pub const EMAIL_MAX_LENGTH: u64 = 255;

/// Minimum plaintext password length, checked before hashing
pub const PASSWORD_MIN_LENGTH: u64 = 6;

/// User account
///
/// The password hash is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID
    #[serde(rename = "_id")]
    pub id: RecordId,

    /// Unique username (3-30 characters)
    pub username: String,

    /// Unique email address
    pub email: String,

    /// Argon2id password hash (PHC string)
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Builds the public summary returned at login
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Username
    pub username: String,

    /// Email address
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,
}

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: RecordId,
    pub username: String,
    pub email: String,
}
