/// Data models
///
/// # Models
///
/// - `id`: 24-character hexadecimal record identifiers
/// - `user`: User accounts
/// - `task`: Tasks owned by a single user
///
/// Persistence lives in the `store` module; these types carry no database
/// handles of their own.

pub mod id;
pub mod task;
pub mod user;
