/// API route handlers
///
/// - `health`: Health check endpoint
/// - `users`: Signup, login, and the users test route
/// - `tasks`: Owner-scoped task CRUD and toggle

pub mod health;
pub mod tasks;
pub mod users;
