/// Store accessors
///
/// Handlers never talk to the database directly. They go through two
/// accessor traits, [`UserStore`] and [`TaskStore`], whose implementations
/// receive their store handle at construction:
///
/// - [`postgres`]: sqlx/PostgreSQL backend sharing one `PgPool`
/// - [`memory`]: in-process backend for development and tests
///
/// Every task operation takes both the task id and the owner id. There is
/// no way to load or modify a task by id alone.
///
/// # Example
///
/// ```
/// use tasklist_shared::models::task::{CreateTask, Priority};
/// use tasklist_shared::models::user::CreateUser;
/// use tasklist_shared::store::Stores;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stores = Stores::in_memory();
///
/// let user = stores.users.create(CreateUser {
///     username: "alice".to_string(),
///     email: "alice@x.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// let task = stores.tasks.create(CreateTask {
///     owner: user.id.clone(),
///     description: "buy milk".to_string(),
///     priority: Priority::Medium,
///     due_date: None,
/// }).await?;
///
/// assert_eq!(stores.tasks.list_by_owner(&user.id).await?.len(), 1);
/// # let _ = task;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::models::id::RecordId;
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, User};

pub mod memory;
pub mod postgres;

/// Default bound on a single store call
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Username or email already taken
    #[error("User already exists")]
    DuplicateUser,

    /// Store call did not complete in time
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Any other backend failure
    #[error("Store error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return StoreError::DuplicateUser;
            }
        }
        StoreError::Backend(err.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Runs a store future with an upper bound on its duration
pub async fn bounded<T, E, F>(limit: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<StoreError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

/// User store accessor
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds a user whose username or email equals `identifier`
    ///
    /// One account's username may equal another's email; the earliest
    /// created account wins.
    async fn find_by_username_or_email(&self, identifier: &str) -> StoreResult<Option<User>>;

    /// Checks whether the username or the email is already taken
    async fn exists_by_username_or_email(&self, username: &str, email: &str) -> StoreResult<bool>;

    /// Creates a user
    ///
    /// Fails with `StoreError::DuplicateUser` when either unique field is
    /// taken, even if a concurrent signup slipped past the pre-check.
    async fn create(&self, data: CreateUser) -> StoreResult<User>;

    /// Checks that the backend is reachable
    async fn ping(&self) -> StoreResult<()>;
}

/// Task store accessor
///
/// All lookups and mutations are owner-scoped.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Lists an owner's tasks, newest first
    async fn list_by_owner(&self, owner: &RecordId) -> StoreResult<Vec<Task>>;

    /// Creates a task
    async fn create(&self, data: CreateTask) -> StoreResult<Task>;

    /// Gets a task if it exists and belongs to `owner`
    async fn get_by_id_and_owner(&self, id: &RecordId, owner: &RecordId) -> StoreResult<Option<Task>>;

    /// Applies a partial update; `None` if no task matches id and owner
    async fn update_by_id_and_owner(
        &self,
        id: &RecordId,
        owner: &RecordId,
        data: UpdateTask,
    ) -> StoreResult<Option<Task>>;

    /// Deletes a task, returning the removed record
    async fn delete_by_id_and_owner(&self, id: &RecordId, owner: &RecordId) -> StoreResult<Option<Task>>;

    /// Flips `completed` in a single atomic operation
    async fn toggle_completed(&self, id: &RecordId, owner: &RecordId) -> StoreResult<Option<Task>>;

    /// Checks that the backend is reachable
    async fn ping(&self) -> StoreResult<()>;
}

/// Store handles shared by request handlers
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
}

impl Stores {
    /// Bundles explicit store implementations
    pub fn new(users: Arc<dyn UserStore>, tasks: Arc<dyn TaskStore>) -> Self {
        Self { users, tasks }
    }

    /// PostgreSQL-backed stores sharing one pool
    pub fn postgres(pool: sqlx::PgPool, timeout: Duration) -> Self {
        Self::new(
            Arc::new(postgres::PgUserStore::new(pool.clone(), timeout)),
            Arc::new(postgres::PgTaskStore::new(pool, timeout)),
        )
    }

    /// Fresh, empty in-memory stores
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(memory::MemoryUserStore::new()),
            Arc::new(memory::MemoryTaskStore::new()),
        )
    }

    /// Pings every backend
    pub async fn ping(&self) -> StoreResult<()> {
        self.users.ping().await?;
        self.tasks.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_passes_through_result() {
        let ok: StoreResult<u32> =
            bounded(Duration::from_secs(1), async { Ok::<_, StoreError>(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err: StoreResult<u32> = bounded(Duration::from_secs(1), async {
            Err::<u32, _>(StoreError::DuplicateUser)
        })
        .await;
        assert!(matches!(err, Err(StoreError::DuplicateUser)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out() {
        let limit = Duration::from_millis(50);
        let result: StoreResult<()> = bounded(limit, async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, StoreError>(())
        })
        .await;

        assert!(matches!(result, Err(StoreError::Timeout(d)) if d == limit));
    }

    #[test]
    fn test_sqlx_row_not_found_is_backend_error() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
