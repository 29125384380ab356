/// PostgreSQL store backend
///
/// Both accessors hold a clone of the same `PgPool` and bound every query
/// with the configured store timeout. Uniqueness of usernames and emails is
/// enforced by unique constraints, so a signup race that passes the
/// existence pre-check still fails cleanly with `StoreError::DuplicateUser`.
///
/// Toggling completion is a single `UPDATE ... SET completed = NOT completed`
/// so concurrent toggles of the same task never lose an update.

use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;

use super::{bounded, StoreResult, TaskStore, UserStore};
use crate::db::pool::health_check;
use crate::models::id::RecordId;
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, User};

/// PostgreSQL-backed user accessor
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgUserStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username_or_email(&self, identifier: &str) -> StoreResult<Option<User>> {
        let query = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE username = $1 OR email = $1
            ORDER BY created_at, id
            LIMIT 1
            "#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool);

        bounded(self.timeout, query).await
    }

    async fn exists_by_username_or_email(&self, username: &str, email: &str) -> StoreResult<bool> {
        let query = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool);

        bounded(self.timeout, query).await
    }

    async fn create(&self, data: CreateUser) -> StoreResult<User> {
        let query = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(RecordId::generate())
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(&self.pool);

        bounded(self.timeout, query).await
    }

    async fn ping(&self) -> StoreResult<()> {
        bounded(self.timeout, health_check(&self.pool)).await
    }
}

/// PostgreSQL-backed task accessor
#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgTaskStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn list_by_owner(&self, owner: &RecordId) -> StoreResult<Vec<Task>> {
        let query = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, owner_id, description, completed, priority, due_date,
                   created_at, updated_at
            FROM tasks
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool);

        bounded(self.timeout, query).await
    }

    async fn create(&self, data: CreateTask) -> StoreResult<Task> {
        let query = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, owner_id, description, priority, due_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, owner_id, description, completed, priority, due_date,
                      created_at, updated_at
            "#,
        )
        .bind(RecordId::generate())
        .bind(data.owner)
        .bind(data.description)
        .bind(data.priority)
        .bind(data.due_date)
        .fetch_one(&self.pool);

        bounded(self.timeout, query).await
    }

    async fn get_by_id_and_owner(&self, id: &RecordId, owner: &RecordId) -> StoreResult<Option<Task>> {
        let query = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, owner_id, description, completed, priority, due_date,
                   created_at, updated_at
            FROM tasks
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool);

        bounded(self.timeout, query).await
    }

    async fn update_by_id_and_owner(
        &self,
        id: &RecordId,
        owner: &RecordId,
        data: UpdateTask,
    ) -> StoreResult<Option<Task>> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.completed.is_some() {
            bind_count += 1;
            query.push_str(&format!(", completed = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 AND owner_id = $2 \
             RETURNING id, owner_id, description, completed, priority, due_date, created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(owner);

        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(completed) = data.completed {
            q = q.bind(completed);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }

        bounded(self.timeout, q.fetch_optional(&self.pool)).await
    }

    async fn delete_by_id_and_owner(&self, id: &RecordId, owner: &RecordId) -> StoreResult<Option<Task>> {
        let query = sqlx::query_as::<_, Task>(
            r#"
            DELETE FROM tasks
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, description, completed, priority, due_date,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool);

        bounded(self.timeout, query).await
    }

    async fn toggle_completed(&self, id: &RecordId, owner: &RecordId) -> StoreResult<Option<Task>> {
        let query = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET completed = NOT completed, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, description, completed, priority, due_date,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool);

        bounded(self.timeout, query).await
    }

    async fn ping(&self) -> StoreResult<()> {
        bounded(self.timeout, health_check(&self.pool)).await
    }
}
