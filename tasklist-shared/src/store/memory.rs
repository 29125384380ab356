/// In-memory store backend
///
/// Used when no database is configured and by the test suites. Each store
/// keeps its records behind a single `tokio::sync::RwLock`; checks that must
/// be atomic with a write (username/email uniqueness, the completion flip)
/// happen under the write lock.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{StoreError, StoreResult, TaskStore, UserStore};
use crate::models::id::RecordId;
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, User};

/// In-memory user accessor
///
/// Users are kept in signup order so an identifier that matches two
/// accounts always resolves to the older one.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username_or_email(&self, identifier: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.username == identifier || u.email == identifier)
            .cloned())
    }

    async fn exists_by_username_or_email(&self, username: &str, email: &str) -> StoreResult<bool> {
        let users = self.users.read().await;
        Ok(users.iter().any(|u| u.username == username || u.email == email))
    }

    async fn create(&self, data: CreateUser) -> StoreResult<User> {
        let mut users = self.users.write().await;

        if users
            .iter()
            .any(|u| u.username == data.username || u.email == data.email)
        {
            return Err(StoreError::DuplicateUser);
        }

        let now = Utc::now();
        let user = User {
            id: RecordId::generate(),
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            created_at: now,
            updated_at: now,
        };

        users.push(user.clone());
        Ok(user)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[derive(Debug)]
struct StoredTask {
    // Insertion order, breaks ties between equal creation timestamps
    seq: u64,
    task: Task,
}

#[derive(Debug, Default)]
struct TaskTable {
    next_seq: u64,
    rows: HashMap<RecordId, StoredTask>,
}

impl TaskTable {
    fn owned_mut(&mut self, id: &RecordId, owner: &RecordId) -> Option<&mut Task> {
        self.rows
            .get_mut(id)
            .map(|row| &mut row.task)
            .filter(|task| &task.owner == owner)
    }
}

/// In-memory task accessor
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    table: RwLock<TaskTable>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn list_by_owner(&self, owner: &RecordId) -> StoreResult<Vec<Task>> {
        let table = self.table.read().await;

        let mut rows: Vec<&StoredTask> = table
            .rows
            .values()
            .filter(|row| &row.task.owner == owner)
            .collect();

        rows.sort_by(|a, b| {
            b.task
                .created_at
                .cmp(&a.task.created_at)
                .then(b.seq.cmp(&a.seq))
        });

        Ok(rows.into_iter().map(|row| row.task.clone()).collect())
    }

    async fn create(&self, data: CreateTask) -> StoreResult<Task> {
        let mut table = self.table.write().await;

        let now = Utc::now();
        let task = Task {
            id: RecordId::generate(),
            description: data.description,
            completed: false,
            priority: data.priority,
            due_date: data.due_date,
            owner: data.owner,
            created_at: now,
            updated_at: now,
        };

        let seq = table.next_seq;
        table.next_seq += 1;
        table.rows.insert(
            task.id.clone(),
            StoredTask {
                seq,
                task: task.clone(),
            },
        );

        Ok(task)
    }

    async fn get_by_id_and_owner(&self, id: &RecordId, owner: &RecordId) -> StoreResult<Option<Task>> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .get(id)
            .filter(|row| &row.task.owner == owner)
            .map(|row| row.task.clone()))
    }

    async fn update_by_id_and_owner(
        &self,
        id: &RecordId,
        owner: &RecordId,
        data: UpdateTask,
    ) -> StoreResult<Option<Task>> {
        let mut table = self.table.write().await;

        Ok(table.owned_mut(id, owner).map(|task| {
            data.apply_to(task, Utc::now());
            task.clone()
        }))
    }

    async fn delete_by_id_and_owner(&self, id: &RecordId, owner: &RecordId) -> StoreResult<Option<Task>> {
        let mut table = self.table.write().await;

        if table.owned_mut(id, owner).is_none() {
            return Ok(None);
        }

        Ok(table.rows.remove(id).map(|row| row.task))
    }

    async fn toggle_completed(&self, id: &RecordId, owner: &RecordId) -> StoreResult<Option<Task>> {
        let mut table = self.table.write().await;

        Ok(table.owned_mut(id, owner).map(|task| {
            task.completed = !task.completed;
            task.updated_at = Utc::now();
            task.clone()
        }))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::Priority;
    use std::sync::Arc;

    fn new_user(username: &str, email: &str) -> CreateUser {
        CreateUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn new_task(owner: &RecordId, description: &str) -> CreateTask {
        CreateTask {
            owner: owner.clone(),
            description: description.to_string(),
            priority: Priority::Medium,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn test_user_create_and_lookup() {
        let store = MemoryUserStore::new();
        let user = store.create(new_user("alice", "alice@x.com")).await.unwrap();

        let by_name = store.find_by_username_or_email("alice").await.unwrap().unwrap();
        let by_email = store.find_by_username_or_email("alice@x.com").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert_eq!(by_email.id, user.id);

        assert!(store.find_by_username_or_email("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_lookup_prefers_oldest_on_collision() {
        let store = MemoryUserStore::new();
        let bob = store.create(new_user("bob", "bob@x.com")).await.unwrap();
        store.create(new_user("bob@x.com", "eve@x.com")).await.unwrap();

        for _ in 0..10 {
            let found = store.find_by_username_or_email("bob@x.com").await.unwrap().unwrap();
            assert_eq!(found.id, bob.id);
        }
    }

    #[tokio::test]
    async fn test_user_exists_matches_either_field() {
        let store = MemoryUserStore::new();
        store.create(new_user("alice", "alice@x.com")).await.unwrap();

        assert!(store.exists_by_username_or_email("alice", "other@x.com").await.unwrap());
        assert!(store.exists_by_username_or_email("other", "alice@x.com").await.unwrap());
        assert!(!store.exists_by_username_or_email("bob", "bob@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_user_duplicate_rejected() {
        let store = MemoryUserStore::new();
        store.create(new_user("alice", "alice@x.com")).await.unwrap();

        assert!(matches!(
            store.create(new_user("alice", "new@x.com")).await,
            Err(StoreError::DuplicateUser)
        ));
        assert!(matches!(
            store.create(new_user("alice2", "alice@x.com")).await,
            Err(StoreError::DuplicateUser)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_signup_only_one_wins() {
        let store = Arc::new(MemoryUserStore::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.create(new_user("alice", "alice@x.com")).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn test_list_newest_first_and_scoped() {
        let store = MemoryTaskStore::new();
        let alice = RecordId::generate();
        let bob = RecordId::generate();

        store.create(new_task(&alice, "first")).await.unwrap();
        store.create(new_task(&alice, "second")).await.unwrap();
        store.create(new_task(&bob, "bob's")).await.unwrap();

        let tasks = store.list_by_owner(&alice).await.unwrap();
        let descriptions: Vec<_> = tasks.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descriptions, vec!["second", "first"]);

        assert_eq!(store.list_by_owner(&bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_owner_scoping() {
        let store = MemoryTaskStore::new();
        let alice = RecordId::generate();
        let bob = RecordId::generate();

        let task = store.create(new_task(&alice, "private")).await.unwrap();

        assert!(store.get_by_id_and_owner(&task.id, &bob).await.unwrap().is_none());
        assert!(store
            .update_by_id_and_owner(&task.id, &bob, UpdateTask {
                completed: Some(true),
                ..Default::default()
            })
            .await
            .unwrap()
            .is_none());
        assert!(store.toggle_completed(&task.id, &bob).await.unwrap().is_none());
        assert!(store.delete_by_id_and_owner(&task.id, &bob).await.unwrap().is_none());

        // Still intact for the owner
        let still = store.get_by_id_and_owner(&task.id, &alice).await.unwrap().unwrap();
        assert!(!still.completed);
    }

    #[tokio::test]
    async fn test_update_partial() {
        let store = MemoryTaskStore::new();
        let owner = RecordId::generate();
        let task = store.create(new_task(&owner, "buy milk")).await.unwrap();

        let updated = store
            .update_by_id_and_owner(&task.id, &owner, UpdateTask {
                priority: Some(Priority::High),
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.description, "buy milk");
        assert!(updated.updated_at >= task.updated_at);
    }

    #[tokio::test]
    async fn test_toggle_twice_restores() {
        let store = MemoryTaskStore::new();
        let owner = RecordId::generate();
        let task = store.create(new_task(&owner, "buy milk")).await.unwrap();

        let once = store.toggle_completed(&task.id, &owner).await.unwrap().unwrap();
        assert!(once.completed);

        let twice = store.toggle_completed(&task.id, &owner).await.unwrap().unwrap();
        assert!(!twice.completed);
    }

    #[tokio::test]
    async fn test_concurrent_toggles_do_not_lose_updates() {
        let store = Arc::new(MemoryTaskStore::new());
        let owner = RecordId::generate();
        let task = store.create(new_task(&owner, "flip")).await.unwrap();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let store = store.clone();
                let id = task.id.clone();
                let owner = owner.clone();
                tokio::spawn(async move { store.toggle_completed(&id, &owner).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // An even number of flips lands back on the original value
        let final_task = store.get_by_id_and_owner(&task.id, &owner).await.unwrap().unwrap();
        assert!(!final_task.completed);
    }

    #[tokio::test]
    async fn test_delete_returns_record() {
        let store = MemoryTaskStore::new();
        let owner = RecordId::generate();
        let task = store.create(new_task(&owner, "gone soon")).await.unwrap();

        let deleted = store.delete_by_id_and_owner(&task.id, &owner).await.unwrap().unwrap();
        assert_eq!(deleted.id, task.id);

        assert!(store.get_by_id_and_owner(&task.id, &owner).await.unwrap().is_none());
        assert!(store.delete_by_id_and_owner(&task.id, &owner).await.unwrap().is_none());
    }
}
