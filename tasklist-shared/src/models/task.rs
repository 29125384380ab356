/// Task model
///
/// A task is a short description owned by exactly one user. Ownership is
/// permanent, and every read or write of a task is scoped by both its id and
/// its owner's id, so a task owned by someone else behaves exactly like a
/// task that does not exist.
///
/// # Lifecycle
///
/// ```text
/// add ──> (completed = false) <──toggle/update──> (completed = true)
///              │                                        │
///              └──────────────── delete ────────────────┘
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id VARCHAR(24) PRIMARY KEY,
///     owner_id VARCHAR(24) NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     description VARCHAR(500) NOT NULL,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     priority task_priority NOT NULL DEFAULT 'medium',
///     due_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::id::RecordId;

/// Maximum description length in characters
pub const DESCRIPTION_MAX_LENGTH: usize = 500;

/// Task priority
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Converts priority to its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!(
                "Invalid priority '{}': expected one of low, medium, high",
                other
            )),
        }
    }
}

/// Task owned by a single user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    #[serde(rename = "_id")]
    pub id: RecordId,

    /// Trimmed description, 1-500 characters
    pub description: String,

    /// Completion flag
    pub completed: bool,

    /// Priority (defaults to medium)
    pub priority: Priority,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// Owning user
    #[sqlx(rename = "owner_id")]
    pub owner: RecordId,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last modified
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Human-readable completion state, as used in toggle responses
    pub fn completion_label(&self) -> &'static str {
        if self.completed {
            "completed"
        } else {
            "incomplete"
        }
    }
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Owning user
    pub owner: RecordId,

    /// Description (already validated and trimmed)
    pub description: String,

    /// Priority
    pub priority: Priority,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update for an existing task
///
/// Only `Some` fields are written. `due_date` uses a nested option so that
/// `Some(None)` clears the date while `None` leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateTask {
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl UpdateTask {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }

    /// Applies the present fields to a task and bumps `updated_at`
    pub fn apply_to(&self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(ref description) = self.description {
            task.description = description.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        task.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_task() -> Task {
        let now = Utc::now();
        Task {
            id: RecordId::generate(),
            description: "buy milk".to_string(),
            completed: false,
            priority: Priority::default(),
            due_date: None,
            owner: RecordId::generate(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_priority_default_is_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!("low".parse::<Priority>().unwrap(), Priority::Low);
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
        assert!("HIGH".parse::<Priority>().is_err());
    }

    #[test]
    fn test_task_serialization_shape() {
        let task = sample_task();
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["_id"], task.id.as_str());
        assert_eq!(json["description"], "buy milk");
        assert_eq!(json["completed"], false);
        assert_eq!(json["priority"], "medium");
        assert!(json["dueDate"].is_null());
        assert_eq!(json["owner"], task.owner.as_str());
        assert!(json["createdAt"].is_string());
        assert!(json["updatedAt"].is_string());
    }

    #[test]
    fn test_update_default_is_empty() {
        assert!(UpdateTask::default().is_empty());

        let update = UpdateTask {
            completed: Some(true),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_apply_only_present_fields() {
        let mut task = sample_task();
        let due = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        task.due_date = Some(due);

        let later = task.updated_at + chrono::Duration::seconds(5);
        let update = UpdateTask {
            priority: Some(Priority::High),
            ..Default::default()
        };
        update.apply_to(&mut task, later);

        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.description, "buy milk");
        assert!(!task.completed);
        assert_eq!(task.due_date, Some(due));
        assert_eq!(task.updated_at, later);
    }

    #[test]
    fn test_apply_clears_due_date() {
        let mut task = sample_task();
        task.due_date = Some(Utc::now());

        let update = UpdateTask {
            due_date: Some(None),
            ..Default::default()
        };
        update.apply_to(&mut task, Utc::now());

        assert!(task.due_date.is_none());
    }

    #[test]
    fn test_completion_label() {
        let mut task = sample_task();
        assert_eq!(task.completion_label(), "incomplete");
        task.completed = true;
        assert_eq!(task.completion_label(), "completed");
    }
}
