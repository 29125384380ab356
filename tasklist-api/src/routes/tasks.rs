/// Task endpoints
///
/// All handlers sit behind the access guard and only ever touch tasks
/// owned by the authenticated user. A task owned by someone else is
/// indistinguishable from a missing one (404).
///
/// # Endpoints
///
/// - `GET    /api/tasks` - List own tasks, newest first
/// - `POST   /api/tasks/add` - Create a task
/// - `GET    /api/tasks/:id` - Fetch one task
/// - `PUT    /api/tasks/:id` - Partial update
/// - `DELETE /api/tasks/:id` - Delete, returning the removed task
/// - `PATCH  /api/tasks/:id/toggle` - Flip the completion flag

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tasklist_shared::{
    auth::middleware::AuthContext,
    models::{
        id::RecordId,
        task::{CreateTask, Priority, Task, UpdateTask, DESCRIPTION_MAX_LENGTH},
    },
};

/// Create task request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTaskRequest {
    pub description: Option<String>,

    /// One of low, medium, high (default: medium)
    pub priority: Option<String>,

    /// RFC 3339 timestamp or `YYYY-MM-DD`; empty means no date
    pub due_date: Option<String>,
}

/// Partial update request
///
/// `description` and `dueDate` distinguish an absent field (`None`) from an
/// explicit `null` (`Some(None)`).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default, deserialize_with = "explicit_null")]
    pub description: Option<Option<String>>,

    pub completed: Option<bool>,

    pub priority: Option<String>,

    #[serde(default, deserialize_with = "explicit_null")]
    pub due_date: Option<Option<String>>,
}

/// List response
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub success: bool,
    pub count: usize,
    pub tasks: Vec<Task>,
}

/// Single task response
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub task: Task,
}

impl TaskResponse {
    fn new(task: Task, message: Option<String>) -> Self {
        Self {
            success: true,
            message,
            task,
        }
    }
}

fn explicit_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn parse_task_id(raw: &str) -> ApiResult<RecordId> {
    raw.parse::<RecordId>()
        .map_err(|_| ApiError::BadRequest("Invalid task ID format".to_string()))
}

/// Checks length on the raw input and returns the trimmed text
fn clean_description(raw: &str, empty_message: &str) -> ApiResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(empty_message.to_string()));
    }
    if raw.chars().count() > DESCRIPTION_MAX_LENGTH {
        return Err(ApiError::BadRequest(
            "Description must be less than 500 characters".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn parse_priority(raw: &str) -> ApiResult<Priority> {
    raw.parse::<Priority>().map_err(ApiError::BadRequest)
}

/// Accepts RFC 3339, a naive date-time, or a bare date (midnight UTC)
fn parse_due_date(raw: &str) -> ApiResult<Option<DateTime<Utc>>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Some(naive.and_utc()));
    }
    if let Some(naive) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(Some(naive.and_utc()));
    }

    Err(ApiError::BadRequest(format!("Invalid due date '{}'", raw)))
}

impl UpdateTaskRequest {
    /// Validates the request into a store-level partial update
    fn into_update(self) -> ApiResult<UpdateTask> {
        let description = match self.description {
            None => None,
            Some(None) => {
                return Err(ApiError::BadRequest(
                    "Task description cannot be empty".to_string(),
                ))
            }
            Some(Some(raw)) => Some(clean_description(&raw, "Task description cannot be empty")?),
        };

        let priority = self.priority.as_deref().map(parse_priority).transpose()?;

        let due_date = match self.due_date {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) => Some(parse_due_date(&raw)?),
        };

        Ok(UpdateTask {
            description,
            completed: self.completed,
            priority,
            due_date,
        })
    }
}

/// Lists the caller's tasks, newest first
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<TaskListResponse>> {
    let tasks = state
        .stores
        .tasks
        .list_by_owner(&auth.user_id)
        .await
        .map_err(|e| ApiError::internal("Server error while fetching tasks", e))?;

    tracing::debug!(user_id = %auth.user_id, count = tasks.len(), "Listed tasks");

    Ok(Json(TaskListResponse {
        success: true,
        count: tasks.len(),
        tasks,
    }))
}

/// Creates a task owned by the caller
///
/// # Errors
///
/// - `400 Bad Request`: Empty or over-long description, bad priority or date
/// - `500 Internal Server Error`: Store failure
pub async fn add_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Json<AddTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let Json(req) = body?;

    let description = clean_description(
        req.description.as_deref().unwrap_or_default(),
        "Task description is required",
    )?;
    let priority = match req.priority.as_deref() {
        Some(raw) => parse_priority(raw)?,
        None => Priority::default(),
    };
    let due_date = match req.due_date.as_deref() {
        Some(raw) => parse_due_date(raw)?,
        None => None,
    };

    let task = state
        .stores
        .tasks
        .create(CreateTask {
            owner: auth.user_id.clone(),
            description,
            priority,
            due_date,
        })
        .await
        .map_err(|e| ApiError::internal("Server error while creating task", e))?;

    tracing::info!(user_id = %auth.user_id, task_id = %task.id, "Task created");

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse::new(
            task,
            Some("Task created successfully".to_string()),
        )),
    ))
}

/// Fetches one of the caller's tasks
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskResponse>> {
    let id = parse_task_id(&id)?;

    let task = state
        .stores
        .tasks
        .get_by_id_and_owner(&id, &auth.user_id)
        .await
        .map_err(|e| ApiError::internal("Server error while fetching task", e))?
        .ok_or_else(task_not_found)?;

    Ok(Json(TaskResponse::new(task, None)))
}

/// Applies a partial update to one of the caller's tasks
///
/// # Errors
///
/// - `400 Bad Request`: Malformed id, empty or over-long description, bad
///   priority or date
/// - `404 Not Found`: No such task for this user
/// - `500 Internal Server Error`: Store failure
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    body: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> ApiResult<Json<TaskResponse>> {
    let id = parse_task_id(&id)?;
    let Json(req) = body?;
    let update = req.into_update()?;

    let task = state
        .stores
        .tasks
        .update_by_id_and_owner(&id, &auth.user_id, update)
        .await
        .map_err(|e| ApiError::internal("Server error while updating task", e))?
        .ok_or_else(task_not_found)?;

    tracing::info!(user_id = %auth.user_id, task_id = %task.id, "Task updated");

    Ok(Json(TaskResponse::new(
        task,
        Some("Task updated successfully".to_string()),
    )))
}

/// Deletes one of the caller's tasks and returns it
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskResponse>> {
    let id = parse_task_id(&id)?;

    let task = state
        .stores
        .tasks
        .delete_by_id_and_owner(&id, &auth.user_id)
        .await
        .map_err(|e| ApiError::internal("Server error while deleting task", e))?
        .ok_or_else(task_not_found)?;

    tracing::info!(user_id = %auth.user_id, task_id = %task.id, "Task deleted");

    Ok(Json(TaskResponse::new(
        task,
        Some("Task deleted successfully".to_string()),
    )))
}

/// Flips the completion flag of one of the caller's tasks
pub async fn toggle_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskResponse>> {
    let id = parse_task_id(&id)?;

    let task = state
        .stores
        .tasks
        .toggle_completed(&id, &auth.user_id)
        .await
        .map_err(|e| ApiError::internal("Server error while toggling task", e))?
        .ok_or_else(task_not_found)?;

    let message = format!("Task marked as {}", task.completion_label());
    tracing::info!(user_id = %auth.user_id, task_id = %task.id, completed = task.completed, "Task toggled");

    Ok(Json(TaskResponse::new(task, Some(message))))
}

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn message(err: ApiError) -> String {
        match err {
            ApiError::BadRequest(msg) => msg,
            other => panic!("expected bad request, got {:?}", other),
        }
    }

    #[test]
    fn test_clean_description_boundaries() {
        let at_limit = "a".repeat(DESCRIPTION_MAX_LENGTH);
        assert_eq!(clean_description(&at_limit, "req").unwrap(), at_limit);

        let over = "a".repeat(DESCRIPTION_MAX_LENGTH + 1);
        assert_eq!(
            message(clean_description(&over, "req").unwrap_err()),
            "Description must be less than 500 characters"
        );

        assert_eq!(message(clean_description("   ", "req").unwrap_err()), "req");
        assert_eq!(clean_description("  buy milk ", "req").unwrap(), "buy milk");
    }

    #[test]
    fn test_description_counts_characters() {
        // 500 multi-byte characters are within the limit
        let wide = "é".repeat(DESCRIPTION_MAX_LENGTH);
        assert!(clean_description(&wide, "req").is_ok());
    }

    #[test]
    fn test_parse_due_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

        assert_eq!(parse_due_date("2024-05-01").unwrap(), Some(expected));
        assert_eq!(parse_due_date("2024-05-01T00:00:00Z").unwrap(), Some(expected));
        assert_eq!(parse_due_date("2024-05-01T02:00:00+02:00").unwrap(), Some(expected));
        assert_eq!(parse_due_date("2024-05-01T00:00:00.000").unwrap(), Some(expected));
        assert_eq!(parse_due_date("").unwrap(), None);
        assert!(parse_due_date("next tuesday").is_err());
    }

    #[test]
    fn test_parse_task_id() {
        assert!(parse_task_id("507f1f77bcf86cd799439011").is_ok());
        assert_eq!(
            message(parse_task_id("abc").unwrap_err()),
            "Invalid task ID format"
        );
    }

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let req: UpdateTaskRequest = serde_json::from_str(r#"{"dueDate": null}"#).unwrap();
        let update = req.into_update().unwrap();
        assert_eq!(update.due_date, Some(None));
        assert!(update.description.is_none());

        let req: UpdateTaskRequest = serde_json::from_str(r#"{"completed": true}"#).unwrap();
        let update = req.into_update().unwrap();
        assert_eq!(update.due_date, None);
        assert_eq!(update.completed, Some(true));
    }

    #[test]
    fn test_update_request_rejects_empty_description() {
        for body in [r#"{"description": null}"#, r#"{"description": "   "}"#] {
            let req: UpdateTaskRequest = serde_json::from_str(body).unwrap();
            assert_eq!(
                message(req.into_update().unwrap_err()),
                "Task description cannot be empty"
            );
        }
    }

    #[test]
    fn test_update_request_rejects_bad_priority() {
        let req: UpdateTaskRequest = serde_json::from_str(r#"{"priority": "urgent"}"#).unwrap();
        assert!(message(req.into_update().unwrap_err()).contains("urgent"));
    }
}
