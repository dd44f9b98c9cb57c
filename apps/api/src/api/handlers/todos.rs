use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::extract::{ApiJson, ApiPath};
use crate::api::middleware::AuthUser;
use crate::api::response::ApiResponse;
use crate::api::state::AppState;
use crate::domain::todo::{Todo, TodoUpdate};

const TODO_NOT_FOUND: &str = "Todo not found with this ID";

/// Request body for creating a todo
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "due_date::required")]
    pub due_date: DateTime<Utc>,
}

/// Request body for a partial todo update
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "due_date::optional")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_completed: Option<bool>,
}

impl From<UpdateTodoRequest> for TodoUpdate {
    fn from(req: UpdateTodoRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            is_completed: req.is_completed,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub due_date: DateTime<Utc>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Todo> for TodoResponse {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id(),
            title: todo.title().to_string(),
            description: todo.description().map(str::to_string),
            is_completed: todo.is_completed(),
            due_date: todo.due_date(),
            user_id: todo.user_id(),
            created_at: todo.created_at(),
            updated_at: todo.updated_at(),
        }
    }
}

/// Create a todo for the signed-in user
///
/// POST /user/todos
pub async fn create_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CreateTodoRequest>,
) -> Result<ApiResponse<TodoResponse>, ApiError> {
    let todo = Todo::new(
        auth.user_id,
        req.title,
        req.description,
        req.due_date,
        Utc::now(),
    )?;

    state.todos.create(&todo).await?;
    tracing::debug!(user_id = %auth.user_id, todo_id = %todo.id(), "Todo created");

    Ok(ApiResponse::created(
        "Todo created successfully",
        TodoResponse::from(&todo),
    ))
}

/// List the signed-in user's todos
///
/// GET /user/todos
pub async fn list_todos(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<ApiResponse<Vec<TodoResponse>>, ApiError> {
    let todos = state.todos.find_by_user(auth.user_id).await?;
    let responses = todos.iter().map(TodoResponse::from).collect();

    Ok(ApiResponse::ok("Todos retrieved successfully", responses))
}

/// Update one of the signed-in user's todos
///
/// PUT /user/todos/:id
pub async fn update_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateTodoRequest>,
) -> Result<ApiResponse<TodoResponse>, ApiError> {
    let mut todo = state
        .todos
        .find_for_user(id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::bad_request(TODO_NOT_FOUND))?;

    todo.apply(req.into(), Utc::now())?;
    state.todos.update(&todo).await?;

    Ok(ApiResponse::ok(
        "Todo updated successfully",
        TodoResponse::from(&todo),
    ))
}

/// Delete one of the signed-in user's todos
///
/// DELETE /user/todos/:id
pub async fn delete_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse<TodoResponse>, ApiError> {
    let todo = state
        .todos
        .delete_for_user(id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::bad_request(TODO_NOT_FOUND))?;

    Ok(ApiResponse::ok(
        "Todo deleted successfully",
        TodoResponse::from(&todo),
    ))
}

/// Due dates arrive either as RFC 3339 timestamps or as `YYYY-MM-DD` from
/// date inputs; bare dates mean midnight UTC.
mod due_date {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
    use serde::{de::Error, Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        let raw = raw.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Utc.from_utc_datetime(&naive));
        }
        if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            return Ok(Utc.from_utc_datetime(&midnight));
        }

        Err(format!("Invalid dueDate: {}", raw))
    }

    pub fn required<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(D::Error::custom)
    }

    pub fn optional<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) if !raw.trim().is_empty() => parse(&raw).map(Some).map_err(D::Error::custom),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn due_date_accepts_rfc3339() {
        let parsed = due_date::parse("2025-01-15T09:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 15, 7, 30, 0).unwrap());
    }

    #[test]
    fn due_date_accepts_plain_date() {
        let parsed = due_date::parse("2025-01-15").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn due_date_accepts_naive_timestamp() {
        let parsed = due_date::parse("2025-01-15T10:00:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap());
    }

    #[test]
    fn due_date_rejects_garbage() {
        assert!(due_date::parse("next tuesday").is_err());
    }

    #[test]
    fn create_request_requires_due_date() {
        let result: Result<CreateTodoRequest, _> = serde_json::from_str(r#"{"title": "x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_request_fields_are_optional() {
        let req: UpdateTodoRequest = serde_json::from_str(r#"{"isCompleted": false}"#).unwrap();
        assert_eq!(req.is_completed, Some(false));
        assert!(req.due_date.is_none());

        let req: UpdateTodoRequest =
            serde_json::from_str(r#"{"dueDate": "2025-03-01", "title": "t"}"#).unwrap();
        assert!(req.due_date.is_some());
    }
}
