use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::map_sqlx_error;
use crate::domain::repositories::{RepositoryError, RepositoryResult, TodoRepository};
use crate::domain::todo::Todo;

#[derive(sqlx::FromRow)]
struct TodoRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: Option<String>,
    is_completed: bool,
    due_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TodoRow> for Todo {
    fn from(r: TodoRow) -> Self {
        Todo::from_persistence(
            r.id,
            r.user_id,
            r.title,
            r.description,
            r.is_completed,
            r.due_date,
            r.created_at,
            r.updated_at,
        )
    }
}

/// PostgreSQL implementation of TodoRepository
///
/// Every query that takes a user id filters on `user_id`, which is how
/// ownership is enforced at the storage level.
#[derive(Clone)]
pub struct PostgresTodoRepository {
    pool: PgPool,
}

impl PostgresTodoRepository {
    /// Creates a new PostgresTodoRepository
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TodoRepository for PostgresTodoRepository {
    async fn create(&self, todo: &Todo) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO todos (
                id, user_id, title, description, is_completed,
                due_date, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(todo.id())
        .bind(todo.user_id())
        .bind(todo.title())
        .bind(todo.description())
        .bind(todo.is_completed())
        .bind(todo.due_date())
        .bind(todo.created_at())
        .bind(todo.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to create todo", e))?;

        Ok(())
    }

    async fn find_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Todo>> {
        let rows = sqlx::query_as::<_, TodoRow>(
            r#"
            SELECT id, user_id, title, description, is_completed,
                   due_date, created_at, updated_at
            FROM todos
            WHERE user_id = $1
            ORDER BY due_date ASC, created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to find todos by user", e))?;

        Ok(rows.into_iter().map(Todo::from).collect())
    }

    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> RepositoryResult<Option<Todo>> {
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            SELECT id, user_id, title, description, is_completed,
                   due_date, created_at, updated_at
            FROM todos
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to find todo", e))?;

        Ok(row.map(Todo::from))
    }

    async fn update(&self, todo: &Todo) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE todos
            SET title = $3,
                description = $4,
                is_completed = $5,
                due_date = $6,
                updated_at = $7
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(todo.id())
        .bind(todo.user_id())
        .bind(todo.title())
        .bind(todo.description())
        .bind(todo.is_completed())
        .bind(todo.due_date())
        .bind(todo.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to update todo", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Todo not found: {}", todo.id())));
        }

        Ok(())
    }

    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> RepositoryResult<Option<Todo>> {
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            DELETE FROM todos
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, description, is_completed,
                      due_date, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to delete todo", e))?;

        Ok(row.map(Todo::from))
    }
}
