// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod postgres_todo_repository;
pub mod postgres_user_repository;

pub use postgres_todo_repository::PostgresTodoRepository;
pub use postgres_user_repository::PostgresUserRepository;

use crate::domain::repositories::RepositoryError;

/// Translates a sqlx failure, keeping unique violations distinguishable
pub(crate) fn map_sqlx_error(context: &str, err: sqlx::Error) -> RepositoryError {
    match err.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => {
            RepositoryError::Duplicate(format!("{}: {}", context, db_err.message()))
        }
        _ => RepositoryError::Database(format!("{}: {}", context, err)),
    }
}
