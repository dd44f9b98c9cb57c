// Repository ports (interfaces) for the domain aggregates
// Infrastructure provides the database-backed implementations

pub mod todo_repository;
pub mod user_repository;

pub use todo_repository::TodoRepository;
pub use user_repository::UserRepository;

use thiserror::Error;

/// Errors surfaced by any repository implementation
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A unique constraint rejected the write (e.g. email already taken)
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
