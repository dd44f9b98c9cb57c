use async_trait::async_trait;
use uuid::Uuid;

use super::RepositoryResult;
use crate::domain::todo::Todo;

/// Repository trait for the Todo aggregate
///
/// Lookups that take a `user_id` only match todos owned by that user, so a
/// foreign todo is indistinguishable from a missing one.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn create(&self, todo: &Todo) -> RepositoryResult<()>;

    /// All todos of a user, earliest due date first
    async fn find_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Todo>>;

    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> RepositoryResult<Option<Todo>>;

    async fn update(&self, todo: &Todo) -> RepositoryResult<()>;

    /// Delete and return the todo, or `None` when the user owns no such todo
    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> RepositoryResult<Option<Todo>>;
}
