use async_trait::async_trait;
use uuid::Uuid;

use super::RepositoryResult;
use crate::domain::user::{Email, OtpCode, User};

/// Repository trait for the User aggregate
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; a taken email yields `RepositoryError::Duplicate`
    async fn create(&self, user: &User) -> RepositoryResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> RepositoryResult<Option<User>>;

    /// Find the user holding `code` as their pending OTP
    ///
    /// When several users happen to hold the same code, the most recently
    /// updated one is returned.
    async fn find_by_otp(&self, code: &OtpCode) -> RepositoryResult<Option<User>>;

    /// Persist every mutable field of an existing user
    async fn update(&self, user: &User) -> RepositoryResult<()>;
}
