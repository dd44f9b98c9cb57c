use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::map_sqlx_error;
use crate::domain::repositories::{RepositoryError, RepositoryResult, UserRepository};
use crate::domain::user::{Email, OtpCode, PendingOtp, User};

const USER_COLUMNS: &str = r#"
    id, name, email, password_hash, is_verified,
    verification_otp, otp_expires_at, profile_image,
    created_at, updated_at
"#;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: Option<String>,
    is_verified: bool,
    verification_otp: Option<String>,
    otp_expires_at: Option<DateTime<Utc>>,
    profile_image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::new(&r.email)
            .map_err(|e| RepositoryError::Database(format!("Invalid email from database: {}", e)))?;

        let pending_otp = match (r.verification_otp, r.otp_expires_at) {
            (Some(code), Some(expires_at)) => Some(PendingOtp {
                code: OtpCode::parse(&code).map_err(|e| {
                    RepositoryError::Database(format!("Invalid OTP from database: {}", e))
                })?,
                expires_at,
            }),
            _ => None,
        };

        Ok(User::from_persistence(
            r.id,
            r.name,
            email,
            r.password_hash,
            r.is_verified,
            pending_otp,
            r.profile_image,
            r.created_at,
            r.updated_at,
        ))
    }
}

/// PostgreSQL implementation of UserRepository
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a new PostgresUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &User) -> RepositoryResult<()> {
        let otp = user.pending_otp();

        sqlx::query(
            r#"
            INSERT INTO users (
                id, name, email, password_hash, is_verified,
                verification_otp, otp_expires_at, profile_image,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id())
        .bind(user.name())
        .bind(user.email().as_str())
        .bind(user.password_hash())
        .bind(user.is_verified())
        .bind(otp.map(|o| o.code.as_str()))
        .bind(otp.map(|o| o.expires_at))
        .bind(user.profile_image())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to create user", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to find user by id", e))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to find user by email", e))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_otp(&self, code: &OtpCode) -> RepositoryResult<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE verification_otp = $1 ORDER BY updated_at DESC LIMIT 1",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to find user by OTP", e))?;

        row.map(User::try_from).transpose()
    }

    async fn update(&self, user: &User) -> RepositoryResult<()> {
        let otp = user.pending_otp();

        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2,
                password_hash = $3,
                is_verified = $4,
                verification_otp = $5,
                otp_expires_at = $6,
                profile_image = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(user.id())
        .bind(user.name())
        .bind(user.password_hash())
        .bind(user.is_verified())
        .bind(otp.map(|o| o.code.as_str()))
        .bind(otp.map(|o| o.expires_at))
        .bind(user.profile_image())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to update user", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("User not found: {}", user.id())));
        }

        Ok(())
    }
}
