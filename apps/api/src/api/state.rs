use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::domain::repositories::{TodoRepository, UserRepository};
use crate::infrastructure::email::{create_mailer, OtpMailer};
use crate::infrastructure::google_oauth::{GoogleOAuthClient, OAuthProvider};
use crate::infrastructure::repositories::{PostgresTodoRepository, PostgresUserRepository};

/// Shared state handed to every handler
///
/// Ports are trait objects so tests can swap in in-memory adapters.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub todos: Arc<dyn TodoRepository>,
    pub mailer: Arc<dyn OtpMailer>,
    /// None when Google login is not configured
    pub oauth: Option<Arc<dyn OAuthProvider>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        todos: Arc<dyn TodoRepository>,
        mailer: Arc<dyn OtpMailer>,
        oauth: Option<Arc<dyn OAuthProvider>>,
        config: AppConfig,
    ) -> Self {
        Self {
            users,
            todos,
            mailer,
            oauth,
            config: Arc::new(config),
        }
    }

    /// Wires the Postgres repositories and the configured mailer and OAuth client
    pub fn from_pool(pool: PgPool, config: AppConfig) -> Self {
        let mailer: Arc<dyn OtpMailer> = Arc::from(create_mailer(config.smtp.as_ref()));

        let oauth = config
            .google
            .clone()
            .and_then(|google| match GoogleOAuthClient::new(google) {
                Ok(client) => {
                    tracing::info!("Google OAuth enabled");
                    Some(Arc::new(client) as Arc<dyn OAuthProvider>)
                }
                Err(e) => {
                    tracing::warn!("Google OAuth disabled: {}", e);
                    None
                }
            });

        Self::new(
            Arc::new(PostgresUserRepository::new(pool.clone())),
            Arc::new(PostgresTodoRepository::new(pool)),
            mailer,
            oauth,
            config,
        )
    }
}
