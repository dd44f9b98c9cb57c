//! Shared fixtures for the HTTP-level tests
//!
//! The router runs against in-memory adapters so these tests need no
//! database, SMTP server or Google account.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::Value;
use tower::util::ServiceExt;
use uuid::Uuid;

use todo_api::api::{router, AppState};
use todo_api::config::AppConfig;
use todo_api::domain::repositories::{
    RepositoryError, RepositoryResult, TodoRepository, UserRepository,
};
use todo_api::domain::todo::Todo;
use todo_api::domain::user::{Email, OtpCode, PendingOtp, User};
use todo_api::infrastructure::email::{EmailError, OtpMailer, OtpPurpose};
use todo_api::infrastructure::google_oauth::{OAuthError, OAuthProfile, OAuthProvider};

pub const TEST_JWT_SECRET: &str = "integration-test-secret";
pub const GOOD_OAUTH_CODE: &str = "good-code";

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn get_by_email(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email().as_str() == email)
            .cloned()
    }

    /// Moves every pending code's expiry into the past
    pub fn expire_otps(&self) {
        let past = Utc::now() - Duration::minutes(1);
        let mut users = self.users.lock().unwrap();

        for user in users.values_mut() {
            if let Some(otp) = user.pending_otp().cloned() {
                *user = User::from_persistence(
                    user.id(),
                    user.name().to_string(),
                    user.email().clone(),
                    user.password_hash().map(str::to_string),
                    user.is_verified(),
                    Some(PendingOtp {
                        code: otp.code,
                        expires_at: past,
                    }),
                    user.profile_image().map(str::to_string),
                    user.created_at(),
                    user.updated_at(),
                );
            }
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> RepositoryResult<()> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email() == user.email()) {
            return Err(RepositoryError::Duplicate(format!(
                "User with email {} already exists",
                user.email()
            )));
        }
        users.insert(user.id(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> RepositoryResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email() == email)
            .cloned())
    }

    async fn find_by_otp(&self, code: &OtpCode) -> RepositoryResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.pending_otp().map(|otp| &otp.code) == Some(code))
            .max_by_key(|u| u.updated_at())
            .cloned())
    }

    async fn update(&self, user: &User) -> RepositoryResult<()> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&user.id()) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(format!("User {} not found", user.id()))),
        }
    }
}

#[derive(Default)]
pub struct InMemoryTodoRepository {
    todos: Mutex<HashMap<Uuid, Todo>>,
}

impl InMemoryTodoRepository {
    pub fn count(&self) -> usize {
        self.todos.lock().unwrap().len()
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn create(&self, todo: &Todo) -> RepositoryResult<()> {
        self.todos.lock().unwrap().insert(todo.id(), todo.clone());
        Ok(())
    }

    async fn find_by_user(&self, user_id: Uuid) -> RepositoryResult<Vec<Todo>> {
        let mut todos: Vec<Todo> = self
            .todos
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.is_owned_by(user_id))
            .cloned()
            .collect();
        todos.sort_by_key(|t| t.due_date());
        Ok(todos)
    }

    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> RepositoryResult<Option<Todo>> {
        Ok(self
            .todos
            .lock()
            .unwrap()
            .get(&id)
            .filter(|t| t.is_owned_by(user_id))
            .cloned())
    }

    async fn update(&self, todo: &Todo) -> RepositoryResult<()> {
        let mut todos = self.todos.lock().unwrap();
        match todos.get_mut(&todo.id()) {
            Some(existing) if existing.is_owned_by(todo.user_id()) => {
                *existing = todo.clone();
                Ok(())
            }
            _ => Err(RepositoryError::NotFound(format!("Todo {} not found", todo.id()))),
        }
    }

    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> RepositoryResult<Option<Todo>> {
        let mut todos = self.todos.lock().unwrap();
        let owned = todos.get(&id).is_some_and(|t| t.is_owned_by(user_id));
        Ok(if owned { todos.remove(&id) } else { None })
    }
}

/// Captures outgoing codes instead of sending them
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String, OtpPurpose)>>,
}

impl RecordingMailer {
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _, _)| to == email)
            .map(|(_, code, _)| code.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last_purpose(&self) -> Option<OtpPurpose> {
        self.sent.lock().unwrap().last().map(|(_, _, purpose)| *purpose)
    }
}

#[async_trait]
impl OtpMailer for RecordingMailer {
    async fn send_otp(
        &self,
        to: &Email,
        code: &OtpCode,
        purpose: OtpPurpose,
    ) -> Result<(), EmailError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), code.to_string(), purpose));
        Ok(())
    }
}

/// Accepts only [`GOOD_OAUTH_CODE`] and answers with a fixed profile
pub struct FakeOAuthProvider {
    pub profile: OAuthProfile,
}

impl FakeOAuthProvider {
    pub fn for_email(email: &str) -> Self {
        Self {
            profile: OAuthProfile {
                email: email.to_string(),
                email_verified: true,
                name: "Google User".to_string(),
                picture: Some("https://lh3.googleusercontent.com/a/photo".to_string()),
            },
        }
    }
}

#[async_trait]
impl OAuthProvider for FakeOAuthProvider {
    fn authorize_url(&self, state: &str) -> Result<String, OAuthError> {
        Ok(format!("https://accounts.example.com/auth?state={}", state))
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthProfile, OAuthError> {
        if code == GOOD_OAUTH_CODE {
            Ok(self.profile.clone())
        } else {
            Err(OAuthError::TokenExchange("invalid_grant".to_string()))
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub users: Arc<InMemoryUserRepository>,
    pub todos: Arc<InMemoryTodoRepository>,
    pub mailer: Arc<RecordingMailer>,
}

pub fn test_config() -> AppConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("DATABASE_URL", "postgresql://unused"),
        ("JWT_SECRET", TEST_JWT_SECRET),
        ("UI_URL", "http://localhost:5173"),
    ]);

    AppConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
        .expect("test config is valid")
}

pub fn test_app() -> TestApp {
    build_app(None)
}

pub fn test_app_with_oauth(provider: FakeOAuthProvider) -> TestApp {
    build_app(Some(Arc::new(provider)))
}

fn build_app(oauth: Option<Arc<dyn OAuthProvider>>) -> TestApp {
    let users = Arc::new(InMemoryUserRepository::default());
    let todos = Arc::new(InMemoryTodoRepository::default());
    let mailer = Arc::new(RecordingMailer::default());

    let state = AppState::new(
        users.clone(),
        todos.clone(),
        mailer.clone(),
        oauth,
        test_config(),
    );

    TestApp {
        router: router(state),
        users,
        todos,
        mailer,
    }
}

/// A response reduced to what the assertions look at
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }

    /// Value of the named cookie in the Set-Cookie headers
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.set_cookie(name).and_then(|raw| {
            raw.split(';')
                .next()
                .and_then(|pair| pair.split_once('='))
                .map(|(_, value)| value.to_string())
        })
    }

    /// Full Set-Cookie header for the named cookie
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{}=", name);
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&prefix))
            .map(str::to_string)
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

pub async fn send(app: &TestApp, request: Request<Body>) -> TestResponse {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("token={}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("token={}", token));
    }
    builder.body(Body::empty()).unwrap()
}
