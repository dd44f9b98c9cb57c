use axum::extract::State;
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{hash_password_blocking, issue_token, verify_password_blocking};
use crate::api::errors::ApiError;
use crate::api::extract::ApiJson;
use crate::api::middleware::AuthUser;
use crate::api::response::ApiResponse;
use crate::api::session::{cleared_session_cookie, session_cookie};
use crate::api::state::AppState;
use crate::auth::otp::generate_otp;
use crate::domain::repositories::RepositoryError;
use crate::domain::user::{Email, OtpCode, User, UserError};
use crate::infrastructure::email::OtpPurpose;

/// Shortest accepted password
pub const MIN_PASSWORD_LEN: usize = 8;

const USER_EXISTS: &str = "User already exists. Please login.";
const INVALID_OTP: &str = "Invalid OTP";

/// Request body for user signup
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for email verification
///
/// `email` is optional; when given, the code is checked against that
/// account instead of being looked up on its own.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(rename = "verificationOTP")]
    pub verification_otp: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Request body for email/password sign in
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(rename = "verificationOTP")]
    pub verification_otp: String,
    pub new_password: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Account summary returned by signup, verification and sign in
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_verified: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            name: user.name().to_string(),
            email: user.email().to_string(),
            is_verified: user.is_verified(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub profile_image: Option<String>,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            name: user.name().to_string(),
            email: user.email().to_string(),
            profile_image: user.profile_image().map(str::to_string),
        }
    }
}

fn parse_signup_email(raw: &str, required_domain: Option<&str>) -> Result<Email, ApiError> {
    let message = match required_domain {
        Some(domain) => format!("Please enter a valid email address with @{}", domain),
        None => "Please enter a valid email address".to_string(),
    };

    let email = Email::new(raw).map_err(|_| ApiError::bad_request(message.clone()))?;
    match required_domain {
        Some(domain) if !email.has_domain(domain) => Err(ApiError::bad_request(message)),
        _ => Ok(email),
    }
}

fn check_password_length(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Resolves the account an OTP request refers to
///
/// With an email the account is looked up directly (and the code compared
/// later by the aggregate); without one the code itself is the lookup key.
async fn find_user_for_otp(
    state: &AppState,
    email: Option<&str>,
    code: &OtpCode,
) -> Result<Option<User>, ApiError> {
    match email {
        Some(raw) => match Email::new(raw) {
            Ok(email) => Ok(state.users.find_by_email(&email).await?),
            Err(_) => Ok(None),
        },
        None => Ok(state.users.find_by_otp(code).await?),
    }
}

/// Register a new user and email them a verification code
///
/// POST /auth/signup
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<(CookieJar, ApiResponse<UserResponse>), ApiError> {
    let email = parse_signup_email(&req.email, state.config.signup_email_domain.as_deref())?;
    check_password_length(&req.password)?;

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(ApiError::bad_request(USER_EXISTS));
    }

    let password_hash = hash_password_blocking(req.password).await?;
    let otp = generate_otp();
    let user = User::register(req.name, email, password_hash, otp.clone(), Utc::now())?;

    state.users.create(&user).await.map_err(|e| match e {
        RepositoryError::Duplicate(_) => ApiError::bad_request(USER_EXISTS),
        other => other.into(),
    })?;

    state
        .mailer
        .send_otp(user.email(), &otp, OtpPurpose::Verification)
        .await
        .map_err(ApiError::internal)?;

    let token = issue_token(&state, &user)?;
    tracing::info!(user_id = %user.id(), "User signed up");

    Ok((
        jar.add(session_cookie(token, state.config.cookie_secure)),
        ApiResponse::created(
            "User created successfully. Check your email for OTP verification.",
            UserResponse::from(&user),
        ),
    ))
}

/// Verify the email address with the code sent at signup
///
/// POST /auth/verify-otp
pub async fn verify_otp(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<VerifyOtpRequest>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let code = OtpCode::parse(&req.verification_otp)
        .map_err(|_| ApiError::bad_request(INVALID_OTP))?;

    let mut user = find_user_for_otp(&state, req.email.as_deref(), &code)
        .await?
        .ok_or_else(|| ApiError::bad_request(INVALID_OTP))?;

    user.verify_email(&code, Utc::now())?;
    state.users.update(&user).await?;

    tracing::info!(user_id = %user.id(), "Email verified");

    Ok(ApiResponse::ok(
        "Email verified successfully.",
        UserResponse::from(&user),
    ))
}

/// Sign in with email and password
///
/// POST /auth/signin
pub async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<SigninRequest>,
) -> Result<(CookieJar, ApiResponse<UserResponse>), ApiError> {
    let user = match Email::new(&req.email) {
        Ok(email) => state.users.find_by_email(&email).await?,
        Err(_) => None,
    }
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !user.is_verified() {
        return Err(ApiError::bad_request("User is not verified"));
    }

    // Accounts created through Google have no password to check against
    let Some(hash) = user.password_hash() else {
        tracing::warn!(user_id = %user.id(), "Password sign in attempted on OAuth account");
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    if !verify_password_blocking(req.password, hash.to_string()).await? {
        tracing::warn!(user_id = %user.id(), "Sign in with wrong password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = issue_token(&state, &user)?;
    tracing::info!(user_id = %user.id(), "User signed in");

    Ok((
        jar.add(session_cookie(token, state.config.cookie_secure)),
        ApiResponse::ok("User logged in successfully", UserResponse::from(&user)),
    ))
}

/// Issue a fresh code to the account's email for a password reset
///
/// POST /auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    let mut user = match Email::new(&req.email) {
        Ok(email) => state.users.find_by_email(&email).await?,
        Err(_) => None,
    }
    .ok_or_else(|| ApiError::bad_request("User not found"))?;

    let otp = generate_otp();
    user.issue_otp(otp.clone(), Utc::now());
    state.users.update(&user).await?;

    state
        .mailer
        .send_otp(user.email(), &otp, OtpPurpose::PasswordReset)
        .await
        .map_err(ApiError::internal)?;

    tracing::info!(user_id = %user.id(), "Password reset code issued");

    Ok(ApiResponse::message(
        "OTP sent to your email. Please check for email verification.",
    ))
}

/// Replace the password using an emailed code
///
/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    let code = OtpCode::parse(&req.verification_otp)
        .map_err(|_| ApiError::bad_request(INVALID_OTP))?;

    let mut user = find_user_for_otp(&state, req.email.as_deref(), &code)
        .await?
        .ok_or_else(|| ApiError::bad_request(INVALID_OTP))?;

    let now = Utc::now();
    let otp_error = |e: UserError| match e {
        UserError::OtpExpired => ApiError::bad_request("OTP expired"),
        other => other.into(),
    };

    // Reject bad codes before paying for a bcrypt hash
    user.check_otp(&code, now).map_err(otp_error)?;
    check_password_length(&req.new_password)?;

    let password_hash = hash_password_blocking(req.new_password).await?;
    user.reset_password(&code, password_hash, now).map_err(otp_error)?;
    state.users.update(&user).await?;

    tracing::info!(user_id = %user.id(), "Password reset");

    Ok(ApiResponse::message("Password reset successfully."))
}

/// Drop the session cookie
///
/// GET /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, ApiResponse<()>) {
    (
        jar.add(cleared_session_cookie(state.config.cookie_secure)),
        ApiResponse::message("Successfully logged out"),
    )
}

/// Profile of the signed-in user
///
/// GET /user/profile
pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<ApiResponse<ProfileResponse>, ApiError> {
    let user = state
        .users
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::ok(
        "User profile retrieved successfully",
        ProfileResponse::from(&user),
    ))
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
