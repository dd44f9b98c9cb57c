use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::value_objects::{Email, OtpCode};
use crate::auth::otp::otp_ttl;

/// Longest accepted display name, in characters
pub const MAX_NAME_LEN: usize = 255;

/// Errors raised by the user aggregate's business rules
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UserError {
    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Name must be at most 255 characters")]
    NameTooLong,

    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("OTP has expired")]
    OtpExpired,
}

/// An issued one-time passcode and the instant it stops being accepted
///
/// Keeping code and expiry in one value means they can only be set or
/// cleared together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOtp {
    pub code: OtpCode,
    pub expires_at: DateTime<Utc>,
}

impl PendingOtp {
    /// A code issued at `now`, valid for the standard OTP lifetime
    pub fn issue(code: OtpCode, now: DateTime<Utc>) -> Self {
        Self {
            code,
            expires_at: now + otp_ttl(),
        }
    }

    /// Expired once `now` is strictly past the expiry instant
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// User aggregate root
///
/// Owns the account's verification state and credentials.
///
/// # Invariants
/// - Name is never empty
/// - OTP code and expiry are both present or both absent
/// - A successful verification or password reset consumes the pending OTP
/// - OAuth-created accounts carry no password hash
///
/// # Example
/// ```
/// use chrono::Utc;
/// use todo_api::domain::user::{Email, OtpCode, User};
///
/// let now = Utc::now();
/// let code = OtpCode::parse("123456").unwrap();
/// let mut user = User::register(
///     "Ada".to_string(),
///     Email::new("ada@gmail.com").unwrap(),
///     "$2b$10$hash".to_string(),
///     code.clone(),
///     now,
/// )
/// .expect("valid user");
///
/// assert!(!user.is_verified());
/// user.verify_email(&code, now).expect("code accepted");
/// assert!(user.is_verified());
/// assert!(user.pending_otp().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct User {
    id: Uuid,
    name: String,
    email: Email,
    password_hash: Option<String>,
    is_verified: bool,
    pending_otp: Option<PendingOtp>,
    profile_image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Registers a new email/password account awaiting verification
    ///
    /// # Business Rules Enforced
    /// - Name must not be empty (after trimming)
    /// - Account starts unverified
    /// - A verification code valid for ten minutes is attached
    pub fn register(
        name: String,
        email: Email,
        password_hash: String,
        otp: OtpCode,
        now: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(UserError::EmptyName);
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(UserError::NameTooLong);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash: Some(password_hash),
            is_verified: false,
            pending_otp: Some(PendingOtp::issue(otp, now)),
            profile_image: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Creates a passwordless account from an OAuth identity
    ///
    /// The account is verified only if the provider vouches for the email.
    /// A blank display name falls back to the email's local part and an
    /// overlong one is truncated to [`MAX_NAME_LEN`] characters.
    pub fn from_oauth(
        name: String,
        email: Email,
        profile_image: Option<String>,
        email_verified: bool,
        now: DateTime<Utc>,
    ) -> Self {
        // Overlong provider names are truncated, never rejected
        let name = match name.trim() {
            "" => email.local_part().to_string(),
            trimmed => trimmed
                .chars()
                .take(MAX_NAME_LEN)
                .collect::<String>()
                .trim_end()
                .to_string(),
        };

        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash: None,
            is_verified: email_verified,
            pending_otp: None,
            profile_image: profile_image.filter(|url| !url.is_empty()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Attaches a fresh code, replacing any pending one
    pub fn issue_otp(&mut self, code: OtpCode, now: DateTime<Utc>) {
        self.pending_otp = Some(PendingOtp::issue(code, now));
        self.updated_at = now;
    }

    /// Checks `code` against the pending OTP without consuming it
    pub fn check_otp(&self, code: &OtpCode, now: DateTime<Utc>) -> Result<(), UserError> {
        let pending = self.pending_otp.as_ref().ok_or(UserError::InvalidOtp)?;
        if &pending.code != code {
            return Err(UserError::InvalidOtp);
        }
        if pending.is_expired(now) {
            return Err(UserError::OtpExpired);
        }
        Ok(())
    }

    /// Marks the email verified when `code` matches the pending OTP
    ///
    /// # Errors
    /// * `InvalidOtp` - no pending code, or the code differs
    /// * `OtpExpired` - the code matches but its expiry has passed
    pub fn verify_email(&mut self, code: &OtpCode, now: DateTime<Utc>) -> Result<(), UserError> {
        self.check_otp(code, now)?;
        self.is_verified = true;
        self.pending_otp = None;
        self.updated_at = now;
        Ok(())
    }

    /// Replaces the password hash when `code` matches the pending OTP
    ///
    /// Same checks as [`User::verify_email`]. Verification status is left
    /// unchanged.
    pub fn reset_password(
        &mut self,
        code: &OtpCode,
        new_password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<(), UserError> {
        self.check_otp(code, now)?;
        self.password_hash = Some(new_password_hash);
        self.pending_otp = None;
        self.updated_at = now;
        Ok(())
    }

    /// Stores `url` as the profile image if the user has none yet
    ///
    /// Returns true when the image changed.
    pub fn backfill_profile_image(&mut self, url: Option<&str>, now: DateTime<Utc>) -> bool {
        match (&self.profile_image, url) {
            (None, Some(url)) if !url.is_empty() => {
                self.profile_image = Some(url.to_string());
                self.updated_at = now;
                true
            }
            _ => false,
        }
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    /// None for accounts created through OAuth
    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    pub fn is_verified(&self) -> bool {
        self.is_verified
    }

    pub fn pending_otp(&self) -> Option<&PendingOtp> {
        self.pending_otp.as_ref()
    }

    pub fn profile_image(&self) -> Option<&str> {
        self.profile_image.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Reconstructs a User from persistence layer data
    ///
    /// Bypasses business rule validation since the data was validated
    /// before it was stored.
    ///
    /// # Note
    /// Only to be used by repository implementations.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        name: String,
        email: Email,
        password_hash: Option<String>,
        is_verified: bool,
        pending_otp: Option<PendingOtp>,
        profile_image: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            password_hash,
            is_verified,
            pending_otp,
            profile_image,
            created_at,
            updated_at,
        }
    }
}
