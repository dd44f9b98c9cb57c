use serde::{Deserialize, Serialize};
use std::fmt;

/// Email value object representing a valid, normalised email address
///
/// # Invariants
/// - Stored trimmed and lower-cased
/// - Exactly one '@' with a non-empty local part
/// - Domain has at least two non-empty dot-separated labels
/// - No whitespace anywhere
/// - Is immutable after construction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Creates a new Email value object
    ///
    /// # Example
    /// ```
    /// use todo_api::domain::user::value_objects::Email;
    ///
    /// let email = Email::new("  Test@Example.com ").expect("valid email");
    /// assert_eq!(email.as_str(), "test@example.com");
    /// ```
    pub fn new(email: impl Into<String>) -> Result<Self, String> {
        let email = email.into().trim().to_lowercase();
        if Self::is_valid(&email) {
            Ok(Email(email))
        } else {
            Err(format!("Invalid email: {}", email))
        }
    }

    fn is_valid(email: &str) -> bool {
        if email.len() > 254 || email.chars().any(char::is_whitespace) {
            return false;
        }

        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };

        if local.is_empty() || domain.contains('@') {
            return false;
        }

        let labels: Vec<&str> = domain.split('.').collect();
        labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
    }

    /// Returns true when the address belongs to `domain` (case-insensitive)
    pub fn has_domain(&self, domain: &str) -> bool {
        self.domain().eq_ignore_ascii_case(domain.trim_start_matches('@'))
    }

    /// Part after the '@'
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map(|(_, d)| d).unwrap_or_default()
    }

    /// Part before the '@'
    pub fn local_part(&self) -> &str {
        self.0.split_once('@').map(|(l, _)| l).unwrap_or_default()
    }

    /// Returns the email as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Six digit one-time passcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    pub const LENGTH: usize = 6;

    /// Parses a user-supplied code; surrounding whitespace is ignored
    ///
    /// # Example
    /// ```
    /// use todo_api::domain::user::value_objects::OtpCode;
    ///
    /// assert!(OtpCode::parse("123456").is_ok());
    /// assert!(OtpCode::parse("12345").is_err());
    /// assert!(OtpCode::parse("12a456").is_err());
    /// ```
    pub fn parse(code: &str) -> Result<Self, String> {
        let code = code.trim();
        if code.len() == Self::LENGTH && code.chars().all(|c| c.is_ascii_digit()) {
            Ok(OtpCode(code.to_string()))
        } else {
            Err("OTP must be exactly 6 digits".to_string())
        }
    }

    /// Builds a code from a number below one million, zero padded
    pub fn from_number(value: u32) -> Self {
        OtpCode(format!("{:06}", value % 1_000_000))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
