// Password hashing utilities
// Uses bcrypt for secure password hashing

use bcrypt::{hash, verify};

/// bcrypt work factor applied to every stored password
pub const BCRYPT_COST: u32 = 10;

/// Hashes a password using bcrypt
///
/// # Arguments
/// * `password` - The plaintext password to hash
///
/// # Returns
/// * `Ok(String)` - The bcrypt hash
/// * `Err(String)` - If hashing fails
///
/// # Example
/// ```
/// use todo_api::auth::password::hash_password;
///
/// let hash = hash_password("my_password").expect("valid hash");
/// assert!(hash.starts_with("$2"));
/// ```
pub fn hash_password(password: &str) -> Result<String, String> {
    hash(password, BCRYPT_COST).map_err(|e| e.to_string())
}

/// Verifies a password against a bcrypt hash
///
/// A hash that bcrypt cannot parse is reported as an error, not a mismatch.
///
/// # Example
/// ```
/// use todo_api::auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("my_password").unwrap();
/// assert!(verify_password("my_password", &hash).unwrap());
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    verify(password, hash).map_err(|e| e.to_string())
}
