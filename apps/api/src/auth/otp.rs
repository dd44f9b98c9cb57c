// One-time passcodes for email verification and password reset

use chrono::Duration;
use rand::Rng;

use crate::domain::user::value_objects::OtpCode;

/// How long an issued code stays valid, in minutes
pub const OTP_TTL_MINUTES: i64 = 10;

/// Code lifetime as a duration
pub fn otp_ttl() -> Duration {
    Duration::minutes(OTP_TTL_MINUTES)
}

/// Generates a uniformly random six digit code in `100000..=999999`
///
/// # Example
/// ```
/// use todo_api::auth::otp::generate_otp;
///
/// let code = generate_otp();
/// assert_eq!(code.as_str().len(), 6);
/// ```
pub fn generate_otp() -> OtpCode {
    let value: u32 = rand::thread_rng().gen_range(100_000..=999_999);
    OtpCode::from_number(value)
}
