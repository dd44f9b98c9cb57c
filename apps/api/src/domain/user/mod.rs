// User domain module
// Contains the user aggregate root and its value objects

#![allow(clippy::module_inception)]

pub mod user;
pub mod value_objects;

pub use user::{PendingOtp, User, UserError, MAX_NAME_LEN};
pub use value_objects::{Email, OtpCode};
