// Authentication primitives: password hashing, session tokens, one-time codes

pub mod jwt;
pub mod otp;
pub mod password;
