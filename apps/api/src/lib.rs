//! Todo API library
//!
//! Account lifecycle (signup with emailed OTP, signin, password reset,
//! Google login) and per-user todo management behind a cookie session.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
