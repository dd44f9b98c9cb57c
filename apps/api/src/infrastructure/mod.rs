// Infrastructure layer module
// Contains database adapters and external service integrations
// Follows Hexagonal Architecture

pub mod email;
pub mod google_oauth;
pub mod repositories;
