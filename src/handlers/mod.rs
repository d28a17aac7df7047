/// HTTP request handlers (REST API)
pub mod auth;
pub mod permissions;
pub mod probes;
pub mod roles;

pub use auth::{login, logout, refresh_token, register};
pub use probes::{admin_only, health, user_only};
