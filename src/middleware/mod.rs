/// Request pipeline: bearer authentication, then role enforcement
pub mod auth;
pub mod rbac;

pub use auth::{authenticate, CurrentUser};
pub use rbac::RequireRole;
