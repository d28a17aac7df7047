/// Data models for users, roles and permissions
pub mod role;
pub mod user;

pub use role::{Permission, Role, RoleWithPermissions};
pub use user::{NewUser, User, UserSummary};
