/// Durable user/role store: the trait consumed by the core, plus the
/// Postgres implementation used in production.
pub mod postgres;

pub use postgres::PgCredentialStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::role::{NewPermission, UpdatePermissionRequest};
use crate::models::{NewUser, Permission, Role, RoleWithPermissions, User};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique-constraint violation; surfaces as a conflict at the boundary.
    #[error("duplicate value for unique field")]
    Duplicate,

    /// Any other persistence failure; surfaces as a 500-class error.
    #[error("credential store failure: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                return StoreError::Duplicate;
            }
        }
        StoreError::Backend(err.to_string())
    }
}

/// Contract for the durable credential store. All operations are fallible
/// I/O; lookups distinguish "absent" (`Ok(None)`) from store failure.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    /// Lookup by the stored refresh-token value; logout resolves the owning
    /// user this way.
    async fn find_user_by_refresh_token(&self, token: &str) -> Result<Option<User>, StoreError>;
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError>;
    /// Persist every mutable field of an existing user record.
    async fn save_user(&self, user: &User) -> Result<(), StoreError>;

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError>;
    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>, StoreError>;
    async fn create_role(&self, name: &str, permission_ids: &[Uuid]) -> Result<Role, StoreError>;
    async fn list_roles(&self) -> Result<Vec<RoleWithPermissions>, StoreError>;
    async fn role_with_permissions(
        &self,
        id: Uuid,
    ) -> Result<Option<RoleWithPermissions>, StoreError>;
    async fn update_role(&self, id: Uuid, name: Option<&str>) -> Result<Option<Role>, StoreError>;
    /// Replace the full permission set of a role. Returns false if the role
    /// does not exist.
    async fn replace_role_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<bool, StoreError>;
    async fn delete_role(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn create_permission(&self, new: NewPermission) -> Result<Permission, StoreError>;
    async fn list_permissions(&self) -> Result<Vec<Permission>, StoreError>;
    async fn find_permission_by_id(&self, id: Uuid) -> Result<Option<Permission>, StoreError>;
    async fn find_permission_by_name(&self, name: &str) -> Result<Option<Permission>, StoreError>;
    async fn update_permission(
        &self,
        id: Uuid,
        update: &UpdatePermissionRequest,
    ) -> Result<Option<Permission>, StoreError>;
    async fn delete_permission(&self, id: Uuid) -> Result<bool, StoreError>;
}
