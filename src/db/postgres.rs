/// sqlx-backed implementation of the credential store.
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::models::role::{NewPermission, UpdatePermissionRequest};
use crate::models::{NewUser, Permission, Role, RoleWithPermissions, User};

pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn permissions_for_role(&self, role_id: Uuid) -> Result<Vec<Permission>, StoreError> {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.id, p.name, p.resource, p.action, p.description
            FROM permissions p
            INNER JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    async fn attach_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<(), StoreError> {
        for permission_id in permission_ids {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_id, permission_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(role_id)
            .bind(permission_id)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_refresh_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE refresh_token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, fullname, password_hash, role_id, created_at, updated_at)
            VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
            RETURNING *
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.fullname)
        .bind(&new_user.password_hash)
        .bind(new_user.role_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET username = $1,
                email = $2,
                fullname = $3,
                password_hash = $4,
                role_id = $5,
                refresh_token = $6,
                refresh_token_expires_at = $7,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $8
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.fullname)
        .bind(&user.password_hash)
        .bind(user.role_id)
        .bind(&user.refresh_token)
        .bind(user.refresh_token_expires_at)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>, StoreError> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    async fn create_role(&self, name: &str, permission_ids: &[Uuid]) -> Result<Role, StoreError> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (id, name)
            VALUES (gen_random_uuid(), $1)
            RETURNING id, name
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        self.attach_permissions(role.id, permission_ids).await?;

        Ok(role)
    }

    async fn list_roles(&self) -> Result<Vec<RoleWithPermissions>, StoreError> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        let mut expanded = Vec::with_capacity(roles.len());
        for role in roles {
            let permissions = self.permissions_for_role(role.id).await?;
            expanded.push(RoleWithPermissions {
                id: role.id,
                name: role.name,
                permissions,
            });
        }

        Ok(expanded)
    }

    async fn role_with_permissions(
        &self,
        id: Uuid,
    ) -> Result<Option<RoleWithPermissions>, StoreError> {
        let Some(role) = self.find_role_by_id(id).await? else {
            return Ok(None);
        };

        let permissions = self.permissions_for_role(role.id).await?;
        Ok(Some(RoleWithPermissions {
            id: role.id,
            name: role.name,
            permissions,
        }))
    }

    async fn update_role(&self, id: Uuid, name: Option<&str>) -> Result<Option<Role>, StoreError> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles
            SET name = COALESCE($2, name)
            WHERE id = $1
            RETURNING id, name
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    async fn replace_role_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<bool, StoreError> {
        if self.find_role_by_id(role_id).await?.is_none() {
            return Ok(false);
        }

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&self.pool)
            .await?;

        self.attach_permissions(role_id, permission_ids).await?;

        Ok(true)
    }

    async fn delete_role(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_permission(&self, new: NewPermission) -> Result<Permission, StoreError> {
        let permission = sqlx::query_as::<_, Permission>(
            r#"
            INSERT INTO permissions (id, name, resource, action, description)
            VALUES (gen_random_uuid(), $1, $2, $3, $4)
            RETURNING id, name, resource, action, description
            "#,
        )
        .bind(&new.name)
        .bind(&new.resource)
        .bind(&new.action)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(permission)
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, StoreError> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT id, name, resource, action, description FROM permissions ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(permissions)
    }

    async fn find_permission_by_id(&self, id: Uuid) -> Result<Option<Permission>, StoreError> {
        let permission = sqlx::query_as::<_, Permission>(
            "SELECT id, name, resource, action, description FROM permissions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(permission)
    }

    async fn find_permission_by_name(&self, name: &str) -> Result<Option<Permission>, StoreError> {
        let permission = sqlx::query_as::<_, Permission>(
            "SELECT id, name, resource, action, description FROM permissions WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(permission)
    }

    async fn update_permission(
        &self,
        id: Uuid,
        update: &UpdatePermissionRequest,
    ) -> Result<Option<Permission>, StoreError> {
        let permission = sqlx::query_as::<_, Permission>(
            r#"
            UPDATE permissions
            SET name = COALESCE($2, name),
                resource = COALESCE($3, resource),
                action = COALESCE($4, action),
                description = COALESCE($5, description)
            WHERE id = $1
            RETURNING id, name, resource, action, description
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.resource)
        .bind(&update.action)
        .bind(&update.description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(permission)
    }

    async fn delete_permission(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
