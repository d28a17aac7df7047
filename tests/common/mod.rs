#![allow(dead_code)]

//! Shared test support: an in-memory credential store and request helpers.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use uuid::Uuid;

use rbac_service::db::{CredentialStore, StoreError};
use rbac_service::models::role::{NewPermission, UpdatePermissionRequest};
use rbac_service::models::{NewUser, Permission, Role, RoleWithPermissions, User};
use rbac_service::security::TokenCodec;
use rbac_service::{routes, seed, AppState};

pub const ACCESS_SECRET: &str = "test-access-secret";
pub const REFRESH_SECRET: &str = "test-refresh-secret";

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    roles: Vec<Role>,
    permissions: Vec<Permission>,
    role_permissions: Vec<(Uuid, Uuid)>,
}

/// In-memory stand-in for the durable store; same contract, no I/O.
#[derive(Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    fn expand(&self, inner: &Inner, role: &Role) -> RoleWithPermissions {
        let mut permissions: Vec<Permission> = inner
            .role_permissions
            .iter()
            .filter(|(role_id, _)| *role_id == role.id)
            .filter_map(|(_, permission_id)| {
                inner
                    .permissions
                    .iter()
                    .find(|p| p.id == *permission_id)
                    .cloned()
            })
            .collect();
        permissions.sort_by(|a, b| a.name.cmp(&b.name));

        RoleWithPermissions {
            id: role.id,
            name: role.name.clone(),
            permissions,
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_refresh_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .iter()
            .find(|u| u.refresh_token.as_deref() == Some(token))
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .users
            .iter()
            .any(|u| u.username == new_user.username || u.email == new_user.email)
        {
            return Err(StoreError::Duplicate);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            fullname: new_user.fullname,
            password_hash: new_user.password_hash,
            role_id: new_user.role_id,
            refresh_token: None,
            refresh_token_expires_at: None,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => {
                *existing = user.clone();
                existing.updated_at = Utc::now();
                Ok(())
            }
            None => Err(StoreError::Backend("user record not found".to_string())),
        }
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.roles.iter().find(|r| r.name == name).cloned())
    }

    async fn find_role_by_id(&self, id: Uuid) -> Result<Option<Role>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.roles.iter().find(|r| r.id == id).cloned())
    }

    async fn create_role(&self, name: &str, permission_ids: &[Uuid]) -> Result<Role, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.roles.iter().any(|r| r.name == name) {
            return Err(StoreError::Duplicate);
        }

        let role = Role {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        inner.roles.push(role.clone());
        for permission_id in permission_ids {
            inner.role_permissions.push((role.id, *permission_id));
        }
        Ok(role)
    }

    async fn list_roles(&self) -> Result<Vec<RoleWithPermissions>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut roles: Vec<RoleWithPermissions> = inner
            .roles
            .iter()
            .map(|role| self.expand(&inner, role))
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn role_with_permissions(
        &self,
        id: Uuid,
    ) -> Result<Option<RoleWithPermissions>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .roles
            .iter()
            .find(|r| r.id == id)
            .map(|role| self.expand(&inner, role)))
    }

    async fn update_role(&self, id: Uuid, name: Option<&str>) -> Result<Option<Role>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(name) = name {
            if inner.roles.iter().any(|r| r.name == name && r.id != id) {
                return Err(StoreError::Duplicate);
            }
        }

        let Some(index) = inner.roles.iter().position(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(name) = name {
            inner.roles[index].name = name.to_string();
        }
        Ok(Some(inner.roles[index].clone()))
    }

    async fn replace_role_permissions(
        &self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.roles.iter().any(|r| r.id == role_id) {
            return Ok(false);
        }

        inner.role_permissions.retain(|(rid, _)| *rid != role_id);
        for permission_id in permission_ids {
            inner.role_permissions.push((role_id, *permission_id));
        }
        Ok(true)
    }

    async fn delete_role(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.roles.len();
        inner.roles.retain(|r| r.id != id);
        if inner.roles.len() == before {
            return Ok(false);
        }

        // Mirror the FK behavior: join rows cascade, user references null out.
        inner.role_permissions.retain(|(rid, _)| *rid != id);
        for user in inner.users.iter_mut() {
            if user.role_id == Some(id) {
                user.role_id = None;
            }
        }
        Ok(true)
    }

    async fn create_permission(&self, new: NewPermission) -> Result<Permission, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.permissions.iter().any(|p| p.name == new.name) {
            return Err(StoreError::Duplicate);
        }

        let permission = Permission {
            id: Uuid::new_v4(),
            name: new.name,
            resource: new.resource,
            action: new.action,
            description: new.description,
        };
        inner.permissions.push(permission.clone());
        Ok(permission)
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut permissions = inner.permissions.clone();
        permissions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(permissions)
    }

    async fn find_permission_by_id(&self, id: Uuid) -> Result<Option<Permission>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.permissions.iter().find(|p| p.id == id).cloned())
    }

    async fn find_permission_by_name(&self, name: &str) -> Result<Option<Permission>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.permissions.iter().find(|p| p.name == name).cloned())
    }

    async fn update_permission(
        &self,
        id: Uuid,
        update: &UpdatePermissionRequest,
    ) -> Result<Option<Permission>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(name) = update.name.as_deref() {
            if inner.permissions.iter().any(|p| p.name == name && p.id != id) {
                return Err(StoreError::Duplicate);
            }
        }

        let Some(index) = inner.permissions.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        let permission = &mut inner.permissions[index];
        if let Some(name) = update.name.as_deref() {
            permission.name = name.to_string();
        }
        if update.resource.is_some() {
            permission.resource = update.resource.clone();
        }
        if update.action.is_some() {
            permission.action = update.action.clone();
        }
        if update.description.is_some() {
            permission.description = update.description.clone();
        }
        Ok(Some(permission.clone()))
    }

    async fn delete_permission(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.permissions.len();
        inner.permissions.retain(|p| p.id != id);
        if inner.permissions.len() == before {
            return Ok(false);
        }
        inner.role_permissions.retain(|(_, pid)| *pid != id);
        Ok(true)
    }
}

fn test_codec() -> Arc<TokenCodec> {
    Arc::new(TokenCodec::new(
        ACCESS_SECRET,
        REFRESH_SECRET,
        Duration::hours(1),
        Duration::days(7),
    ))
}

/// App over a fresh in-memory store with the default roles seeded.
pub async fn test_app() -> (Router, AppState) {
    let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
    let state = AppState::new(store, test_codec());
    seed::ensure_default_roles(state.store.as_ref())
        .await
        .expect("seeding the in-memory store cannot fail");
    (routes::app(state.clone()), state)
}

/// App whose store was never seeded; registration must surface the missing
/// default role as a configuration error.
pub fn unseeded_app() -> (Router, AppState) {
    let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
    let state = AppState::new(store, test_codec());
    (routes::app(state.clone()), state)
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn authed_json_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn response_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is JSON")
    };
    (status, value)
}

/// Register and log in a user, returning (access_token, refresh_token).
pub async fn register_and_login(
    app: &Router,
    username: &str,
    email: &str,
    password: &str,
) -> (String, String) {
    use tower::ServiceExt;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register",
            serde_json::json!({
                "username": username,
                "email": email,
                "fullname": "Test User",
                "password": password,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            serde_json::json!({ "email": email, "password": password }),
        ))
        .await
        .unwrap();
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK);

    (
        body["accessToken"].as_str().unwrap().to_string(),
        body["refreshToken"].as_str().unwrap().to_string(),
    )
}

/// Switch an existing user onto the seeded Admin role.
pub async fn promote_to_admin(state: &AppState, email: &str) {
    let admin = state
        .store
        .find_role_by_name("Admin")
        .await
        .unwrap()
        .expect("Admin role is seeded");
    let mut user = state
        .store
        .find_user_by_email(email)
        .await
        .unwrap()
        .expect("user exists");
    user.role_id = Some(admin.id);
    state.store.save_user(&user).await.unwrap();
}
