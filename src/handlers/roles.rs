/// Role administration (Admin-gated CRUD).
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::db::StoreError;
use crate::error::ApiError;
use crate::models::role::{AssignPermissionsRequest, CreateRoleRequest, UpdateRoleRequest};
use crate::models::RoleWithPermissions;
use crate::AppState;

async fn ensure_permissions_exist(state: &AppState, ids: &[Uuid]) -> Result<(), ApiError> {
    for id in ids {
        if state.store.find_permission_by_id(*id).await?.is_none() {
            return Err(ApiError::not_found(format!("Permission {id} not found")));
        }
    }
    Ok(())
}

async fn expanded_role(state: &AppState, id: Uuid) -> Result<RoleWithPermissions, ApiError> {
    state
        .store
        .role_with_permissions(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Role not found"))
}

pub async fn create_role(
    State(state): State<AppState>,
    Json(payload): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<RoleWithPermissions>), ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Role name is required"));
    }

    ensure_permissions_exist(&state, &payload.permission_ids).await?;

    let role = state
        .store
        .create_role(name, &payload.permission_ids)
        .await
        .map_err(|err| match err {
            StoreError::Duplicate => ApiError::conflict("Role name already exists"),
            other => ApiError::from(other),
        })?;

    let role = expanded_role(&state, role.id).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn list_roles(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoleWithPermissions>>, ApiError> {
    Ok(Json(state.store.list_roles().await?))
}

pub async fn get_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoleWithPermissions>, ApiError> {
    Ok(Json(expanded_role(&state, id).await?))
}

pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<RoleWithPermissions>, ApiError> {
    if let Some(name) = payload.name.as_deref() {
        if name.trim().is_empty() {
            return Err(ApiError::validation("Role name must not be blank"));
        }
        state
            .store
            .update_role(id, Some(name.trim()))
            .await
            .map_err(|err| match err {
                StoreError::Duplicate => ApiError::conflict("Role name already exists"),
                other => ApiError::from(other),
            })?
            .ok_or_else(|| ApiError::not_found("Role not found"))?;
    }

    if let Some(permission_ids) = payload.permission_ids.as_deref() {
        ensure_permissions_exist(&state, permission_ids).await?;
        if !state
            .store
            .replace_role_permissions(id, permission_ids)
            .await?
        {
            return Err(ApiError::not_found("Role not found"));
        }
    }

    Ok(Json(expanded_role(&state, id).await?))
}

pub async fn assign_permissions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignPermissionsRequest>,
) -> Result<Json<RoleWithPermissions>, ApiError> {
    ensure_permissions_exist(&state, &payload.permission_ids).await?;

    if !state
        .store
        .replace_role_permissions(id, &payload.permission_ids)
        .await?
    {
        return Err(ApiError::not_found("Role not found"));
    }

    Ok(Json(expanded_role(&state, id).await?))
}

pub async fn delete_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.store.delete_role(id).await? {
        return Err(ApiError::not_found("Role not found"));
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Role deleted",
    })))
}
