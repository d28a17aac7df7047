/// Permission administration (Admin-gated CRUD).
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::db::StoreError;
use crate::error::ApiError;
use crate::models::role::{CreatePermissionRequest, NewPermission, UpdatePermissionRequest};
use crate::models::Permission;
use crate::AppState;

pub async fn create_permission(
    State(state): State<AppState>,
    Json(payload): Json<CreatePermissionRequest>,
) -> Result<(StatusCode, Json<Permission>), ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Permission name is required"));
    }

    let permission = state
        .store
        .create_permission(NewPermission {
            name: name.to_string(),
            resource: payload.resource,
            action: payload.action,
            description: payload.description,
        })
        .await
        .map_err(|err| match err {
            StoreError::Duplicate => ApiError::conflict("Permission name already exists"),
            other => ApiError::from(other),
        })?;

    Ok((StatusCode::CREATED, Json(permission)))
}

pub async fn list_permissions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Permission>>, ApiError> {
    Ok(Json(state.store.list_permissions().await?))
}

pub async fn get_permission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Permission>, ApiError> {
    state
        .store
        .find_permission_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Permission not found"))
}

pub async fn update_permission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePermissionRequest>,
) -> Result<Json<Permission>, ApiError> {
    if let Some(name) = payload.name.as_deref() {
        if name.trim().is_empty() {
            return Err(ApiError::validation("Permission name must not be blank"));
        }
    }

    state
        .store
        .update_permission(id, &payload)
        .await
        .map_err(|err| match err {
            StoreError::Duplicate => ApiError::conflict("Permission name already exists"),
            other => ApiError::from(other),
        })?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Permission not found"))
}

pub async fn delete_permission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.store.delete_permission(id).await? {
        return Err(ApiError::not_found("Permission not found"));
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Permission deleted",
    })))
}
