/// Bearer-token authentication middleware (stage 1 of the request pipeline).
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::security::TokenError;
use crate::AppState;

/// Identity resolved from a verified access token, with the role already
/// expanded to its name so later stages never branch on representation.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Option<String>,
}

/// Verify the bearer token, load the acting identity and attach it to the
/// request. Fails 401 on a missing/invalid/expired token and 404 when the
/// token's subject no longer exists.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::authentication("No token provided"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::authentication("No token provided"))?;

    let claims = state.tokens.decode_access(token).map_err(|err| {
        // Expiry vs signature failure matters for logs only; the response
        // is uniform.
        match err {
            TokenError::Expired => tracing::debug!("access token expired"),
            other => tracing::debug!(reason = %other, "access token rejected"),
        }
        ApiError::authentication("Invalid or expired token")
    })?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::authentication("Invalid or expired token"))?;

    let user = state
        .store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let role = match user.role_id {
        Some(role_id) => state
            .store
            .find_role_by_id(role_id)
            .await?
            .map(|role| role.name),
        None => None,
    };

    req.extensions_mut().insert(CurrentUser {
        id: user.id,
        username: user.username,
        email: user.email,
        role,
    });

    Ok(next.run(req).await)
}
