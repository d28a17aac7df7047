/// Route definitions and middleware stacking.
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::middleware::{authenticate, RequireRole};
use crate::AppState;

/// Assemble the full application router.
///
/// Layer order on the protected routers: `authenticate` is applied last so
/// it runs first, then the per-group `RequireRole` guard, then the handler.
pub fn app(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/v1/auth/register", post(handlers::register))
        .route("/api/v1/auth/login", post(handlers::login))
        .route("/api/v1/auth/refresh", post(handlers::refresh_token))
        .route("/api/v1/auth/logout", post(handlers::logout))
        .route("/health", get(handlers::health));

    let user_probe = Router::new()
        .route("/api/v1/rbac/user-only", get(handlers::user_only))
        .layer(RequireRole::any_of(["User"]));

    let admin_probe = Router::new()
        .route("/api/v1/rbac/admin-only", get(handlers::admin_only))
        .layer(RequireRole::any_of(["Admin"]));

    let admin_api = Router::new()
        .route(
            "/api/v1/roles",
            post(handlers::roles::create_role).get(handlers::roles::list_roles),
        )
        .route(
            "/api/v1/roles/:id",
            get(handlers::roles::get_role)
                .put(handlers::roles::update_role)
                .delete(handlers::roles::delete_role),
        )
        .route(
            "/api/v1/roles/:id/permissions",
            post(handlers::roles::assign_permissions),
        )
        .route(
            "/api/v1/permissions",
            post(handlers::permissions::create_permission)
                .get(handlers::permissions::list_permissions),
        )
        .route(
            "/api/v1/permissions/:id",
            get(handlers::permissions::get_permission)
                .put(handlers::permissions::update_permission)
                .delete(handlers::permissions::delete_permission),
        )
        .layer(RequireRole::any_of(["Admin"]));

    let protected = user_probe
        .merge(admin_probe)
        .merge(admin_api)
        .layer(middleware::from_fn_with_state(state.clone(), authenticate));

    public.merge(protected).with_state(state)
}
