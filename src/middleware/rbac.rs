/// Role enforcement middleware (stage 2 of the request pipeline).
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;

/// Layer admitting only identities whose role name is one of the allowed
/// names. Comparison is a case-sensitive exact match.
#[derive(Clone)]
pub struct RequireRole {
    allowed: Arc<Vec<String>>,
}

impl RequireRole {
    pub fn any_of<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: Arc::new(roles.into_iter().map(Into::into).collect()),
        }
    }
}

impl<S> Layer<S> for RequireRole {
    type Service = RequireRoleService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireRoleService {
            inner,
            allowed: self.allowed.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RequireRoleService<S> {
    inner: S,
    allowed: Arc<Vec<String>>,
}

impl<S> Service<Request<Body>> for RequireRoleService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let allowed = self.allowed.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // An empty requirement is a wiring mistake, never "deny all".
            if allowed.is_empty() {
                tracing::error!("role guard configured with an empty role set");
                return Ok(ApiError::configuration(
                    "RBAC misconfiguration: required role set is empty",
                )
                .into_response());
            }

            let Some(user) = req.extensions().get::<CurrentUser>().cloned() else {
                tracing::warn!("no authenticated identity on request, denying access");
                return Ok(
                    ApiError::authentication("Authentication required").into_response()
                );
            };

            match user.role.as_deref() {
                None => Ok(ApiError::authorization("Role not assigned").into_response()),
                Some(role) if allowed.iter().any(|name| name == role) => inner.call(req).await,
                Some(role) => {
                    tracing::warn!(
                        user_id = %user.id,
                        role = %role,
                        required = ?allowed.as_slice(),
                        "access denied"
                    );
                    Ok(ApiError::authorization("Access denied").into_response())
                }
            }
        })
    }
}
