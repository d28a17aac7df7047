// RBAC Service Library

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod routes;
pub mod security;
pub mod seed;
pub mod services;

pub use error::{ApiError, ApiResult};

// Re-export commonly used types
pub use models::{Permission, Role, User, UserSummary};

use std::sync::Arc;

use db::CredentialStore;
use security::TokenCodec;
use services::AuthService;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub tokens: Arc<TokenCodec>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(store: Arc<dyn CredentialStore>, tokens: Arc<TokenCodec>) -> Self {
        let auth = Arc::new(AuthService::new(store.clone(), tokens.clone()));
        Self {
            store,
            tokens,
            auth,
        }
    }
}
