/// Session/token lifecycle: registration, login, refresh, logout.
///
/// This service is the only writer of refresh-token state on the store.
/// Rotation model: one live refresh token per user, replaced at login,
/// cleared at logout, never rotated on the refresh path itself.
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::db::{CredentialStore, StoreError};
use crate::error::{ApiError, ApiResult};
use crate::models::user::{LoginRequest, RegisterRequest};
use crate::models::{NewUser, User, UserSummary};
use crate::security::password;
use crate::security::TokenCodec;

/// Name of the role granted to new registrations. Must exist in the store
/// (seeded at startup); its absence is a deployment configuration error.
pub const DEFAULT_ROLE: &str = "User";

pub struct LoginOutcome {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserSummary,
}

pub struct RefreshOutcome {
    pub access_token: String,
    pub user: UserSummary,
}

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    tokens: Arc<TokenCodec>,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, tokens: Arc<TokenCodec>) -> Self {
        Self { store, tokens }
    }

    pub async fn register(&self, request: RegisterRequest) -> ApiResult<UserSummary> {
        let username = request.username.trim().to_lowercase();
        let email = request.email.trim().to_string();
        let fullname = request.fullname.trim().to_string();

        if username.is_empty()
            || email.is_empty()
            || fullname.is_empty()
            || request.password.trim().is_empty()
        {
            return Err(ApiError::validation(
                "All fields (username, email, fullname, password) are required",
            ));
        }

        if self.store.find_user_by_username(&username).await?.is_some()
            || self.store.find_user_by_email(&email).await?.is_some()
        {
            return Err(ApiError::conflict("Username or email already exists"));
        }

        let default_role = self
            .store
            .find_role_by_name(DEFAULT_ROLE)
            .await?
            .ok_or_else(|| {
                ApiError::configuration(format!(
                    "Default role \"{DEFAULT_ROLE}\" is missing; run the role seed"
                ))
            })?;

        let password_hash = hash_on_worker(request.password).await?;

        let user = self
            .store
            .create_user(NewUser {
                username: username.clone(),
                email,
                fullname,
                password_hash,
                role_id: Some(default_role.id),
            })
            .await
            .map_err(|err| match err {
                // Concurrent registration can slip past the pre-check; the
                // store's unique constraint is the authority.
                StoreError::Duplicate => ApiError::conflict("Username or email already exists"),
                other => ApiError::from(other),
            })?;

        tracing::info!(username = %username, "user registered");

        Ok(self.summarize(&user, Some(default_role.name)))
    }

    pub async fn login(&self, request: LoginRequest) -> ApiResult<LoginOutcome> {
        let email = request.email.trim().to_string();

        if email.is_empty() || request.password.trim().is_empty() {
            return Err(ApiError::validation("Email and password are required"));
        }

        // Unknown user and wrong password must be indistinguishable.
        let Some(mut user) = self.store.find_user_by_email(&email).await? else {
            return Err(invalid_credentials());
        };

        if !verify_on_worker(request.password, user.password_hash.clone()).await? {
            tracing::debug!(user_id = %user.id, "password mismatch");
            return Err(invalid_credentials());
        }

        let role_name = self.resolve_role_name(&user).await?;

        let access_token = self.tokens.issue_access(user.id, role_name.as_deref())?;
        let refresh_token = self.tokens.issue_refresh(user.id)?;

        // Rotation point: overwriting the stored value invalidates any
        // previously issued refresh token for this user.
        user.refresh_token = Some(refresh_token.clone());
        user.refresh_token_expires_at = Some(Utc::now() + self.tokens.refresh_ttl());
        self.store.save_user(&user).await?;

        tracing::info!(user_id = %user.id, "user logged in");

        Ok(LoginOutcome {
            access_token,
            refresh_token,
            user: self.summarize(&user, role_name),
        })
    }

    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<RefreshOutcome> {
        if refresh_token.trim().is_empty() {
            return Err(ApiError::validation("Refresh token is required"));
        }

        let claims = self.tokens.decode_refresh(refresh_token).map_err(|err| {
            tracing::debug!(reason = %err, "refresh token rejected by codec");
            stale_refresh_token()
        })?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| stale_refresh_token())?;

        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(stale_refresh_token)?;

        // The signature alone is not enough: a token superseded by a newer
        // login or cleared by logout still parses, but no longer matches the
        // stored value.
        if user.refresh_token.as_deref() != Some(refresh_token) {
            tracing::debug!(user_id = %user.id, "presented refresh token does not match stored value");
            return Err(stale_refresh_token());
        }

        if !user.refresh_token_is_current(Utc::now()) {
            tracing::debug!(user_id = %user.id, "stored refresh token past its expiry");
            return Err(stale_refresh_token());
        }

        let role_name = self.resolve_role_name(&user).await?;
        let access_token = self.tokens.issue_access(user.id, role_name.as_deref())?;

        tracing::info!(user_id = %user.id, "access token refreshed");

        Ok(RefreshOutcome {
            access_token,
            user: self.summarize(&user, role_name),
        })
    }

    /// Idempotent: a token that matches no user already satisfies the
    /// desired end state and succeeds silently.
    pub async fn logout(&self, refresh_token: &str) -> ApiResult<()> {
        if refresh_token.trim().is_empty() {
            return Err(ApiError::validation("Refresh token is required"));
        }

        if let Some(mut user) = self.store.find_user_by_refresh_token(refresh_token).await? {
            user.refresh_token = None;
            user.refresh_token_expires_at = None;
            self.store.save_user(&user).await?;
            tracing::info!(user_id = %user.id, "user logged out");
        }

        Ok(())
    }

    async fn resolve_role_name(&self, user: &User) -> ApiResult<Option<String>> {
        match user.role_id {
            Some(role_id) => Ok(self
                .store
                .find_role_by_id(role_id)
                .await?
                .map(|role| role.name)),
            None => Ok(None),
        }
    }

    fn summarize(&self, user: &User, role: Option<String>) -> UserSummary {
        UserSummary {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            fullname: user.fullname.clone(),
            role,
        }
    }
}

fn invalid_credentials() -> ApiError {
    ApiError::authentication("Invalid email or password")
}

fn stale_refresh_token() -> ApiError {
    ApiError::authentication("Invalid or expired refresh token")
}

/// Argon2 is deliberately expensive; run it off the async runtime so it
/// cannot stall concurrent request processing.
async fn hash_on_worker(password: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|_| ApiError::configuration("Password hashing worker failed"))?
}

async fn verify_on_worker(password: String, hash: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|_| ApiError::configuration("Password hashing worker failed"))?
}
