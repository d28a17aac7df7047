/// Bearer-token codec: signs and verifies access and refresh tokens.
///
/// Access and refresh tokens use distinct secrets, so a refresh token can
/// never pass as an access token even before the type check runs.
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{ApiError, ApiResult};

pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user id).
    pub sub: String,
    /// Resolved role name at issue time, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    /// Type marker; always [`REFRESH_TOKEN_TYPE`] for tokens this codec issues.
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
}

/// Verification failure categories. Kept as a tagged result so callers can
/// apply distinct policies (an expired access token means "refresh"; an
/// expired refresh token means "log in again").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid")]
    Invalid,
    #[error("unexpected token type")]
    WrongType,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        }
    }
}

pub struct TokenCodec {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            &config.refresh_token_secret,
            Duration::hours(config.access_token_ttl_hours),
            Duration::days(config.refresh_token_ttl_days),
        )
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn issue_access(&self, user_id: Uuid, role: Option<&str>) -> ApiResult<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            role: role.map(str::to_owned),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(|_| ApiError::configuration("Failed to sign access token"))
    }

    pub fn issue_refresh(&self, user_id: Uuid) -> ApiResult<String> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            token_type: REFRESH_TOKEN_TYPE.to_string(),
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.refresh_encoding)
            .map_err(|_| ApiError::configuration("Failed to sign refresh token"))
    }

    pub fn decode_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<AccessClaims>(token, &self.access_decoding, &validation)?;
        Ok(data.claims)
    }

    pub fn decode_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<RefreshClaims>(token, &self.refresh_decoding, &validation)?;
        if data.claims.token_type != REFRESH_TOKEN_TYPE {
            return Err(TokenError::WrongType);
        }
        Ok(data.claims)
    }
}
