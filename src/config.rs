/// Configuration management
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub server_host: String,
    #[serde(default = "default_port")]
    pub server_port: u16,
    pub database_url: String,
    /// Secret for signing access tokens.
    pub jwt_secret: String,
    /// Separate secret for signing refresh tokens.
    pub refresh_token_secret: String,
    #[serde(default = "default_access_ttl_hours")]
    pub access_token_ttl_hours: i64,
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_token_ttl_days: i64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_access_ttl_hours() -> i64 {
    24
}

fn default_refresh_ttl_days() -> i64 {
    7
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}
