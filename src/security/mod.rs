/// Security primitives: password hashing and the bearer-token codec
pub mod jwt;
pub mod password;

pub use jwt::{AccessClaims, RefreshClaims, TokenCodec, TokenError};
pub use password::{hash_password, verify_password};
