//! `lifetip-auth`: identity and credentials.
//!
//! Users, password hashing, and signed bearer tokens. Decoupled from HTTP and
//! storage: the API crate decides how rejections become responses.

pub mod claims;
pub mod jwt;
pub mod password;
pub mod user;

pub use claims::{TokenClaims, TokenKind, TokenValidationError, validate_claims};
pub use jwt::{
    DEFAULT_ACCESS_TTL_SECS, DEFAULT_REFRESH_TTL_SECS, Hs256Jwt, IssuedTokens, JwtValidator,
    MAX_TTL_SECS, TokenError,
};
pub use password::{PasswordError, hash_password, verify_password};
pub use user::{ProfileUpdate, Signup, User};
