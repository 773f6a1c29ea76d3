//! HS256 token issuing and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use thiserror::Error;

use lifetip_core::UserId;

use crate::claims::{TokenClaims, TokenKind, TokenValidationError, validate_claims};

pub const DEFAULT_ACCESS_TTL_SECS: i64 = 60 * 60;
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 14 * 24 * 60 * 60;
/// Upper bound for either lifetime (ten years).
pub const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Why a token could not be issued or accepted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// No signing secret is configured. A deployment problem, not a client one.
    #[error("token signing secret is not configured")]
    MissingSecret,

    #[error("token expired")]
    Expired,

    /// Malformed, wrongly signed, or the wrong kind of token.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Any other verification or signing failure.
    #[error("token verification failed: {0}")]
    Other(String),
}

impl From<TokenValidationError> for TokenError {
    fn from(value: TokenValidationError) -> Self {
        match value {
            TokenValidationError::Expired => TokenError::Expired,
            other => TokenError::Invalid(other.to_string()),
        }
    }
}

/// Verifies access tokens presented on authenticated requests.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError>;
}

/// Token pair returned at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// HMAC-SHA256 issuer/validator for access and refresh tokens.
///
/// Either secret may be absent; operations needing it fail with
/// [`TokenError::MissingSecret`].
#[derive(Clone)]
pub struct Hs256Jwt {
    access: Option<SigningKeys>,
    refresh: Option<SigningKeys>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl core::fmt::Debug for Hs256Jwt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256Jwt")
            .field("access_configured", &self.access.is_some())
            .field("refresh_configured", &self.refresh.is_some())
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl Hs256Jwt {
    /// Refresh tokens fall back to the access secret when no dedicated one is given.
    pub fn new(access_secret: Option<&[u8]>, refresh_secret: Option<&[u8]>) -> Self {
        let access = access_secret.map(SigningKeys::from_secret);
        let refresh = refresh_secret
            .map(SigningKeys::from_secret)
            .or_else(|| access.clone());
        Self {
            access,
            refresh,
            access_ttl: Duration::seconds(DEFAULT_ACCESS_TTL_SECS),
            refresh_ttl: Duration::seconds(DEFAULT_REFRESH_TTL_SECS),
        }
    }

    pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.access.is_some()
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Issue an access/refresh pair for a freshly authenticated user.
    pub fn issue(
        &self,
        sub: UserId,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedTokens, TokenError> {
        let access_token = self.issue_access(sub, email, now)?;
        let claims = TokenClaims::new(sub, email, TokenKind::Refresh, now, self.refresh_ttl);
        let refresh_token = sign(self.refresh.as_ref(), &claims)?;
        Ok(IssuedTokens {
            access_token,
            refresh_token,
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    pub fn issue_access(
        &self,
        sub: UserId,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = TokenClaims::new(sub, email, TokenKind::Access, now, self.access_ttl);
        sign(self.access.as_ref(), &claims)
    }

    pub fn validate_refresh(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, TokenError> {
        verify(self.refresh.as_ref(), token, TokenKind::Refresh, now)
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        verify(self.access.as_ref(), token, TokenKind::Access, now)
    }
}

fn sign(keys: Option<&SigningKeys>, claims: &TokenClaims) -> Result<String, TokenError> {
    let keys = keys.ok_or(TokenError::MissingSecret)?;
    encode(&Header::new(Algorithm::HS256), claims, &keys.encoding)
        .map_err(|e| TokenError::Other(e.to_string()))
}

fn verify(
    keys: Option<&SigningKeys>,
    token: &str,
    expected: TokenKind,
    now: DateTime<Utc>,
) -> Result<TokenClaims, TokenError> {
    let keys = keys.ok_or(TokenError::MissingSecret)?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<TokenClaims>(token, &keys.decoding, &validation).map_err(classify)?;
    validate_claims(&data.claims, expected, now)?;
    Ok(data.claims)
}

fn classify(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidToken
        | ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::ImmatureSignature
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => TokenError::Invalid(err.to_string()),
        _ => TokenError::Other(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt() -> Hs256Jwt {
        Hs256Jwt::new(Some(b"access-secret"), Some(b"refresh-secret"))
    }

    #[test]
    fn access_token_round_trips_subject() {
        let jwt = jwt();
        let user = UserId::new();
        let now = Utc::now();

        let token = jwt.issue_access(user, "kim@tips.kr", now).unwrap();
        let claims = jwt.validate(&token, now).unwrap();

        assert_eq!(claims.sub, user);
        assert_eq!(claims.email, "kim@tips.kr");
        assert_eq!(claims.typ, TokenKind::Access);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let jwt = jwt().with_ttls(Duration::minutes(1), Duration::minutes(1));
        let issued = Utc::now() - Duration::hours(1);
        let token = jwt.issue_access(UserId::new(), "a@b.kr", issued).unwrap();

        assert_eq!(jwt.validate(&token, Utc::now()), Err(TokenError::Expired));
    }

    #[test]
    fn tampered_signature_is_invalid() {
        let jwt = jwt();
        let token = jwt.issue_access(UserId::new(), "a@b.kr", Utc::now()).unwrap();
        let forged = Hs256Jwt::new(Some(b"someone-else"), None);

        assert!(matches!(
            forged.validate(&token, Utc::now()),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            jwt().validate("not.a.jwt", Utc::now()),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn missing_secret_fails_both_ways() {
        let jwt = Hs256Jwt::new(None, None);
        assert!(!jwt.is_configured());
        assert_eq!(
            jwt.issue_access(UserId::new(), "a@b.kr", Utc::now()),
            Err(TokenError::MissingSecret)
        );
        assert_eq!(jwt.validate("x.y.z", Utc::now()), Err(TokenError::MissingSecret));
    }

    #[test]
    fn refresh_token_only_works_at_refresh() {
        // Shared secret so the signature verifies; the `typ` claim must still reject it.
        let jwt = Hs256Jwt::new(Some(b"shared"), None);
        let user = UserId::new();
        let now = Utc::now();
        let pair = jwt.issue(user, "a@b.kr", now).unwrap();

        assert!(matches!(
            jwt.validate(&pair.refresh_token, now),
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(
            jwt.validate_refresh(&pair.access_token, now),
            Err(TokenError::Invalid(_))
        ));
        assert_eq!(jwt.validate_refresh(&pair.refresh_token, now).unwrap().sub, user);
        assert_eq!(pair.expires_in, DEFAULT_ACCESS_TTL_SECS);
    }
}
