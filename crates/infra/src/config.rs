//! Configuration loading from environment variables.
//!
//! Every value has a default except the secrets. Missing secrets are logged
//! and left unset: the features that need them fail at request time.

use std::{fmt::Display, net::SocketAddr, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

use lifetip_auth::{DEFAULT_ACCESS_TTL_SECS, DEFAULT_REFRESH_TTL_SECS, MAX_TTL_SECS};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_CHAT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// `None` selects the in-memory store.
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub jwt_refresh_secret: Option<String>,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

#[derive(Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
}

impl core::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field(
                "jwt_refresh_secret",
                &self.jwt_refresh_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

impl core::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            database: DatabaseConfig {
                url: None,
                max_connections: DEFAULT_MAX_CONNECTIONS,
            },
            auth: AuthConfig {
                jwt_secret: None,
                jwt_refresh_secret: None,
                access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
                refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
            },
            chat: ChatConfig {
                api_key: None,
                api_url: DEFAULT_CHAT_API_URL.to_string(),
                model: DEFAULT_CHAT_MODEL.to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = secret(&var, "JWT_SECRET");
        let jwt_refresh_secret = var("JWT_REFRESH_SECRET");
        if jwt_refresh_secret.is_none() && jwt_secret.is_some() {
            info!("JWT_REFRESH_SECRET not set, refresh tokens use JWT_SECRET");
        }

        let access_ttl_secs = parse_or(&var, "ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TTL_SECS)?;
        let refresh_ttl_secs = parse_or(&var, "REFRESH_TOKEN_TTL_SECS", DEFAULT_REFRESH_TTL_SECS)?;
        for (key, ttl) in [
            ("ACCESS_TOKEN_TTL_SECS", access_ttl_secs),
            ("REFRESH_TOKEN_TTL_SECS", refresh_ttl_secs),
        ] {
            if !(1..=MAX_TTL_SECS).contains(&ttl) {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("must be between 1 and {MAX_TTL_SECS} seconds"),
                });
            }
        }

        let database_url = var("DATABASE_URL");
        if database_url.is_none() {
            warn!("DATABASE_URL not set, using the in-memory store (data is lost on restart)");
        }

        Ok(Self {
            bind_addr: parse_or(&var, "BIND_ADDR", default_bind_addr())?,
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_or(&var, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            },
            auth: AuthConfig {
                jwt_secret,
                jwt_refresh_secret,
                access_ttl_secs,
                refresh_ttl_secs,
            },
            chat: ChatConfig {
                api_key: secret(&var, "CHAT_API_KEY"),
                api_url: var("CHAT_API_URL").unwrap_or_else(|| DEFAULT_CHAT_API_URL.to_string()),
                model: var("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            },
        })
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT))
}

fn secret(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    let value = var(key);
    if value.is_none() {
        warn!("{key} not set");
    }
    value
}

fn parse_or<T>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(load(&[]).unwrap(), AppConfig::default());
    }

    #[test]
    fn values_are_read_and_trimmed() {
        let cfg = load(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("DATABASE_URL", " postgres://localhost/tips "),
            ("JWT_SECRET", "s3cret"),
            ("ACCESS_TOKEN_TTL_SECS", "120"),
            ("CHAT_MODEL", "small"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.database.url.as_deref(), Some("postgres://localhost/tips"));
        assert_eq!(cfg.auth.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(cfg.auth.access_ttl_secs, 120);
        assert_eq!(cfg.chat.model, "small");
    }

    #[test]
    fn blank_secret_counts_as_unset() {
        assert_eq!(load(&[("JWT_SECRET", "   ")]).unwrap().auth.jwt_secret, None);
    }

    #[test]
    fn bad_numbers_are_errors() {
        assert!(matches!(
            load(&[("DATABASE_MAX_CONNECTIONS", "many")]),
            Err(ConfigError::Invalid { key: "DATABASE_MAX_CONNECTIONS", .. })
        ));
        assert!(matches!(
            load(&[("ACCESS_TOKEN_TTL_SECS", "0")]),
            Err(ConfigError::Invalid { key: "ACCESS_TOKEN_TTL_SECS", .. })
        ));
    }

    #[test]
    fn token_lifetimes_are_bounded() {
        let too_long = i64::MAX.to_string();
        for key in ["ACCESS_TOKEN_TTL_SECS", "REFRESH_TOKEN_TTL_SECS"] {
            let err = load(&[(key, too_long.as_str())]).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { key: k, .. } if k == key));
        }

        let past_cap = (MAX_TTL_SECS + 1).to_string();
        assert!(load(&[("REFRESH_TOKEN_TTL_SECS", past_cap.as_str())]).is_err());

        let at_cap = MAX_TTL_SECS.to_string();
        let cfg = load(&[("ACCESS_TOKEN_TTL_SECS", at_cap.as_str())]).unwrap();
        assert_eq!(cfg.auth.access_ttl_secs, MAX_TTL_SECS);
        assert!(chrono::Duration::try_seconds(cfg.auth.access_ttl_secs).is_some());
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = load(&[("JWT_SECRET", "topsecret"), ("CHAT_API_KEY", "sk-abc")]).unwrap();
        let out = format!("{cfg:?}");
        assert!(!out.contains("topsecret"));
        assert!(!out.contains("sk-abc"));
    }
}
