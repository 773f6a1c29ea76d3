//! Error responses.
//!
//! Every failure leaves the API as the common envelope
//! `{ isSuccess: false, code, message, result }`. The HTTP status follows the
//! code prefix, except token rejections which carry their own status.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use thiserror::Error;

use lifetip_auth::{PasswordError, TokenError};
use lifetip_core::DomainError;
use lifetip_infra::{ChatError, StoreError};

use crate::app::dto::Envelope;

/// Message used for every unexpected failure. Details go to the log only.
pub const INTERNAL_MESSAGE: &str = "internal server error";

/// Application error codes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    MissingToken,
    InvalidCredentials,
    TokenExpired,
    TokenInvalid,
    NotOwner,
    InvalidInput,
    Duplicate,
    MalformedId,
    NotFound,
    Database,
    ChatNotConfigured,
    ChatUpstream,
    SecretMissing,
    TokenFailure,
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingToken => "AUTH001",
            ErrorCode::InvalidCredentials => "AUTH002",
            ErrorCode::TokenExpired => "AUTH003",
            ErrorCode::TokenInvalid => "AUTH004",
            ErrorCode::NotOwner => "PERM001",
            ErrorCode::InvalidInput => "VAL001",
            ErrorCode::Duplicate => "VAL002",
            ErrorCode::MalformedId => "VAL003",
            ErrorCode::NotFound => "RES001",
            ErrorCode::Database => "DB001",
            ErrorCode::ChatNotConfigured => "EXT001",
            ErrorCode::ChatUpstream => "EXT002",
            ErrorCode::SecretMissing => "SRV001",
            ErrorCode::TokenFailure => "SRV002",
            ErrorCode::Internal => "SRV003",
        }
    }
}

/// Map an error code to an HTTP status by its prefix.
pub fn status_for_code(code: &str) -> StatusCode {
    const TABLE: [(&str, StatusCode); 7] = [
        ("AUTH", StatusCode::UNAUTHORIZED),
        ("PERM", StatusCode::FORBIDDEN),
        ("VAL", StatusCode::BAD_REQUEST),
        ("RES", StatusCode::NOT_FOUND),
        ("DB", StatusCode::INTERNAL_SERVER_ERROR),
        ("SRV", StatusCode::INTERNAL_SERVER_ERROR),
        ("EXT", StatusCode::BAD_GATEWAY),
    ];
    TABLE
        .iter()
        .find(|(prefix, _)| code.starts_with(prefix))
        .map(|(_, status)| *status)
        .unwrap_or(StatusCode::BAD_REQUEST)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing or malformed authorization header")]
    MissingToken,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token")]
    TokenInvalid,

    #[error("token signing secret is not configured")]
    SecretMissing,

    #[error("token verification failed: {0}")]
    TokenFailure(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    MalformedId(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("chat is not configured")]
    ChatNotConfigured,

    #[error("chat upstream failed: {0}")]
    ChatUpstream(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ApiError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::MissingToken => ErrorCode::MissingToken,
            ApiError::TokenExpired => ErrorCode::TokenExpired,
            ApiError::TokenInvalid => ErrorCode::TokenInvalid,
            ApiError::SecretMissing => ErrorCode::SecretMissing,
            ApiError::TokenFailure(_) => ErrorCode::TokenFailure,
            ApiError::InvalidCredentials => ErrorCode::InvalidCredentials,
            ApiError::Forbidden(_) => ErrorCode::NotOwner,
            ApiError::Validation { .. } => ErrorCode::InvalidInput,
            ApiError::Duplicate(_) => ErrorCode::Duplicate,
            ApiError::MalformedId(_) => ErrorCode::MalformedId,
            ApiError::NotFound(_) => ErrorCode::NotFound,
            ApiError::ChatNotConfigured => ErrorCode::ChatNotConfigured,
            ApiError::ChatUpstream(_) => ErrorCode::ChatUpstream,
            ApiError::Database(_) => ErrorCode::Database,
            ApiError::Internal(_) => ErrorCode::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            // Token rejections bypass the prefix table.
            ApiError::TokenExpired | ApiError::TokenInvalid => StatusCode::FORBIDDEN,
            ApiError::SecretMissing | ApiError::TokenFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            other => status_for_code(other.code().as_str()),
        }
    }

    /// Message shown to the client.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::TokenFailure(_) | ApiError::Database(_) | ApiError::Internal(_) => {
                INTERNAL_MESSAGE.to_string()
            }
            ApiError::ChatUpstream(_) => "chat service unavailable".to_string(),
            other => other.to_string(),
        }
    }

    fn result(&self) -> Option<Value> {
        match self {
            ApiError::Validation { field, .. } => Some(json!({ "field": field })),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code().as_str();
        if status.is_server_error() || status == StatusCode::BAD_GATEWAY {
            tracing::error!(code, error = %self, "request failed");
        } else {
            tracing::debug!(code, error = %self, "request rejected");
        }
        let body = Envelope {
            is_success: false,
            code,
            message: self.public_message(),
            result: self.result(),
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { field, reason } => ApiError::validation(field, reason),
            DomainError::InvalidId(msg) => ApiError::MalformedId(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(table) => ApiError::Duplicate(format!("{table} already exists")),
            StoreError::MissingReference(_) => ApiError::NotFound("referenced record"),
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::MissingSecret => ApiError::SecretMissing,
            TokenError::Expired => ApiError::TokenExpired,
            TokenError::Invalid(_) => ApiError::TokenInvalid,
            TokenError::Other(msg) => ApiError::TokenFailure(msg),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::NotConfigured => ApiError::ChatNotConfigured,
            other => ApiError::ChatUpstream(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation("body", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation("query", rejection.body_text())
    }
}
