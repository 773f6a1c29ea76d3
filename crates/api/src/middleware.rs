use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use lifetip_auth::JwtValidator;

use crate::app::errors::ApiError;
use crate::context::Identity;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Reject requests without a valid access token; attach [`Identity`] otherwise.
///
/// Missing/malformed header → 401, expired or invalid token → 403, missing
/// secret or unexpected verification failure → 500.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;

    let claims = state.jwt.validate(token, Utc::now()).map_err(|e| {
        tracing::debug!(error = %e, "bearer token rejected");
        ApiError::from(e)
    })?;

    req.extensions_mut()
        .insert(Identity::new(claims.sub, claims.email));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers.get(AUTHORIZATION).ok_or(ApiError::MissingToken)?;

    let header = header.to_str().map_err(|_| ApiError::MissingToken)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::MissingToken)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(ApiError::MissingToken);
    }

    Ok(token)
}
