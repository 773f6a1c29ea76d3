//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services/`: use cases over the injected storage handle
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs, the response envelope, JSON mapping helpers
//! - `errors.rs`: error codes and consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use chrono::Duration;
use tower::ServiceBuilder;

use lifetip_auth::Hs256Jwt;
use lifetip_infra::{AppConfig, ChatClient, Store};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router over an already-opened store.
///
/// The caller owns the store's lifetime and closes it after the server stops.
pub fn build_app(config: &AppConfig, store: Arc<dyn Store>) -> Router {
    let auth = &config.auth;
    let tokens = Arc::new(
        Hs256Jwt::new(
            auth.jwt_secret.as_deref().map(str::as_bytes),
            auth.jwt_refresh_secret.as_deref().map(str::as_bytes),
        )
        .with_ttls(
            Duration::seconds(auth.access_ttl_secs),
            Duration::seconds(auth.refresh_ttl_secs),
        ),
    );
    let auth_state = middleware::AuthState {
        jwt: tokens.clone(),
    };

    let services = Arc::new(services::AppServices::new(
        store,
        tokens,
        ChatClient::new(config.chat.clone()),
    ));

    // Protected routes: require a valid access token.
    let protected = routes::protected().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::public())
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
