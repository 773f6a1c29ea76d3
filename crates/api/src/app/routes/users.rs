use std::sync::Arc;

use axum::{
    extract::{Extension, Query, rejection::{JsonRejection, QueryRejection}},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use lifetip_community::TipQuery;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::Identity;

pub fn public() -> Router {
    Router::new()
        .route("/api/v1/users/signup", post(signup))
        .route("/api/v1/users/login", post(login))
        .route("/api/v1/users/refresh", post(refresh))
}

pub fn protected() -> Router {
    Router::new()
        .route("/api/v1/users/me", get(me).patch(update_me).delete(delete_me))
        .route("/api/v1/users/me/tips", get(my_tips))
        .route("/api/v1/users/me/saves", get(my_saves))
        .route("/api/v1/users/me/bookmarks", get(my_bookmarks))
}

pub async fn signup(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::SignupRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let user = services
        .signup(&body.email, &body.password, &body.nickname)
        .await?;
    Ok(dto::created(dto::user_to_json(&user)))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let session = services.login(&body.email, &body.password).await?;
    Ok(dto::ok(dto::login_to_json(&session.user, &session.tokens)))
}

pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::RefreshRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let (access_token, expires_in) = services.refresh(&body.refresh_token).await?;
    Ok(dto::ok(json!({
        "accessToken": access_token,
        "expiresIn": expires_in,
    })))
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, ApiError> {
    let user = services.me(identity.user_id()).await?;
    Ok(dto::ok(dto::user_to_json(&user)))
}

pub async fn update_me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<dto::UpdateProfileRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let location = body.location()?;
    let user = services
        .update_me(identity.user_id(), body.nickname.as_deref(), location)
        .await?;
    Ok(dto::ok(dto::user_to_json(&user)))
}

pub async fn delete_me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, ApiError> {
    services.delete_me(identity.user_id()).await?;
    Ok(dto::ok(json!({ "deleted": true })))
}

pub async fn my_tips(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    query: Result<Query<dto::PageQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let filter = TipQuery::new(None, None, Some(identity.user_id()), query.page())?;
    let tips = services.list_tips(&filter).await?;
    Ok(dto::ok(dto::tips_to_json(&tips)))
}

pub async fn my_saves(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    query: Result<Query<dto::PageQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let tips = services.my_saves(identity.user_id(), query.page()).await?;
    Ok(dto::ok(dto::tips_to_json(&tips)))
}

pub async fn my_bookmarks(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    query: Result<Query<dto::PageQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let policies = services
        .my_bookmarks(identity.user_id(), query.page())
        .await?;
    Ok(dto::ok(
        policies.iter().map(dto::policy_to_json).collect::<Vec<_>>(),
    ))
}
