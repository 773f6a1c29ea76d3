use std::sync::Arc;

use axum::{
    extract::{Extension, rejection::JsonRejection},
    response::Response,
    routing::post,
    Json, Router,
};
use serde_json::json;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::Identity;

pub fn protected() -> Router {
    Router::new().route("/api/v1/chat", post(chat))
}

pub async fn chat(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<dto::ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let reply = services.chat(identity.user_id(), &body.message).await?;
    Ok(dto::ok(json!({ "reply": reply })))
}
