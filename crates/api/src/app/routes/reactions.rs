use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::Response,
    routing::post,
    Router,
};
use serde_json::json;

use lifetip_core::TipId;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::Identity;

pub fn protected() -> Router {
    Router::new()
        .route("/api/v1/tips/:id/likes", post(toggle_like))
        .route("/api/v1/tips/:id/saves", post(toggle_save))
}

pub async fn toggle_like(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let tip_id: TipId = dto::parse_id(&id)?;
    let state = services.toggle_like(identity.user_id(), tip_id).await?;
    Ok(dto::ok(dto::like_to_json(state)))
}

pub async fn toggle_save(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let tip_id: TipId = dto::parse_id(&id)?;
    let state = services.toggle_save(identity.user_id(), tip_id).await?;
    Ok(dto::ok(json!({ "saved": state.is_on() })))
}
