use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, rejection::{JsonRejection, QueryRejection}},
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;

use lifetip_community::NewComment;
use lifetip_core::{CommentId, TipId};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::Identity;

pub fn public() -> Router {
    Router::new().route("/api/v1/tips/:id/comments", get(list_comments))
}

pub fn protected() -> Router {
    Router::new()
        .route("/api/v1/tips/:id/comments", post(add_comment))
        .route("/api/v1/comments/:id", delete(delete_comment))
}

pub async fn list_comments(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    query: Result<Query<dto::PageQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let tip_id: TipId = dto::parse_id(&id)?;
    let Query(query) = query?;
    let comments = services.list_comments(tip_id, query.page()).await?;
    Ok(dto::ok(
        comments.iter().map(dto::comment_to_json).collect::<Vec<_>>(),
    ))
}

pub async fn add_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    body: Result<Json<dto::CreateCommentRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let tip_id: TipId = dto::parse_id(&id)?;
    let Json(body) = body?;
    let new = NewComment::new(&body.content)?;
    let view = services
        .add_comment(identity.user_id(), tip_id, new)
        .await?;
    Ok(dto::created(dto::comment_to_json(&view)))
}

pub async fn delete_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let comment_id: CommentId = dto::parse_id(&id)?;
    services
        .delete_comment(identity.user_id(), comment_id)
        .await?;
    Ok(dto::ok(json!({ "id": comment_id.to_string(), "deleted": true })))
}
