use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, rejection::{JsonRejection, QueryRejection}},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use lifetip_community::{NewTip, TipQuery, TipUpdate};
use lifetip_core::{Page, TipId};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::Identity;

pub fn public() -> Router {
    Router::new()
        .route("/api/v1/tips", get(list_tips))
        .route("/api/v1/tips/:id", get(get_tip))
        .route("/api/v1/hashtags", get(popular_hashtags))
}

pub fn protected() -> Router {
    Router::new()
        .route("/api/v1/tips", post(create_tip))
        .route(
            "/api/v1/tips/:id",
            axum::routing::patch(update_tip).delete(delete_tip),
        )
}

pub async fn list_tips(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::TipListQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let filter = TipQuery::new(
        query.hashtag.as_deref(),
        query.q.as_deref(),
        None,
        Page::new(query.offset, query.limit),
    )?;
    let tips = services.list_tips(&filter).await?;
    Ok(dto::ok(dto::tips_to_json(&tips)))
}

pub async fn get_tip(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let tip_id: TipId = dto::parse_id(&id)?;
    let detail = services.get_tip(tip_id).await?;
    Ok(dto::ok(dto::tip_detail_to_json(&detail)))
}

pub async fn create_tip(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    body: Result<Json<dto::CreateTipRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let new = NewTip::new(&body.title, &body.content, &body.hashtags)?;
    let view = services.create_tip(identity.user_id(), new).await?;
    Ok(dto::created(dto::tip_to_json(&view)))
}

pub async fn update_tip(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateTipRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let tip_id: TipId = dto::parse_id(&id)?;
    let Json(body) = body?;
    let update = TipUpdate::new(
        body.title.as_deref(),
        body.content.as_deref(),
        body.hashtags.as_deref(),
    )?;
    let view = services
        .update_tip(identity.user_id(), tip_id, update)
        .await?;
    Ok(dto::ok(dto::tip_to_json(&view)))
}

pub async fn delete_tip(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let tip_id: TipId = dto::parse_id(&id)?;
    services.delete_tip(identity.user_id(), tip_id).await?;
    Ok(dto::ok(json!({ "id": tip_id.to_string(), "deleted": true })))
}

pub async fn popular_hashtags(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::HashtagQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let tags = services.popular_hashtags(query.limit).await?;
    Ok(dto::ok(
        tags.iter().map(dto::hashtag_to_json).collect::<Vec<_>>(),
    ))
}
