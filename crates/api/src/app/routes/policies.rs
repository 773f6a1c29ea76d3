use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, rejection::{JsonRejection, QueryRejection}},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use lifetip_core::{LocationId, OrganizationId, PolicyId};
use lifetip_policies::NewPolicy;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::Identity;

pub fn public() -> Router {
    Router::new()
        .route("/api/v1/policies", get(list_policies))
        .route("/api/v1/policies/:id", get(get_policy))
}

pub fn protected() -> Router {
    Router::new()
        .route("/api/v1/policies", post(create_policy))
        .route("/api/v1/policies/:id/bookmarks", post(toggle_bookmark))
}

pub async fn list_policies(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::PolicyListQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let policies = services.list_policies(&query.to_query()?).await?;
    Ok(dto::ok(
        policies.iter().map(dto::policy_to_json).collect::<Vec<_>>(),
    ))
}

pub async fn get_policy(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let policy_id: PolicyId = dto::parse_id(&id)?;
    let detail = services.get_policy(policy_id).await?;
    Ok(dto::ok(dto::policy_detail_to_json(&detail)))
}

pub async fn create_policy(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreatePolicyRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let organization_id: OrganizationId = dto::parse_id(&body.organization_id)?;
    let location_id: LocationId = dto::parse_id(&body.location_id)?;
    let new = NewPolicy::new(
        organization_id,
        location_id,
        &body.title,
        &body.content,
        body.apply_url.as_deref(),
    )?;
    let policy = services.create_policy(new).await?;
    Ok(dto::created(dto::policy_to_json(&policy)))
}

pub async fn toggle_bookmark(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let policy_id: PolicyId = dto::parse_id(&id)?;
    let state = services
        .toggle_bookmark(identity.user_id(), policy_id)
        .await?;
    Ok(dto::ok(json!({ "bookmarked": state.is_on() })))
}
