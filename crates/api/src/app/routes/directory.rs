//! Organizations and locations.

use std::sync::Arc;

use axum::{
    extract::{Extension, rejection::JsonRejection},
    response::Response,
    routing::{get, post},
    Json, Router,
};

use lifetip_policies::{NewLocation, NewOrganization};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn public() -> Router {
    Router::new()
        .route("/api/v1/organizations", get(list_organizations))
        .route("/api/v1/locations", get(list_locations))
}

pub fn protected() -> Router {
    Router::new()
        .route("/api/v1/organizations", post(create_organization))
        .route("/api/v1/locations", post(create_location))
}

pub async fn list_organizations(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Response, ApiError> {
    let organizations = services.list_organizations().await?;
    Ok(dto::ok(
        organizations
            .iter()
            .map(dto::organization_to_json)
            .collect::<Vec<_>>(),
    ))
}

pub async fn create_organization(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateOrganizationRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let new = NewOrganization::new(&body.name, body.description.as_deref())?;
    let organization = services.create_organization(new).await?;
    Ok(dto::created(dto::organization_to_json(&organization)))
}

pub async fn list_locations(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Response, ApiError> {
    let locations = services.list_locations().await?;
    Ok(dto::ok(
        locations.iter().map(dto::location_to_json).collect::<Vec<_>>(),
    ))
}

pub async fn create_location(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateLocationRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let location = services.create_location(NewLocation::new(&body.name)?).await?;
    Ok(dto::created(dto::location_to_json(&location)))
}
