use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, rejection::QueryRejection},
    response::Response,
    routing::{get, patch},
    Router,
};
use serde_json::json;

use lifetip_core::NotificationId;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::Identity;

pub fn protected() -> Router {
    Router::new()
        .route("/api/v1/notifications", get(list_notifications))
        .route("/api/v1/notifications/:id/read", patch(mark_read))
}

pub async fn list_notifications(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    query: Result<Query<dto::PageQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let notifications = services
        .list_notifications(identity.user_id(), query.page())
        .await?;
    Ok(dto::ok(
        notifications
            .iter()
            .map(dto::notification_to_json)
            .collect::<Vec<_>>(),
    ))
}

pub async fn mark_read(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let notification_id: NotificationId = dto::parse_id(&id)?;
    services
        .mark_notification_read(identity.user_id(), notification_id)
        .await?;
    Ok(dto::ok(json!({ "id": notification_id.to_string(), "read": true })))
}
