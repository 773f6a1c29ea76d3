use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

use lifetip_auth::{IssuedTokens, User};
use lifetip_community::{HashtagCount, Notification};
use lifetip_core::{DomainError, Page};
use lifetip_policies::{Location, Organization, Policy};
use lifetip_quizzes::{Grade, Quiz};

use crate::app::errors::ApiError;
use crate::app::services::community::{CommentView, LikeState};
use crate::app::services::policies::PolicyDetail;
use crate::app::services::tips::{TipDetail, TipView};

// -------------------------
// Envelope
// -------------------------

pub const SUCCESS_CODE: &str = "COMMON200";

/// Common response shape for every `/api/v1` endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub is_success: bool,
    pub code: &'static str,
    pub message: String,
    pub result: Option<T>,
}

pub fn ok<T: Serialize>(result: T) -> Response {
    success(StatusCode::OK, result)
}

pub fn created<T: Serialize>(result: T) -> Response {
    success(StatusCode::CREATED, result)
}

fn success<T: Serialize>(status: StatusCode, result: T) -> Response {
    let body = Envelope {
        is_success: true,
        code: SUCCESS_CODE,
        message: "success".to_string(),
        result: Some(result),
    };
    (status, axum::Json(body)).into_response()
}

/// Parse a path/body identifier, mapping failures to `VAL003`.
pub fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    raw.trim().parse::<T>().map_err(ApiError::from)
}

fn parse_optional_id<T>(raw: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_id(raw).map(Some),
    }
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub nickname: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub nickname: Option<String>,
    /// `null` clears the location.
    #[serde(default, deserialize_with = "double_option")]
    pub location_id: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTipRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTipRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub hashtags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePolicyRequest {
    pub organization_id: String,
    pub location_id: String,
    pub title: String,
    pub content: String,
    pub apply_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    pub question: String,
    pub choices: Vec<String>,
    pub answer_index: u32,
    pub explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerQuizRequest {
    pub choice: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

// -------------------------
// Query DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn page(&self) -> Page {
        Page::new(self.offset, self.limit)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TipListQuery {
    pub hashtag: Option<String>,
    /// Free-text search over title and content.
    pub q: Option<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyListQuery {
    pub location_id: Option<String>,
    pub organization_id: Option<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

impl PolicyListQuery {
    pub fn to_query(&self) -> Result<lifetip_policies::PolicyQuery, ApiError> {
        Ok(lifetip_policies::PolicyQuery {
            location_id: parse_optional_id(self.location_id.as_deref())?,
            organization_id: parse_optional_id(self.organization_id.as_deref())?,
            page: Page::new(self.offset, self.limit),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HashtagQuery {
    pub limit: Option<u32>,
}

impl UpdateProfileRequest {
    pub fn location(&self) -> Result<Option<Option<lifetip_core::LocationId>>, ApiError> {
        match &self.location_id {
            None => Ok(None),
            Some(None) => Ok(Some(None)),
            Some(Some(raw)) => parse_id(raw).map(|id| Some(Some(id))),
        }
    }
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn user_to_json(user: &User) -> Value {
    json!({
        "id": user.id.to_string(),
        "email": user.email,
        "nickname": user.nickname,
        "locationId": user.location_id.map(|l| l.to_string()),
        "createdAt": user.created_at.to_rfc3339(),
    })
}

pub fn login_to_json(user: &User, tokens: &IssuedTokens) -> Value {
    json!({
        "accessToken": tokens.access_token,
        "refreshToken": tokens.refresh_token,
        "expiresIn": tokens.expires_in,
        "user": user_to_json(user),
    })
}

pub fn tip_to_json(view: &TipView) -> Value {
    let tip = &view.tip;
    json!({
        "id": tip.id.to_string(),
        "authorId": tip.author_id.to_string(),
        "authorNickname": view.author_nickname,
        "title": tip.title,
        "content": tip.content,
        "hashtags": tip.hashtags,
        "createdAt": tip.created_at.to_rfc3339(),
        "updatedAt": tip.updated_at.to_rfc3339(),
    })
}

pub fn tip_detail_to_json(detail: &TipDetail) -> Value {
    let mut value = tip_to_json(&detail.view);
    value["likeCount"] = json!(detail.stats.likes);
    value["saveCount"] = json!(detail.stats.saves);
    value["commentCount"] = json!(detail.stats.comments);
    value
}

pub fn tips_to_json(views: &[TipView]) -> Value {
    Value::Array(views.iter().map(tip_to_json).collect())
}

pub fn hashtag_to_json(h: &HashtagCount) -> Value {
    json!({ "tag": h.tag, "count": h.count })
}

pub fn comment_to_json(view: &CommentView) -> Value {
    let c = &view.comment;
    json!({
        "id": c.id.to_string(),
        "tipId": c.tip_id.to_string(),
        "authorId": c.author_id.to_string(),
        "authorNickname": view.author_nickname,
        "content": c.content,
        "createdAt": c.created_at.to_rfc3339(),
    })
}

pub fn like_to_json(state: LikeState) -> Value {
    json!({ "liked": state.liked, "likeCount": state.like_count })
}

pub fn organization_to_json(o: &Organization) -> Value {
    json!({
        "id": o.id.to_string(),
        "name": o.name,
        "description": o.description,
    })
}

pub fn location_to_json(l: &Location) -> Value {
    json!({ "id": l.id.to_string(), "name": l.name })
}

pub fn policy_to_json(p: &Policy) -> Value {
    json!({
        "id": p.id.to_string(),
        "organizationId": p.organization_id.to_string(),
        "locationId": p.location_id.to_string(),
        "title": p.title,
        "content": p.content,
        "applyUrl": p.apply_url,
        "createdAt": p.created_at.to_rfc3339(),
    })
}

pub fn policy_detail_to_json(detail: &PolicyDetail) -> Value {
    let mut value = policy_to_json(&detail.policy);
    value["organizationName"] = json!(detail.organization.as_ref().map(|o| o.name.as_str()));
    value["locationName"] = json!(detail.location.as_ref().map(|l| l.name.as_str()));
    value
}

/// Quizzes are listed without their answer.
pub fn quiz_to_json(q: &Quiz) -> Value {
    json!({
        "id": q.id.to_string(),
        "question": q.question,
        "choices": q.choices,
        "createdAt": q.created_at.to_rfc3339(),
    })
}

pub fn grade_to_json(g: &Grade) -> Value {
    json!({
        "correct": g.correct,
        "answerIndex": g.answer_index,
        "explanation": g.explanation,
    })
}

pub fn notification_to_json(n: &Notification) -> Value {
    json!({
        "id": n.id.to_string(),
        "kind": n.kind.as_str(),
        "actorId": n.actor_id.to_string(),
        "tipId": n.tip_id.to_string(),
        "read": n.read,
        "createdAt": n.created_at.to_rfc3339(),
    })
}
