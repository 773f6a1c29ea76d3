use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use lifetip_auth::{TokenClaims, TokenKind};
use lifetip_core::UserId;
use lifetip_infra::{AppConfig, InMemoryStore};
use reqwest::StatusCode;
use serde_json::{Value, json};

const SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: Option<&str>) -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = jwt_secret.map(str::to_string);

        // Same router as prod, in-memory store, ephemeral port.
        let app = lifetip_api::app::build_app(&config, Arc::new(InMemoryStore::new()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, sub: UserId, issued_at: chrono::DateTime<Utc>, ttl: ChronoDuration) -> String {
    let claims = TokenClaims::new(sub, "someone@tips.kr", TokenKind::Access, issued_at, ttl);

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

struct Account {
    id: String,
    access: String,
    refresh: String,
}

async fn register(client: &reqwest::Client, srv: &TestServer, email: &str, nickname: &str) -> Account {
    let res = client
        .post(srv.url("/api/v1/users/signup"))
        .json(&json!({ "email": email, "password": "password123", "nickname": nickname }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    let id = body["result"]["id"].as_str().unwrap().to_string();

    let res = client
        .post(srv.url("/api/v1/users/login"))
        .json(&json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    Account {
        id,
        access: body["result"]["accessToken"].as_str().unwrap().to_string(),
        refresh: body["result"]["refreshToken"].as_str().unwrap().to_string(),
    }
}

async fn create_tip(client: &reqwest::Client, srv: &TestServer, token: &str, title: &str) -> String {
    let res = client
        .post(srv.url("/api/v1/tips"))
        .bearer_auth(token)
        .json(&json!({ "title": title, "content": "body", "hashtags": ["#Money"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    body["result"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn(Some(SECRET)).await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn(Some(SECRET)).await;

    let client = reqwest::Client::new();
    let res = client.get(srv.url("/api/v1/users/me")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["isSuccess"], false);
    assert_eq!(body["code"], "AUTH001");
    assert_eq!(body["result"], Value::Null);

    // Malformed scheme is treated the same as a missing header.
    let res = client
        .post(srv.url("/api/v1/tips"))
        .header("Authorization", "Token abc")
        .json(&json!({ "title": "A", "content": "B" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_forbidden() {
    let srv = TestServer::spawn(Some(SECRET)).await;
    let token = mint_jwt(
        SECRET,
        UserId::new(),
        Utc::now() - ChronoDuration::hours(2),
        ChronoDuration::hours(1),
    );

    let res = reqwest::Client::new()
        .get(srv.url("/api/v1/users/me"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "AUTH003");
    assert!(body["message"].as_str().unwrap().contains("expired"));
}

#[tokio::test]
async fn invalid_token_is_forbidden() {
    let srv = TestServer::spawn(Some(SECRET)).await;
    let client = reqwest::Client::new();

    for token in [
        "not-a-jwt".to_string(),
        mint_jwt("other-secret", UserId::new(), Utc::now(), ChronoDuration::minutes(10)),
    ] {
        let res = client
            .get(srv.url("/api/v1/users/me"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["code"], "AUTH004");
        assert_eq!(body["message"], "invalid token");
    }
}

#[tokio::test]
async fn missing_secret_is_a_server_error() {
    let srv = TestServer::spawn(None).await;
    let token = mint_jwt(SECRET, UserId::new(), Utc::now(), ChronoDuration::minutes(10));

    let res = reqwest::Client::new()
        .get(srv.url("/api/v1/users/me"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "SRV001");

    // Public routes keep working.
    let res = reqwest::get(srv.url("/api/v1/tips")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn identity_is_derived_from_token_subject() {
    let srv = TestServer::spawn(Some(SECRET)).await;
    let client = reqwest::Client::new();
    let account = register(&client, &srv, "kim@tips.kr", "kim").await;

    let sub: UserId = account.id.parse().unwrap();
    let token = mint_jwt(SECRET, sub, Utc::now(), ChronoDuration::minutes(10));

    let res = client
        .get(srv.url("/api/v1/users/me"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "COMMON200");
    assert_eq!(body["result"]["id"].as_str().unwrap(), account.id);
    assert_eq!(body["result"]["email"], "kim@tips.kr");
}

#[tokio::test]
async fn signup_login_refresh_lifecycle() {
    let srv = TestServer::spawn(Some(SECRET)).await;
    let client = reqwest::Client::new();
    let account = register(&client, &srv, " Lee@Tips.kr ", "lee").await;

    // Email is normalized, so the same address in another case is a duplicate.
    let res = client
        .post(srv.url("/api/v1/users/signup"))
        .json(&json!({ "email": "lee@tips.kr", "password": "password123", "nickname": "lee2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "VAL002");

    let res = client
        .post(srv.url("/api/v1/users/login"))
        .json(&json!({ "email": "lee@tips.kr", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "AUTH002");

    // A refresh token is not an access token.
    let res = client
        .get(srv.url("/api/v1/users/me"))
        .bearer_auth(&account.refresh)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(srv.url("/api/v1/users/refresh"))
        .json(&json!({ "refreshToken": account.refresh }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let fresh = body["result"]["accessToken"].as_str().unwrap().to_string();

    let res = client
        .get(srv.url("/api/v1/users/me"))
        .bearer_auth(&fresh)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Access tokens cannot be used to refresh.
    let res = client
        .post(srv.url("/api/v1/users/refresh"))
        .json(&json!({ "refreshToken": account.access }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invalid_signup_reports_field() {
    let srv = TestServer::spawn(Some(SECRET)).await;
    let res = reqwest::Client::new()
        .post(srv.url("/api/v1/users/signup"))
        .json(&json!({ "email": "park@tips.kr", "password": "short", "nickname": "park" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "VAL001");
    assert_eq!(body["result"]["field"], "password");
}

#[tokio::test]
async fn tip_create_then_fetch_round_trips() {
    let srv = TestServer::spawn(Some(SECRET)).await;
    let client = reqwest::Client::new();
    let account = register(&client, &srv, "choi@tips.kr", "choi").await;

    let res = client
        .post(srv.url("/api/v1/tips"))
        .bearer_auth(&account.access)
        .json(&json!({ "title": "A", "content": "B" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    let id = created["result"]["id"].as_str().unwrap().to_string();

    let res = client
        .get(srv.url(&format!("/api/v1/tips/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let tip = &body["result"];
    assert_eq!(tip["title"], "A");
    assert_eq!(tip["content"], "B");
    assert_eq!(tip["authorId"].as_str().unwrap(), account.id);
    assert_eq!(tip["authorNickname"], "choi");
    assert_eq!(tip["likeCount"], 0);
}

#[tokio::test]
async fn tip_lookup_errors() {
    let srv = TestServer::spawn(Some(SECRET)).await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/api/v1/tips/nope")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "VAL003");

    let missing = lifetip_core::TipId::new();
    let res = client
        .get(srv.url(&format!("/api/v1/tips/{missing}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "RES001");
}

#[tokio::test]
async fn only_the_author_can_edit_a_tip() {
    let srv = TestServer::spawn(Some(SECRET)).await;
    let client = reqwest::Client::new();
    let author = register(&client, &srv, "author@tips.kr", "author").await;
    let other = register(&client, &srv, "other@tips.kr", "other").await;
    let tip_id = create_tip(&client, &srv, &author.access, "mine").await;

    let res = client
        .patch(srv.url(&format!("/api/v1/tips/{tip_id}")))
        .bearer_auth(&other.access)
        .json(&json!({ "title": "stolen" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "PERM001");

    let res = client
        .patch(srv.url(&format!("/api/v1/tips/{tip_id}")))
        .bearer_auth(&author.access)
        .json(&json!({ "title": "still mine", "hashtags": ["#Rent", "rent"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["result"]["title"], "still mine");
    assert_eq!(body["result"]["hashtags"], json!(["rent"]));

    let res = client
        .delete(srv.url(&format!("/api/v1/tips/{tip_id}")))
        .bearer_auth(&author.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = client
        .get(srv.url(&format!("/api/v1/tips/{tip_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn liking_twice_toggles_off() {
    let srv = TestServer::spawn(Some(SECRET)).await;
    let client = reqwest::Client::new();
    let author = register(&client, &srv, "author@tips.kr", "author").await;
    let fan = register(&client, &srv, "fan@tips.kr", "fan").await;
    let tip_id = create_tip(&client, &srv, &author.access, "likeable").await;

    let like = || {
        client
            .post(srv.url(&format!("/api/v1/tips/{tip_id}/likes")))
            .bearer_auth(&fan.access)
            .send()
    };

    let body: Value = like().await.unwrap().json().await.unwrap();
    assert_eq!(body["result"]["liked"], true);
    assert_eq!(body["result"]["likeCount"], 1);

    let body: Value = like().await.unwrap().json().await.unwrap();
    assert_eq!(body["result"]["liked"], false);
    assert_eq!(body["result"]["likeCount"], 0);

    // The first like notified the author.
    let res = client
        .get(srv.url("/api/v1/notifications"))
        .bearer_auth(&author.access)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    let notifications = body["result"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["kind"], "like");
    assert_eq!(notifications[0]["actorId"].as_str().unwrap(), fan.id);
}

#[tokio::test]
async fn saves_toggle_and_show_up_in_profile() {
    let srv = TestServer::spawn(Some(SECRET)).await;
    let client = reqwest::Client::new();
    let user = register(&client, &srv, "saver@tips.kr", "saver").await;
    let tip_id = create_tip(&client, &srv, &user.access, "keep this").await;

    let res = client
        .post(srv.url(&format!("/api/v1/tips/{tip_id}/saves")))
        .bearer_auth(&user.access)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["result"]["saved"], true);

    let res = client
        .get(srv.url("/api/v1/users/me/saves"))
        .bearer_auth(&user.access)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["result"][0]["id"].as_str().unwrap(), tip_id);

    let res = client
        .get(srv.url("/api/v1/users/me/tips"))
        .bearer_auth(&user.access)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["result"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn comments_notify_the_author_but_not_self() {
    let srv = TestServer::spawn(Some(SECRET)).await;
    let client = reqwest::Client::new();
    let author = register(&client, &srv, "author@tips.kr", "author").await;
    let reader = register(&client, &srv, "reader@tips.kr", "reader").await;
    let tip_id = create_tip(&client, &srv, &author.access, "discuss").await;

    for (token, text) in [(&author.access, "first!"), (&reader.access, "thanks")] {
        let res = client
            .post(srv.url(&format!("/api/v1/tips/{tip_id}/comments")))
            .bearer_auth(token)
            .json(&json!({ "content": text }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = client
        .get(srv.url(&format!("/api/v1/tips/{tip_id}/comments")))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    let comments = body["result"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    let reader_comment = comments
        .iter()
        .find(|c| c["authorNickname"] == "reader")
        .map(|c| c["id"].as_str().unwrap().to_string())
        .unwrap();

    let res = client
        .get(srv.url("/api/v1/notifications"))
        .bearer_auth(&author.access)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    let notifications = body["result"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["kind"], "comment");
    assert_eq!(notifications[0]["read"], false);
    let notification_id = notifications[0]["id"].as_str().unwrap().to_string();

    // Only the recipient can mark it read.
    let res = client
        .patch(srv.url(&format!("/api/v1/notifications/{notification_id}/read")))
        .bearer_auth(&reader.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = client
        .patch(srv.url(&format!("/api/v1/notifications/{notification_id}/read")))
        .bearer_auth(&author.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Only the comment author can delete it.
    let res = client
        .delete(srv.url(&format!("/api/v1/comments/{reader_comment}")))
        .bearer_auth(&author.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = client
        .delete(srv.url(&format!("/api/v1/comments/{reader_comment}")))
        .bearer_auth(&reader.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn policies_flow() {
    let srv = TestServer::spawn(Some(SECRET)).await;
    let client = reqwest::Client::new();
    let user = register(&client, &srv, "policy@tips.kr", "policy").await;

    let post = |path: &str, body: Value| {
        client
            .post(srv.url(path))
            .bearer_auth(&user.access)
            .json(&body)
            .send()
    };

    let res = post("/api/v1/organizations", json!({ "name": "Seoul City Hall" }))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let org: Value = res.json().await.unwrap();
    let org_id = org["result"]["id"].as_str().unwrap().to_string();

    let res = post("/api/v1/organizations", json!({ "name": "Seoul City Hall" }))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "VAL002");

    let res = post("/api/v1/locations", json!({ "name": "Mapo-gu" })).await.unwrap();
    let loc: Value = res.json().await.unwrap();
    let loc_id = loc["result"]["id"].as_str().unwrap().to_string();

    let res = post(
        "/api/v1/policies",
        json!({
            "organizationId": org_id,
            "locationId": loc_id,
            "title": "Youth rent support",
            "content": "Monthly rent subsidy for residents under 34.",
            "applyUrl": "https://example.org/apply",
        }),
    )
    .await
    .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let policy: Value = res.json().await.unwrap();
    let policy_id = policy["result"]["id"].as_str().unwrap().to_string();

    // Unknown organization is a missing resource.
    let res = post(
        "/api/v1/policies",
        json!({
            "organizationId": lifetip_core::OrganizationId::new().to_string(),
            "locationId": loc_id,
            "title": "t",
            "content": "c",
        }),
    )
    .await
    .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(srv.url(&format!("/api/v1/policies?locationId={loc_id}")))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["result"].as_array().unwrap().len(), 1);

    let res = client
        .get(srv.url(&format!("/api/v1/policies/{policy_id}")))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["result"]["organizationName"], "Seoul City Hall");
    assert_eq!(body["result"]["locationName"], "Mapo-gu");

    let path = format!("/api/v1/policies/{policy_id}/bookmarks");
    let body: Value = post(&path, json!({})).await.unwrap().json().await.unwrap();
    assert_eq!(body["result"]["bookmarked"], true);

    let res = client
        .get(srv.url("/api/v1/users/me/bookmarks"))
        .bearer_auth(&user.access)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["result"][0]["id"].as_str().unwrap(), policy_id);

    let body: Value = post(&path, json!({})).await.unwrap().json().await.unwrap();
    assert_eq!(body["result"]["bookmarked"], false);
}

#[tokio::test]
async fn quiz_answers_are_graded() {
    let srv = TestServer::spawn(Some(SECRET)).await;
    let client = reqwest::Client::new();
    let user = register(&client, &srv, "quiz@tips.kr", "quiz").await;

    let res = client
        .post(srv.url("/api/v1/quizzes"))
        .bearer_auth(&user.access)
        .json(&json!({
            "question": "Which office handles move-in reports?",
            "choices": ["Community center", "Post office", "Bank"],
            "answerIndex": 0,
            "explanation": "Report within 14 days at the community center.",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    let quiz_id = body["result"]["id"].as_str().unwrap().to_string();
    assert!(body["result"].get("answerIndex").is_none());

    let answer = |choice: u32| {
        client
            .post(srv.url(&format!("/api/v1/quizzes/{quiz_id}/answer")))
            .bearer_auth(&user.access)
            .json(&json!({ "choice": choice }))
            .send()
    };

    let body: Value = answer(1).await.unwrap().json().await.unwrap();
    assert_eq!(body["result"]["correct"], false);
    assert_eq!(body["result"]["answerIndex"], 0);

    let body: Value = answer(0).await.unwrap().json().await.unwrap();
    assert_eq!(body["result"]["correct"], true);

    let res = answer(7).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_without_key_is_bad_gateway() {
    let srv = TestServer::spawn(Some(SECRET)).await;
    let client = reqwest::Client::new();
    let user = register(&client, &srv, "chat@tips.kr", "chat").await;

    let res = client
        .post(srv.url("/api/v1/chat"))
        .bearer_auth(&user.access)
        .json(&json!({ "message": "How do I apply for rent support?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "EXT001");
}

#[tokio::test]
async fn deleting_account_invalidates_refresh() {
    let srv = TestServer::spawn(Some(SECRET)).await;
    let client = reqwest::Client::new();
    let user = register(&client, &srv, "gone@tips.kr", "gone").await;
    create_tip(&client, &srv, &user.access, "soon gone").await;

    let res = client
        .delete(srv.url("/api/v1/users/me"))
        .bearer_auth(&user.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = reqwest::get(srv.url("/api/v1/tips"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["result"].as_array().unwrap().is_empty());

    let res = client
        .post(srv.url("/api/v1/users/refresh"))
        .json(&json!({ "refreshToken": user.refresh }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deleted_account_with_live_token_is_named_in_errors() {
    let srv = TestServer::spawn(Some(SECRET)).await;
    let client = reqwest::Client::new();
    let owner = register(&client, &srv, "owner@tips.kr", "owner").await;
    let leaver = register(&client, &srv, "leaver@tips.kr", "leaver").await;

    let tip_id = create_tip(&client, &srv, &owner.access, "still here").await;
    let org: Value = client
        .post(srv.url("/api/v1/organizations"))
        .bearer_auth(&owner.access)
        .json(&json!({ "name": "Busan City Hall" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let loc: Value = client
        .post(srv.url("/api/v1/locations"))
        .bearer_auth(&owner.access)
        .json(&json!({ "name": "Haeundae-gu" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let policy: Value = client
        .post(srv.url("/api/v1/policies"))
        .bearer_auth(&owner.access)
        .json(&json!({
            "organizationId": org["result"]["id"],
            "locationId": loc["result"]["id"],
            "title": "Senior transit pass",
            "content": "Free subway rides for residents over 65.",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let policy_id = policy["result"]["id"].as_str().unwrap().to_string();

    let res = client
        .delete(srv.url("/api/v1/users/me"))
        .bearer_auth(&leaver.access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // The access token still verifies until it expires.
    for path in [
        format!("/api/v1/policies/{policy_id}/bookmarks"),
        format!("/api/v1/tips/{tip_id}/likes"),
    ] {
        let res = client
            .post(srv.url(&path))
            .bearer_auth(&leaver.access)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{path}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["code"], "RES001");
        assert_eq!(body["message"], "user not found", "{path}");
    }

    let res = client
        .post(srv.url(&format!("/api/v1/tips/{tip_id}/comments")))
        .bearer_auth(&leaver.access)
        .json(&json!({ "content": "ghost" }))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "user not found");
}
