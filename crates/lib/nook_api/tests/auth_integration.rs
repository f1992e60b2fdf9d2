//! Integration tests: build the real router over the in-memory credential
//! store and drive it with `oneshot`. The relational and document pools are
//! lazy and never connected: every path exercised here stops before them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use nook_api::config::ApiConfig;
use nook_api::{AppState, router};
use nook_core::auth::AuthError;
use nook_core::auth::identity::IdentityVerifier;
use nook_core::auth::session::SessionTokens;
use nook_core::models::auth::{ExternalIdentity, User};
use nook_core::store::memory::MemoryUserStore;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;

const SECRET: &str = "integration-secret";

#[derive(Default)]
struct StubVerifier {
    tokens: HashMap<String, ExternalIdentity>,
}

#[async_trait]
impl IdentityVerifier for StubVerifier {
    async fn verify(&self, id_token: &str) -> Result<ExternalIdentity, AuthError> {
        self.tokens
            .get(id_token)
            .cloned()
            .ok_or_else(|| AuthError::ExternalIdentity("unknown token".into()))
    }
}

struct TestApp {
    app: Router,
    store: Arc<MemoryUserStore>,
}

fn test_app(verifier: StubVerifier) -> TestApp {
    let store = Arc::new(MemoryUserStore::new());
    let lazy = || PgPool::connect_lazy("postgres://nook@localhost:1/unused").expect("lazy pool");
    let config = ApiConfig {
        jwt_secret: SECRET.into(),
        ..ApiConfig::default()
    };
    let state = AppState::new(config, lazy(), lazy(), store.clone(), Arc::new(verifier));
    TestApp {
        app: router(state),
        store,
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("parse JSON")
    };
    (status, json)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_auth(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(value) = auth {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

fn ann_signup() -> Value {
    json!({
        "name": "Ann",
        "username": "ann1",
        "email": "ann@x.com",
        "password": "password123",
    })
}

async fn signup_token(app: &Router) -> String {
    let (status, json) = send(app, post_json("/api/v1/auth/signup", ann_signup())).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn health_reports_healthy() {
    let t = test_app(StubVerifier::default());
    let (status, json) = send(&t.app, get_with_auth("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn signup_returns_token_and_user_without_password() {
    let t = test_app(StubVerifier::default());
    let (status, json) = send(&t.app, post_json("/api/v1/auth/signup", ann_signup())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(!json["token"].as_str().unwrap().is_empty());
    assert_eq!(json["user"]["email"], "ann@x.com");
    let user = json["user"].as_object().unwrap();
    assert!(!user.contains_key("password"));
    assert!(!user.contains_key("password_hash"));
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let t = test_app(StubVerifier::default());
    signup_token(&t.app).await;

    let mut again = ann_signup();
    again["username"] = json!("ann2");
    let (status, json) = send(&t.app, post_json("/api/v1/auth/signup", again)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["message"], "Email already registered");
}

#[tokio::test]
async fn signup_rejects_invalid_fields() {
    let t = test_app(StubVerifier::default());
    let mut bad = ann_signup();
    bad["email"] = json!("not-an-email");
    let (status, _) = send(&t.app, post_json("/api/v1/auth/signup", bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(t.store.is_empty());
}

#[tokio::test]
async fn incomplete_or_malformed_bodies_are_400_json() {
    let t = test_app(StubVerifier::default());

    let req = post_json("/api/v1/auth/signup", json!({"email": "a@x.com"}));
    let resp = t.app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "application/json"
    );

    let garbage = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/signin")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = send(&t.app, garbage).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");

    let no_content_type = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/signin")
        .body(Body::from(json!({"email": "a@x.com", "password": "x"}).to_string()))
        .unwrap();
    let (status, json) = send(&t.app, no_content_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().starts_with("Invalid request body"));
    assert!(t.store.is_empty());
}

#[tokio::test]
async fn malformed_query_string_is_400_json() {
    let t = test_app(StubVerifier::default());
    let (status, json) = send(&t.app, get_with_auth("/api/v1/feed?page=abc", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
    assert!(json["message"].as_str().unwrap().starts_with("Invalid query string"));
}

#[tokio::test]
async fn signin_failures_do_not_reveal_which_part_was_wrong() {
    let t = test_app(StubVerifier::default());
    signup_token(&t.app).await;

    let wrong_password = json!({"email": "ann@x.com", "password": "wrong-password"});
    let (status_a, json_a) = send(&t.app, post_json("/api/v1/auth/signin", wrong_password)).await;
    let unknown_email = json!({"email": "nobody@x.com", "password": "password123"});
    let (status_b, json_b) = send(&t.app, post_json("/api/v1/auth/signin", unknown_email)).await;

    assert_eq!(status_a, StatusCode::UNAUTHORIZED);
    assert_eq!(status_b, StatusCode::UNAUTHORIZED);
    assert_eq!(json_a, json_b);
}

#[tokio::test]
async fn signin_with_correct_password_issues_token() {
    let t = test_app(StubVerifier::default());
    signup_token(&t.app).await;

    let body = json!({"email": "ann@x.com", "password": "password123"});
    let (status, json) = send(&t.app, post_json("/api/v1/auth/signin", body)).await;
    assert_eq!(status, StatusCode::OK);

    let claims = SessionTokens::with_default_ttl(SECRET.as_bytes())
        .verify(json["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.email, "ann@x.com");
    assert_eq!(claims.user_id, json["user"]["id"].as_i64().unwrap());
}

#[tokio::test]
async fn protected_route_without_header_is_rejected() {
    let t = test_app(StubVerifier::default());
    let (status, json) = send(&t.app, get_with_auth("/api/v1/profile", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Missing Authorization header");
}

#[tokio::test]
async fn protected_route_with_garbage_token_is_rejected() {
    let t = test_app(StubVerifier::default());
    let (status, _) = send(&t.app, get_with_auth("/api/v1/profile", Some("Bearer garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&t.app, get_with_auth("/api/v1/profile", Some("Token abc"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_elsewhere_is_rejected() {
    let t = test_app(StubVerifier::default());
    let token = signup_token(&t.app).await;
    let user: User = t.store.all().into_iter().next().unwrap();
    let forged = SessionTokens::with_default_ttl(b"another-secret")
        .issue(&user)
        .unwrap();
    assert_ne!(token, forged);

    let auth = format!("Bearer {forged}");
    let (status, _) = send(&t.app, get_with_auth("/api/v1/profile", Some(&auth))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_round_trip_with_session_token() {
    let t = test_app(StubVerifier::default());
    let token = signup_token(&t.app).await;
    let auth = format!("bearer {token}");

    let (status, json) = send(&t.app, get_with_auth("/api/v1/profile", Some(&auth))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["user"]["username"], "ann1");
}

#[tokio::test]
async fn optional_auth_route_rejects_invalid_token() {
    let t = test_app(StubVerifier::default());
    let (status, _) = send(&t.app, get_with_auth("/api/v1/feed", Some("Bearer garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn search_requires_query() {
    let t = test_app(StubVerifier::default());
    let auth = format!("Bearer {}", signup_token(&t.app).await);
    let (status, json) = send(&t.app, get_with_auth("/api/v1/users/search?q=", Some(&auth))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
}

#[tokio::test]
async fn suggested_users_exclude_caller() {
    let t = test_app(StubVerifier::default());
    let auth = format!("Bearer {}", signup_token(&t.app).await);
    let other = json!({
        "name": "Bob",
        "username": "bob1",
        "email": "bob@x.com",
        "password": "password123",
    });
    send(&t.app, post_json("/api/v1/auth/signup", other)).await;

    let (status, json) = send(&t.app, get_with_auth("/api/v1/users/suggested", Some(&auth))).await;
    assert_eq!(status, StatusCode::OK);
    let users = json["data"]["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "bob1");
}

#[tokio::test]
async fn firebase_login_creates_and_reuses_one_account() {
    let mut verifier = StubVerifier::default();
    verifier.tokens.insert(
        "good-token".into(),
        ExternalIdentity {
            subject: "uid-123".into(),
            email: Some("fb@x.com".into()),
            email_verified: true,
            display_name: Some("Fiona".into()),
        },
    );
    let t = test_app(verifier);

    let body = json!({"idToken": "good-token"});
    let (status, first) = send(&t.app, post_json("/api/v1/auth/firebase-login", body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["user"]["display_name"], "Fiona");

    let (_, second) = send(&t.app, post_json("/api/v1/auth/firebase-login", body)).await;
    assert_eq!(first["user"]["id"], second["user"]["id"]);
    assert_eq!(t.store.len(), 1);
}

#[tokio::test]
async fn firebase_login_with_invalid_token_is_unauthorized() {
    let t = test_app(StubVerifier::default());
    let body = json!({"idToken": "forged"});
    let (status, json) = send(&t.app, post_json("/api/v1/auth/firebase-login", body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Invalid identity token");
    assert!(t.store.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_logins_create_exactly_one_user() {
    let mut verifier = StubVerifier::default();
    verifier.tokens.insert(
        "race-token".into(),
        ExternalIdentity {
            subject: "uid-race".into(),
            email: Some("race@x.com".into()),
            email_verified: true,
            display_name: None,
        },
    );
    let t = test_app(verifier);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let app = t.app.clone();
        handles.push(tokio::spawn(async move {
            send(&app, post_json("/api/v1/auth/firebase-login", json!({"idToken": "race-token"})))
                .await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        let (status, json) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK, "{json}");
        ids.push(json["user"]["id"].as_i64().unwrap());
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(t.store.len(), 1);
}

#[tokio::test]
async fn legacy_register_conflicts_on_known_subject() {
    let t = test_app(StubVerifier::default());
    let body = json!({"name": "Leo", "email": "leo@x.com", "firebase_uid": "uid-legacy"});

    let (status, json) = send(&t.app, post_json("/api/v1/auth/register", body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(json.get("token").is_none());
    assert_eq!(json["user"]["email"], "leo@x.com");

    let (status, _) = send(&t.app, post_json("/api/v1/auth/register", body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn post_validation_runs_before_storage() {
    let t = test_app(StubVerifier::default());
    let token = signup_token(&t.app).await;
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/posts")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(json!({"content": ""}).to_string()))
        .unwrap();
    let (status, _) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn self_follow_and_self_friend_request_are_rejected() {
    let t = test_app(StubVerifier::default());
    let token = signup_token(&t.app).await;
    let me = t.store.all()[0].id;

    let follow = Request::builder()
        .method("POST")
        .uri(format!("/api/v1/users/{me}/follow"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&t.app, follow).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut friend = post_json("/api/v1/friends/request", json!({"receiver_id": me}));
    friend.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    let (status, _) = send(&t.app, friend).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
