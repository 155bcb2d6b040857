mod common;

use auth::Claims;
use auth::TokenKind;
use chrono::Duration;
use common::TestApp;
use common::PASSWORD;
use music_service::domain::auth::ports::TokenCache;
use reqwest::header::WWW_AUTHENTICATE;
use reqwest::StatusCode;
use serde_json::json;
use serde_json::Value;

fn token(body: &Value, field: &str) -> String {
    body[field]
        .as_str()
        .unwrap_or_else(|| panic!("Missing {}", field))
        .to_string()
}

#[tokio::test]
async fn test_register_success() {
    let app = TestApp::spawn().await;

    let body = app.register("alice", "alice@x.com").await;

    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@x.com");
    assert_eq!(body["role"], "user");
    assert_eq!(body["is_active"], true);
    assert!(body["id"].is_string());
    assert!(body["created_at"].is_string());
    assert!(body["updated_at"].is_null());
    assert!(body.get("password_hash").is_none());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_register_duplicate_username_and_email() {
    let app = TestApp::spawn().await;
    let original = app.register("alice", "alice@x.com").await;

    let response = app
        .post("/api/auth/register")
        .json(&json!({
            "username": "alice",
            "email": "other@x.com",
            "password": PASSWORD
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["message"], "Username already taken");

    let response = app
        .post("/api/auth/register")
        .json(&json!({
            "username": "alice2",
            "email": "alice@x.com",
            "password": PASSWORD
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["message"], "Email already registered");

    // The existing account keeps its id, email and password.
    let pair = app.login("alice").await;
    let response = app
        .get_authenticated("/api/users/me", &token(&pair, "access_token"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    let profile: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(profile, original);
    assert_eq!(profile["email"], "alice@x.com");
}

#[tokio::test]
async fn test_register_validation_failures() {
    let app = TestApp::spawn().await;

    for payload in [
        json!({ "username": "alice", "email": "alice@x.com", "password": "password" }),
        json!({ "username": "al", "email": "alice@x.com", "password": PASSWORD }),
        json!({ "username": "alice", "email": "not-an-email", "password": PASSWORD }),
        json!({ "username": "alice", "email": "alice@x.com" }),
    ] {
        let response = app
            .post("/api/auth/register")
            .json(&payload)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{}", payload);
    }
}

#[tokio::test]
async fn test_login_by_username_and_email() {
    let app = TestApp::spawn().await;
    let user = app.register("alice", "alice@x.com").await;

    for identifier in ["alice", "alice@x.com"] {
        let body = app.login(identifier).await;

        assert_eq!(body["token_type"], "bearer");
        assert_eq!(body["expires_in"], 900);

        let access = app.jwt_handler.decode(&token(&body, "access_token")).unwrap();
        let refresh = app.jwt_handler.decode(&token(&body, "refresh_token")).unwrap();
        assert_eq!(access.kind, TokenKind::Access);
        assert_eq!(refresh.kind, TokenKind::Refresh);
        assert_eq!(access.sub, user["id"].as_str().unwrap());
        assert_eq!(access.username.as_deref(), Some("alice"));
        assert_eq!(access.scopes, vec!["user".to_string()]);
    }
}

#[tokio::test]
async fn test_login_accepts_password_form() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com").await;

    let response = app
        .post("/api/auth/login")
        .form(&[("username", "alice"), ("password", PASSWORD)])
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["access_token"].is_string());
}

#[tokio::test]
async fn test_login_failures_are_generic() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com").await;

    let mut messages = Vec::new();
    for (identifier, password) in [("alice", "Wr0ng!Pass"), ("mallory", PASSWORD)] {
        let response = app
            .post("/api/auth/login")
            .json(&json!({ "username_or_email": identifier, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get(WWW_AUTHENTICATE).unwrap(), "Bearer");
        let body: Value = response.json().await.expect("Failed to parse response");
        messages.push(body["data"]["message"].clone());
    }

    assert_eq!(messages[0], messages[1]);
}

#[tokio::test]
async fn test_refresh_rotates_and_old_token_is_single_use() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com").await;
    let first = app.login("alice").await;
    let r1 = token(&first, "refresh_token");

    let response = app.refresh(&r1).await;
    assert_eq!(response.status(), StatusCode::OK);
    let second: Value = response.json().await.expect("Failed to parse response");
    let r2 = token(&second, "refresh_token");
    assert_ne!(r1, r2);

    let response = app.refresh(&r1).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers().get(WWW_AUTHENTICATE).unwrap(), "Bearer");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["message"], "Could not validate credentials");

    assert_eq!(app.refresh(&r2).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_writes_revocation_marker() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com").await;
    let pair = app.login("alice").await;
    let refresh_token = token(&pair, "refresh_token");
    let jti = app.jwt_handler.decode(&refresh_token).unwrap().jti;

    assert_eq!(app.refresh(&refresh_token).await.status(), StatusCode::OK);

    let marker = app
        .cache
        .get(&format!("blacklist:{}", jti))
        .await
        .unwrap();
    assert_eq!(marker, Some(json!({ "revoked": true })));
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com").await;
    let pair = app.login("alice").await;

    let response = app.refresh(&token(&pair, "access_token")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rejects_expired_and_tampered_tokens() {
    let app = TestApp::spawn().await;
    let user = app.register("alice", "alice@x.com").await;
    let user_id = user["id"].as_str().unwrap();

    let expired = app
        .jwt_handler
        .encode(&Claims::new(TokenKind::Refresh, user_id, Duration::minutes(-5)))
        .unwrap();
    assert_eq!(app.refresh(&expired).await.status(), StatusCode::UNAUTHORIZED);

    let pair = app.login("alice").await;
    let refresh_token = token(&pair, "refresh_token");
    let (unsigned, _) = refresh_token.rsplit_once('.').unwrap();
    let tampered = format!("{}.{}", unsigned, "c2lnbmF0dXJlLW9mLXNvbWVvbmUtZWxzZQ");
    assert_eq!(app.refresh(&tampered).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com").await;
    let pair = app.login("alice").await;
    let refresh_token = token(&pair, "refresh_token");

    let response = app
        .post("/api/auth/logout")
        .form(&[("refresh_token", refresh_token.as_str())])
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(app.refresh(&refresh_token).await.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .post("/api/auth/logout")
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Access tokens stay valid until they expire.
    let response = app
        .get_authenticated("/api/users/me", &token(&pair, "access_token"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_with_garbage_token() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/auth/logout")
        .json(&json!({ "refresh_token": "not.a.token" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers().get(WWW_AUTHENTICATE).unwrap(), "Bearer");
}

#[tokio::test]
async fn test_deactivated_user_cannot_login_or_refresh() {
    let app = TestApp::spawn().await;
    let admin_token = app.admin_access_token().await;
    let alice = app.register("alice", "alice@x.com").await;
    let pair = app.login("alice").await;

    let response = app
        .patch_authenticated(
            &format!("/api/users/{}/status", alice["id"].as_str().unwrap()),
            &admin_token,
        )
        .json(&json!({ "is_active": false }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.refresh(&token(&pair, "refresh_token")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .post("/api/auth/login")
        .json(&json!({ "username_or_email": "alice", "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .get_authenticated("/api/users/me", &token(&pair, "access_token"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_refresh_for_removed_user_is_forbidden() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com").await;
    let pair = app.login("alice").await;

    app.users.remove("alice").await;

    let response = app.refresh(&token(&pair, "refresh_token")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_session_probe() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/api/auth/session")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body, json!({ "authenticated": false, "user": null }));

    let response = app
        .get_authenticated("/api/auth/session", "garbage")
        .send()
        .await
        .expect("Failed to execute request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["authenticated"], false);

    app.register("alice", "alice@x.com").await;
    let pair = app.login("alice").await;

    let response = app
        .get_authenticated("/api/auth/session", &token(&pair, "access_token"))
        .send()
        .await
        .expect("Failed to execute request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["username"], "alice");
}
