//! Integration tests for the per-request session gate.


use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, StatusCode};
use chrono::Utc;
use dashboard_backend::auth::{SessionClaims, SessionSigner};
use dashboard_backend::{build_router, AppState};
use test_helpers::*;
use tower::ServiceExt;

#[tokio::test]
async fn test_no_cookie_redirects_to_login_with_return_path() {
    let app = build_app(MemoryStore::default());

    let resp = app
        .oneshot(get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        header_str(&resp, header::LOCATION),
        Some("/api/auth/login?redirect=%2F")
    );
    assert!(set_cookies(&resp).is_empty());
}

#[tokio::test]
async fn test_redirect_carries_nested_path() {
    let app = build_app(MemoryStore::default());

    let resp = app
        .oneshot(get("/reports/weekly.html").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        header_str(&resp, header::LOCATION),
        Some("/api/auth/login?redirect=%2Freports%2Fweekly.html")
    );
}

#[tokio::test]
async fn test_invalid_cookie_redirects_and_clears_cookie() {
    let app = build_app(MemoryStore::default());

    let resp = app
        .oneshot(get_with_session("/", "not.a.credential"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FOUND);
    let cookies = set_cookies(&resp);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("auth_session=;"));
    assert!(cookies[0].contains("Max-Age=0"));
}

#[tokio::test]
async fn test_expired_cookie_redirects_and_clears_cookie() {
    let app = build_app(MemoryStore::default());

    let resp = app
        .oneshot(get_with_session("/", &expired_token("test@example.com")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(set_cookies(&resp)
        .iter()
        .any(|c| c.starts_with("auth_session=;")));
}

#[tokio::test]
async fn test_cookie_signed_with_other_secret_is_rejected() {
    let app = build_app(MemoryStore::default());
    let token = SessionSigner::new("someone-elses-secret", 3600)
        .sign(&SessionClaims {
            email: "test@example.com".into(),
            name: None,
            picture: None,
            expires_at: Some(Utc::now().timestamp() + 3600),
        })
        .unwrap();

    let resp = app.oneshot(get_with_session("/", &token)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_cookie_without_email_is_rejected() {
    let app = build_app(MemoryStore::default());
    let token = SessionSigner::new(TEST_SECRET, 3600)
        .sign(&SessionClaims {
            email: String::new(),
            name: None,
            picture: None,
            expires_at: Some(Utc::now().timestamp() + 3600),
        })
        .unwrap();

    let resp = app.oneshot(get_with_session("/", &token)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(!set_cookies(&resp).is_empty());
}

#[tokio::test]
async fn test_valid_cookie_passes_through() {
    let app = build_app(MemoryStore::default());

    // No dashboard directory is mounted, so a request that passes the gate
    // ends in the router's plain 404.
    let resp = app
        .oneshot(get_with_session("/", &session_token("test@example.com")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(resp.headers().get(header::LOCATION).is_none());
}

#[tokio::test]
async fn test_dashboard_served_behind_gate() {
    let dir = std::env::temp_dir().join(format!("dashboard-gate-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>Traffic</h1>").unwrap();

    let state = AppState::new(
        test_auth_config(),
        Arc::new(FakeProvider::returning("test@example.com")),
        Arc::new(MemoryStore::default()),
    );
    let app = build_router(state, Some(dir.as_path()));

    let anonymous = app
        .clone()
        .oneshot(get("/index.html").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::FOUND);

    let resp = app
        .oneshot(get_with_session("/index.html", &session_token("test@example.com")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(response_text(resp).await, "<h1>Traffic</h1>");

    std::fs::remove_dir_all(dir).ok();
}

#[tokio::test]
async fn test_public_paths_skip_the_gate() {
    let app = build_app(MemoryStore::default());

    let health = app
        .clone()
        .oneshot(get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    // Public even with a broken cookie, and no cookie clearing either
    let robots = app
        .oneshot(get_with_session("/robots.txt", "garbage"))
        .await
        .unwrap();
    assert_eq!(robots.status(), StatusCode::NOT_FOUND);
    assert!(set_cookies(&robots).is_empty());
}

#[tokio::test]
async fn test_missing_secret_rejects_every_cookie() {
    let config = dashboard_backend::auth::AuthConfig {
        session_secret: None,
        ..test_auth_config()
    };
    let app = build_app_with(
        config,
        Arc::new(FakeProvider::returning("test@example.com")),
        MemoryStore::default(),
    );

    let resp = app
        .oneshot(get_with_session("/", &session_token("test@example.com")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
}
