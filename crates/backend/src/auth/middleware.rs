//! Request gate and cookie helpers.
//!
//! The gate runs on every request: public paths pass straight through,
//! everything else needs a session cookie that verifies and names an email.
//! There is no caching between requests.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use cookie::{time::Duration, Cookie, SameSite};

use crate::error::ApiError;
use crate::AppState;

use super::session::verify_session;
use super::types::{AuthConfig, AuthUser, TEST_TOKEN_HEADER};

pub const LOGIN_PATH: &str = "/api/auth/login";

/// Paths reachable without a session, matched by prefix.
///
/// `/api/auth/me`, `/api/auth/check` and `/api/data/` answer unauthenticated
/// callers themselves (JSON instead of a login redirect).
const PUBLIC_PATHS: &[&str] = &[
    "/api/auth/login",
    "/api/auth/callback",
    "/api/auth/logout",
    "/api/auth/me",
    "/api/auth/check",
    "/api/data/",
    "/health",
    "/robots.txt",
    "/favicon.ico",
];

pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|public| path.starts_with(public))
}

/// Middleware that redirects unauthenticated requests to the login flow.
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn require_session(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if is_public_path(&path) {
        return next.run(request).await;
    }

    let config = &state.auth_config;
    let Some(token) = extract_session_token(request.headers(), &config.cookie_name) else {
        tracing::debug!("No session cookie for {}, redirecting to login", path);
        return login_redirect(&path, None);
    };

    match verify_session(config, &token, Utc::now()) {
        Some(claims) if !claims.email.is_empty() => next.run(request).await,
        _ => {
            tracing::debug!("Invalid session cookie for {}, clearing it", path);
            login_redirect(&path, Some(&config.cookie_name))
        }
    }
}

/// 302 to the login entry point carrying `path` as the return target.
/// When `clear_cookie` is set the stale session cookie is deleted as well.
fn login_redirect(path: &str, clear_cookie: Option<&str>) -> Response {
    let location = format!("{}?redirect={}", LOGIN_PATH, urlencoding::encode(path));
    let mut response = (StatusCode::FOUND, [(header::LOCATION, location)]).into_response();

    if let Some(name) = clear_cookie {
        if let Ok(value) = HeaderValue::from_str(&build_clear_cookie(name)) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}

/// Value of the session cookie, if present and non-empty.
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    for cookie_header in headers.get_all(header::COOKIE) {
        let Ok(cookie_header) = cookie_header.to_str() else {
            continue;
        };

        for cookie_str in cookie_header.split(';') {
            if let Ok(cookie) = Cookie::parse(cookie_str.trim()) {
                if cookie.name() == cookie_name && !cookie.value().is_empty() {
                    return Some(cookie.value().to_string());
                }
            }
        }
    }

    None
}

/// Build the `Set-Cookie` value that stores a session credential.
pub fn build_session_cookie(name: &str, token: &str, max_age_secs: i64) -> String {
    Cookie::build((name.to_string(), token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(max_age_secs))
        .build()
        .to_string()
}

/// Build the `Set-Cookie` value that deletes the session cookie.
pub fn build_clear_cookie(name: &str) -> String {
    build_session_cookie(name, "", 0)
}

/// Extract and validate the user from the session cookie.
pub fn extract_auth_user(headers: &HeaderMap, config: &AuthConfig) -> Option<AuthUser> {
    let token = extract_session_token(headers, &config.cookie_name)?;
    verify_session(config, &token, Utc::now())
        .filter(|claims| !claims.email.is_empty())
        .map(AuthUser::from)
}

/// How a data request was authorized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    User(AuthUser),
    /// Matched the configured `X-Test-Token`
    TestBypass,
}

/// Endpoint-level check used by the data proxies: a valid session cookie or
/// the test bypass header. Anything else is a 401, unless the server has no
/// way to authenticate anyone at all.
pub fn authorize_request(headers: &HeaderMap, config: &AuthConfig) -> Result<Principal, ApiError> {
    if let Some(user) = extract_auth_user(headers, config) {
        return Ok(Principal::User(user));
    }

    if has_test_token(headers, config) {
        return Ok(Principal::TestBypass);
    }

    if !config.has_session_secret() && !config.has_test_token() {
        return Err(ApiError::Config(
            "neither SESSION_SECRET nor E2E_TEST_TOKEN is configured".to_string(),
        ));
    }

    Err(ApiError::Unauthorized)
}

fn has_test_token(headers: &HeaderMap, config: &AuthConfig) -> bool {
    let Some(expected) = config.test_token.as_deref().filter(|t| !t.is_empty()) else {
        return false;
    };

    headers
        .get(TEST_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|provided| provided == expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::SessionSigner;
    use crate::auth::types::Identity;

    const SECRET: &str = "test-secret-key-for-testing-123";

    fn test_config() -> AuthConfig {
        AuthConfig {
            session_secret: Some(SECRET.to_string()),
            test_token: Some("e2e-token".to_string()),
            ..AuthConfig::default()
        }
    }

    fn valid_token() -> String {
        SessionSigner::new(SECRET, 3600)
            .issue(
                &Identity {
                    email: "test@example.com".into(),
                    name: Some("Test User".into()),
                    picture: None,
                },
                Utc::now(),
            )
            .unwrap()
    }

    fn headers_with(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_public_paths() {
        assert!(is_public_path("/api/auth/login"));
        assert!(is_public_path("/api/auth/callback"));
        assert!(is_public_path("/api/data/revenue"));
        assert!(is_public_path("/favicon.ico"));
        assert!(!is_public_path("/"));
        assert!(!is_public_path("/index.html"));
        assert!(!is_public_path("/api/other"));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = build_session_cookie("auth_session", "abc.def.ghi", 86400);
        assert!(cookie.starts_with("auth_session=abc.def.ghi"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=86400"));
    }

    #[test]
    fn test_clear_cookie_attributes() {
        let cookie = build_clear_cookie("auth_session");
        assert!(cookie.starts_with("auth_session=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("Path=/"));
    }

    #[test]
    fn test_extract_session_token_among_other_cookies() {
        let headers = headers_with(header::COOKIE, "theme=dark; auth_session=abc.def.ghi; lang=en");
        assert_eq!(
            extract_session_token(&headers, "auth_session").as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn test_extract_session_token_ignores_empty_value() {
        let headers = headers_with(header::COOKIE, "auth_session=");
        assert_eq!(extract_session_token(&headers, "auth_session"), None);
        assert_eq!(extract_session_token(&HeaderMap::new(), "auth_session"), None);
    }

    #[test]
    fn test_extract_auth_user_from_valid_cookie() {
        let headers = headers_with(header::COOKIE, &format!("auth_session={}", valid_token()));
        let user = extract_auth_user(&headers, &test_config()).expect("should authenticate");
        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.name.as_deref(), Some("Test User"));
    }

    #[test]
    fn test_forged_cookie_is_not_authorized() {
        let headers = headers_with(header::COOKIE, "auth_session=forged.token.value");
        assert!(matches!(
            authorize_request(&headers, &test_config()),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn test_bypass_header_must_match_exactly() {
        let config = test_config();
        let ok = headers_with(header::HeaderName::from_static(TEST_TOKEN_HEADER), "e2e-token");
        assert_eq!(authorize_request(&ok, &config).unwrap(), Principal::TestBypass);

        let wrong = headers_with(header::HeaderName::from_static(TEST_TOKEN_HEADER), "e2e-token2");
        assert!(authorize_request(&wrong, &config).is_err());
    }

    #[test]
    fn test_bypass_disabled_without_configured_token() {
        let config = AuthConfig {
            test_token: None,
            ..test_config()
        };
        let headers = headers_with(header::HeaderName::from_static(TEST_TOKEN_HEADER), "");
        assert!(matches!(
            authorize_request(&headers, &config),
            Err(ApiError::Unauthorized)
        ));
        assert!(authorize_request(&HeaderMap::new(), &config).is_err());
    }

    #[test]
    fn test_no_credentials_configured_is_config_error() {
        let config = AuthConfig {
            session_secret: None,
            test_token: Some(String::new()),
            ..test_config()
        };
        let headers = headers_with(header::COOKIE, &format!("auth_session={}", valid_token()));
        assert!(matches!(
            authorize_request(&headers, &config),
            Err(ApiError::Config(_))
        ));

        // A bypass token alone keeps the endpoint usable, so a miss is a 401
        let bypass_only = AuthConfig {
            session_secret: None,
            ..test_config()
        };
        assert!(matches!(
            authorize_request(&headers, &bypass_only),
            Err(ApiError::Unauthorized)
        ));
    }
}
