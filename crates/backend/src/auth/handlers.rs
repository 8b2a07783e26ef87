//! Authentication HTTP handlers.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use shared_types::{MeResponse, SessionStatus};

use crate::error::AuthError;
use crate::AppState;

use super::middleware::{build_clear_cookie, build_session_cookie, extract_auth_user};
use super::pages::{render_access_denied, render_error, render_signed_out};
use super::session::SessionSigner;
use super::types::AuthConfig;

const CALLBACK_PATH: &str = "/api/auth/callback";

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    pub redirect: Option<String>,
}

/// Start Google OAuth login flow.
///
/// Redirects the browser to Google; the return path travels in `state`.
pub async fn auth_login(
    State(state): State<AppState>,
    Query(params): Query<LoginParams>,
    headers: HeaderMap,
) -> Response {
    let return_to = sanitize_return_path(params.redirect.as_deref());

    let redirect_uri = match callback_url(&state.auth_config, &headers) {
        Ok(uri) => uri,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    match state.provider.authorize_url(&redirect_uri, &return_to) {
        Ok(url) => (StatusCode::FOUND, [(header::LOCATION, url)]).into_response(),
        Err(e) => {
            tracing::error!("Cannot start login: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthCallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Handle Google OAuth callback.
///
/// Exchanges the authorization code for a profile, checks the email against
/// the allow-list and sets the session cookie on success.
pub async fn auth_callback(
    State(state): State<AppState>,
    Query(params): Query<AuthCallbackParams>,
    headers: HeaderMap,
) -> Response {
    match handle_callback_inner(&state, params, &headers).await {
        Ok(response) => response,
        Err(e) => callback_error_response(e),
    }
}

async fn handle_callback_inner(
    state: &AppState,
    params: AuthCallbackParams,
    headers: &HeaderMap,
) -> Result<Response, AuthError> {
    let config = &state.auth_config;

    if let Some(error) = params.error {
        tracing::warn!("Google returned an OAuth error: {}", error);
        return Err(AuthError::InvalidRequest(
            "Google login was cancelled or failed.".to_string(),
        ));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::InvalidRequest("No authorization code received.".to_string()))?;

    // Fail before talking to Google if we could not mint a session anyway
    let signer = SessionSigner::from_config(config)?;
    let redirect_uri = callback_url(config, headers)?;

    let identity = state.provider.fetch_identity(&code, &redirect_uri).await?;

    tracing::info!("OAuth login attempt from: {}", identity.email);

    if !config.is_email_allowed(&identity.email) {
        tracing::warn!("Unauthorized login attempt from: {}", identity.email);
        return Err(AuthError::NotAllowed(identity.email));
    }

    let token = signer.issue(&identity, Utc::now())?;
    let cookie = build_session_cookie(&config.cookie_name, &token, config.session_ttl_secs);
    let location = sanitize_return_path(params.state.as_deref());

    tracing::info!("Successful login for: {}", identity.email);

    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, location), (header::SET_COOKIE, cookie)],
    )
        .into_response())
}

fn callback_error_response(error: AuthError) -> Response {
    let (status, page) = match &error {
        AuthError::InvalidRequest(message) => (StatusCode::BAD_REQUEST, render_error(message)),
        AuthError::NotAllowed(email) => (StatusCode::FORBIDDEN, render_access_denied(email)),
        e if e.is_configuration() => {
            tracing::error!("Auth callback configuration error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                render_error("Sign-in is not configured on this server."),
            )
        }
        AuthError::Encoding(e) => {
            tracing::error!("Auth callback error: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                render_error("Failed to create session."),
            )
        }
        e => {
            tracing::error!("Auth callback error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, render_error(&e.to_string()))
        }
    };

    (status, Html(page)).into_response()
}

/// Get current authenticated user info.
pub async fn auth_me(State(state): State<AppState>, headers: HeaderMap) -> Json<MeResponse> {
    match extract_auth_user(&headers, &state.auth_config) {
        Some(user) => Json(MeResponse {
            authenticated: true,
            email: Some(user.email),
            name: user.name,
            picture: user.picture,
        }),
        None => Json(MeResponse::anonymous()),
    }
}

/// Report whether the request carries a valid session.
pub async fn auth_check(State(state): State<AppState>, headers: HeaderMap) -> Json<SessionStatus> {
    Json(SessionStatus {
        authenticated: extract_auth_user(&headers, &state.auth_config).is_some(),
    })
}

/// Logout - clear auth cookie.
pub async fn auth_logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            build_clear_cookie(&state.auth_config.cookie_name),
        )],
        Html(render_signed_out()),
    )
}

/// Only site-relative paths are accepted as return targets; anything else
/// (absolute URLs, `//host`) falls back to `/`.
///
/// Browsers drop tab and newline characters before parsing a `Location`, so
/// `/\t/host` would be followed as `//host`. Control characters are refused.
fn sanitize_return_path(path: Option<&str>) -> String {
    match path {
        Some(p)
            if p.starts_with('/')
                && !p.starts_with("//")
                && !p.contains('\\')
                && !p.chars().any(|c| c.is_ascii_control()) =>
        {
            p.to_string()
        }
        _ => "/".to_string(),
    }
}

/// Absolute OAuth callback URL, from `PUBLIC_BASE_URL` or the request `Host`.
fn callback_url(config: &AuthConfig, headers: &HeaderMap) -> Result<String, AuthError> {
    if let Some(base) = &config.public_base_url {
        return Ok(format!("{}{}", base, CALLBACK_PATH));
    }

    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| AuthError::InvalidRequest("Missing Host header.".to_string()))?;

    Ok(format!("https://{}{}", host, CALLBACK_PATH))
}
