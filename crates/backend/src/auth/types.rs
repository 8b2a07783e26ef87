//! Auth-related types and configuration.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Cookie that carries the session credential.
pub const SESSION_COOKIE: &str = "auth_session";

/// Header carrying the pre-shared end-to-end test token.
pub const TEST_TOKEN_HEADER: &str = "x-test-token";

/// Session lifetime: 24 hours.
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;

/// Claims carried in the payload segment of a session credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Lowercased email, the authorization key
    pub email: String,
    /// Display name from Google
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Avatar URL from Google
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Expiry, unix seconds
    #[serde(rename = "exp", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl SessionClaims {
    pub fn for_identity(identity: &Identity, expires_at: i64) -> Self {
        Self {
            email: identity.email.to_lowercase(),
            name: identity.name.clone(),
            picture: identity.picture.clone(),
            expires_at: Some(expires_at),
        }
    }
}

/// Verified profile handed back by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Validated user from a session cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl From<SessionClaims> for AuthUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            email: claims.email,
            name: claims.name,
            picture: claims.picture,
        }
    }
}

/// Emails permitted to receive a session.
///
/// Consulted at login only; sessions already issued stay valid until they
/// expire even if their email is later removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList(Vec<String>);

impl AllowList {
    /// Parse a comma-separated list. Entries are trimmed and lowercased,
    /// empty entries dropped.
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    /// Exact, case-insensitive membership. No wildcard or domain matching.
    pub fn is_allowed(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.0.iter().any(|allowed| *allowed == email)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Check a candidate email against a raw `ALLOWED_EMAILS` value.
pub fn is_email_allowed(email: &str, allow_list: &str) -> bool {
    AllowList::parse(allow_list).is_allowed(email)
}

/// Auth configuration, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC key for session credentials; `None` disables login entirely
    pub session_secret: Option<String>,
    pub allowed_emails: AllowList,
    pub session_ttl_secs: i64,
    pub cookie_name: String,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    /// Origin used to build the OAuth callback URL, e.g. `https://dash.example.com`
    pub public_base_url: Option<String>,
    /// Pre-shared token for the `X-Test-Token` bypass; `None` disables it
    pub test_token: Option<String>,
    pub provider_timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: None,
            allowed_emails: AllowList::default(),
            session_ttl_secs: SESSION_TTL_SECS,
            cookie_name: SESSION_COOKIE.to_string(),
            google_client_id: None,
            google_client_secret: None,
            public_base_url: None,
            test_token: None,
            provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
        }
    }
}

impl AuthConfig {
    /// Load auth configuration from environment variables.
    ///
    /// Env vars:
    /// - `SESSION_SECRET`: key for signing session credentials
    /// - `ALLOWED_EMAILS`: comma-separated list of allowed email addresses
    /// - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET`: Google OAuth client
    /// - `PUBLIC_BASE_URL`: origin for the OAuth callback (optional)
    /// - `E2E_TEST_TOKEN`: enables the test bypass header (optional)
    /// - `PROVIDER_TIMEOUT_SECS`: timeout for Google calls (default 10)
    ///
    /// Missing secrets are not fatal here: they surface as configuration
    /// errors on the requests that need them.
    pub fn from_env() -> anyhow::Result<Self> {
        let provider_timeout = match non_empty_env("PROVIDER_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse()
                    .context("PROVIDER_TIMEOUT_SECS must be a valid number")?,
            ),
            None => Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
        };

        let config = Self {
            session_secret: non_empty_env("SESSION_SECRET"),
            allowed_emails: AllowList::parse(&non_empty_env("ALLOWED_EMAILS").unwrap_or_default()),
            google_client_id: non_empty_env("GOOGLE_CLIENT_ID"),
            google_client_secret: non_empty_env("GOOGLE_CLIENT_SECRET"),
            public_base_url: non_empty_env("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            test_token: non_empty_env("E2E_TEST_TOKEN"),
            provider_timeout,
            ..Self::default()
        };

        if config.session_secret.is_none() {
            tracing::warn!("SESSION_SECRET not set; logins will fail and all sessions are rejected");
        }
        if config.allowed_emails.is_empty() {
            tracing::warn!("ALLOWED_EMAILS is empty; nobody will be able to log in");
        }
        if config.test_token.is_some() {
            tracing::warn!("E2E_TEST_TOKEN is set; test bypass header is enabled");
        }

        Ok(config)
    }

    /// Check if an email address is in the allowed list.
    pub fn is_email_allowed(&self, email: &str) -> bool {
        self.allowed_emails.is_allowed(email)
    }

    pub fn has_session_secret(&self) -> bool {
        self.session_secret.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Whether the `X-Test-Token` bypass is enabled.
    pub fn has_test_token(&self) -> bool {
        self.test_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
