//! External identity provider (Google OAuth).
//!
//! The provider only turns a one-time authorization code into a verified
//! email address; sessions are minted by the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

use super::types::{AuthConfig, Identity};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the browser is sent to; `state` comes back on the callback.
    fn authorize_url(&self, redirect_uri: &str, state: &str) -> Result<String, AuthError>;

    /// Exchange `code` for the user's profile. Not retried on failure.
    async fn fetch_identity(&self, code: &str, redirect_uri: &str)
        -> Result<Identity, AuthError>;
}

/// Google OAuth client.
pub struct GoogleProvider {
    client_id: Option<String>,
    client_secret: Option<String>,
    http: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleProvider {
    /// Build the client; every outbound call is bounded by the configured timeout.
    pub fn new(config: &AuthConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.provider_timeout)
            .build()?;

        Ok(Self {
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            http,
        })
    }

    fn client_id(&self) -> Result<&str, AuthError> {
        self.client_id.as_deref().ok_or(AuthError::MissingClientId)
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, AuthError> {
        let client_id = self.client_id()?;

        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&TokenRequest {
                code,
                client_id,
                client_secret: self.client_secret.as_deref().unwrap_or_default(),
                redirect_uri,
                grant_type: "authorization_code",
            })
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Token exchange request failed: {}", e);
                AuthError::Provider("Failed to exchange authorization code".to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Token exchange failed: {} - {}", status, body);
            return Err(AuthError::Provider(
                "Failed to exchange authorization code".to_string(),
            ));
        }

        let tokens: GoogleTokenResponse = response.json().await.map_err(|e| {
            tracing::error!("Invalid token response: {}", e);
            AuthError::Provider("Failed to exchange authorization code".to_string())
        })?;

        Ok(tokens.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<GoogleUserInfo, AuthError> {
        let response = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("User info request failed: {}", e);
                AuthError::Provider("Failed to get user info".to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!("User info request failed: {}", response.status());
            return Err(AuthError::Provider("Failed to get user info".to_string()));
        }

        response.json().await.map_err(|e| {
            tracing::error!("Invalid user info response: {}", e);
            AuthError::Provider("Failed to get user info".to_string())
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self, redirect_uri: &str, state: &str) -> Result<String, AuthError> {
        Ok(format!(
            "{}?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             scope={}&\
             access_type=online&\
             state={}&\
             prompt=select_account",
            GOOGLE_AUTH_URL,
            urlencoding::encode(self.client_id()?),
            urlencoding::encode(redirect_uri),
            urlencoding::encode("email profile"),
            urlencoding::encode(state),
        ))
    }

    async fn fetch_identity(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Identity, AuthError> {
        let access_token = self.exchange_code(code, redirect_uri).await?;
        let profile = self.fetch_profile(&access_token).await?;

        let email = profile
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or(AuthError::MissingEmail)?;

        Ok(Identity {
            email,
            name: profile.name,
            picture: profile.picture,
        })
    }
}
