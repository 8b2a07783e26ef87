//! Session credential creation and verification.
//!
//! A credential is `<header>.<payload>.<signature>`, each segment URL-safe
//! base64 without padding. The signature is HMAC-SHA256 over the ASCII bytes
//! of `<header>.<payload>`. Verification always uses HMAC-SHA256; the header
//! is only cross-checked, never used to pick the algorithm.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::error::AuthError;

use super::types::{AuthConfig, Identity, SessionClaims};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";
const TOKEN_TYPE: &str = "JWT";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default)]
    typ: String,
}

impl Header {
    fn fixed() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
        }
    }
}

/// Why a credential was rejected. Never sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("credential must have three non-empty segments")]
    Malformed,
    #[error("segment is not valid base64url")]
    BadEncoding,
    #[error("header does not declare HS256")]
    UnsupportedAlgorithm,
    #[error("signature mismatch")]
    BadSignature,
    #[error("payload is not valid claims JSON")]
    BadPayload,
    #[error("credential has no expiry")]
    MissingExpiry,
    #[error("credential expired")]
    Expired,
    #[error("no session secret configured")]
    MissingSecret,
}

/// Outcome of verifying a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Accepted(SessionClaims),
    Rejected(RejectReason),
}

impl Verification {
    /// Collapse to the claims, dropping the rejection reason.
    pub fn into_claims(self) -> Option<SessionClaims> {
        match self {
            Verification::Accepted(claims) => Some(claims),
            Verification::Rejected(_) => None,
        }
    }
}

/// Issues and verifies session credentials with one server-held secret.
#[derive(Clone)]
pub struct SessionSigner {
    secret: Vec<u8>,
    ttl_secs: i64,
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl SessionSigner {
    pub fn new(secret: impl Into<Vec<u8>>, ttl_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs,
        }
    }

    /// Build a signer from config; fails if no secret is configured.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        match config.session_secret.as_deref() {
            Some(secret) if !secret.is_empty() => Ok(Self::new(secret, config.session_ttl_secs)),
            _ => Err(AuthError::MissingSecret),
        }
    }

    /// Mint a credential for `identity`, expiring `ttl_secs` after `now`.
    pub fn issue(&self, identity: &Identity, now: DateTime<Utc>) -> Result<String, AuthError> {
        let expires_at = Duration::try_seconds(self.ttl_secs)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or(AuthError::InvalidTtl(self.ttl_secs))?
            .timestamp();
        self.sign(&SessionClaims::for_identity(identity, expires_at))
    }

    /// Encode and sign `claims` as they are.
    pub fn sign(&self, claims: &SessionClaims) -> Result<String, AuthError> {
        let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&Header::fixed())?);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);

        let mut mac = self.mac().ok_or(AuthError::MissingSecret)?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}.{}", header, payload, signature))
    }

    /// Verify `token` as of `now`. Pure: no I/O, no clock access.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Verification {
        match self.check(token, now) {
            Ok(claims) => Verification::Accepted(claims),
            Err(reason) => Verification::Rejected(reason),
        }
    }

    fn check(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, RejectReason> {
        let segments: Vec<&str> = token.split('.').collect();
        let [header, payload, signature] = segments.as_slice() else {
            return Err(RejectReason::Malformed);
        };
        if header.is_empty() || payload.is_empty() || signature.is_empty() {
            return Err(RejectReason::Malformed);
        }

        let signature = decode_segment(signature)?;
        let mut mac = self.mac().ok_or(RejectReason::MissingSecret)?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        // verify_slice compares in constant time over the full tag
        mac.verify_slice(&signature)
            .map_err(|_| RejectReason::BadSignature)?;

        let header: Header = serde_json::from_slice(&decode_segment(header)?)
            .map_err(|_| RejectReason::Malformed)?;
        if header.alg != ALGORITHM {
            return Err(RejectReason::UnsupportedAlgorithm);
        }

        let claims: SessionClaims = serde_json::from_slice(&decode_segment(payload)?)
            .map_err(|_| RejectReason::BadPayload)?;

        let expires_at = claims.expires_at.ok_or(RejectReason::MissingExpiry)?;
        if now.timestamp() >= expires_at {
            return Err(RejectReason::Expired);
        }

        Ok(claims)
    }

    fn mac(&self) -> Option<HmacSha256> {
        if self.secret.is_empty() {
            return None;
        }
        HmacSha256::new_from_slice(&self.secret).ok()
    }
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, RejectReason> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| RejectReason::BadEncoding)
}

/// Verify a credential against the configured secret.
///
/// This is the boundary towards HTTP handlers: the rejection reason is logged
/// and dropped so responses never reveal why a credential failed.
pub fn verify_session(
    config: &AuthConfig,
    token: &str,
    now: DateTime<Utc>,
) -> Option<SessionClaims> {
    let verification = match SessionSigner::from_config(config) {
        Ok(signer) => signer.verify(token, now),
        Err(_) => Verification::Rejected(RejectReason::MissingSecret),
    };

    if let Verification::Rejected(reason) = &verification {
        tracing::debug!("Session rejected: {}", reason);
    }
    verification.into_claims()
}
