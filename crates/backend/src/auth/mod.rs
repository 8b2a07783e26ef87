//! Cookie-based session auth with Google OAuth login.
//!
//! This module provides:
//! - Signed, expiring session credentials (`session`)
//! - Google OAuth flow for user login (`provider`, `handlers`)
//! - The per-request gate and endpoint checks (`middleware`)
//! - Email allow-list validation (`types`)

mod handlers;
pub mod middleware;
mod pages;
pub mod provider;
pub mod session;
pub mod types;

pub use handlers::{auth_callback, auth_check, auth_login, auth_logout, auth_me};
pub use middleware::{authorize_request, require_session, Principal};
pub use provider::{GoogleProvider, IdentityProvider};
pub use session::{verify_session, RejectReason, SessionSigner, Verification};
pub use types::{AllowList, AuthConfig, AuthUser, Identity, SessionClaims};
