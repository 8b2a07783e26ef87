//! Traffic dashboard backend: Google-login sessions in front of CSV/JSON data files.

use std::path::Path;
use std::sync::Arc;

use axum::{http::StatusCode, middleware, routing::get, Router};
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod storage;

use auth::{AuthConfig, IdentityProvider};
use storage::ObjectStore;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth_config: Arc<AuthConfig>,
    pub provider: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn ObjectStore>,
}

impl AppState {
    pub fn new(
        auth_config: AuthConfig,
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            auth_config: Arc::new(auth_config),
            provider,
            store,
        }
    }
}

/// Build the application router.
///
/// Every route, including the static dashboard fallback, runs behind
/// [`auth::require_session`].
pub fn build_router(state: AppState, dashboard_dir: Option<&Path>) -> Router {
    let app = Router::new()
        .route("/health", get(health_check))
        // Auth routes
        .route("/api/auth/login", get(auth::auth_login))
        .route("/api/auth/callback", get(auth::auth_callback))
        .route("/api/auth/logout", get(auth::auth_logout))
        .route("/api/auth/me", get(auth::auth_me))
        .route("/api/auth/check", get(auth::auth_check))
        // Data routes
        .route("/api/data/revenue", get(data::revenue))
        .route("/api/data/rd", get(data::rank_history))
        .route("/api/data/agent-niche", get(data::agent_niche))
        .route("/api/data/sync-log", get(data::sync_log))
        .route("/api/data/sync-status", get(data::sync_status));

    let app = match dashboard_dir {
        Some(dir) => {
            tracing::info!("Serving dashboard from {}", dir.display());
            let serve_dir =
                ServeDir::new(dir).not_found_service(ServeFile::new(dir.join("index.html")));
            app.fallback_service(serve_dir)
        }
        None => app,
    };

    app.layer(middleware::from_fn_with_state(
        state.clone(),
        auth::require_session,
    ))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}
