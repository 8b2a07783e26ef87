use std::sync::Arc;

use dashboard_backend::{
    auth::GoogleProvider, build_router, config::AppConfig, AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dashboard_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    tracing::info!("Starting traffic dashboard backend");

    let store = config.storage.build()?;
    let provider = Arc::new(GoogleProvider::new(&config.auth)?);

    let dashboard_dir = config.dashboard_dir.exists().then_some(config.dashboard_dir.as_path());
    if dashboard_dir.is_none() {
        tracing::info!(
            "Dashboard directory not found at {}, serving API only",
            config.dashboard_dir.display()
        );
    }

    let state = AppState::new(config.auth.clone(), provider, store);
    let app = build_router(state, dashboard_dir);

    tracing::info!("Server listening on {}", config.listen_addr);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
