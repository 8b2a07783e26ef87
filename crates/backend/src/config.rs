//! Application configuration loaded from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::auth::AuthConfig;
use crate::storage::{FsObjectStore, HttpObjectStore, ObjectStore};

const OBJECT_STORE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    /// Static dashboard assets, served behind the session gate
    pub dashboard_dir: PathBuf,
}

/// Where dashboard data files are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Bucket endpoint reachable over HTTP
    Http { base_url: String },
    /// Local directory
    Fs { root: PathBuf },
}

impl StorageConfig {
    pub fn build(&self) -> Result<Arc<dyn ObjectStore>> {
        Ok(match self {
            StorageConfig::Http { base_url } => {
                tracing::info!("Reading data objects from {}", base_url);
                Arc::new(HttpObjectStore::new(base_url, OBJECT_STORE_TIMEOUT)?)
            }
            StorageConfig::Fs { root } => {
                tracing::info!("Reading data objects from {}", root.display());
                Arc::new(FsObjectStore::new(root.clone()))
            }
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let listen_addr = env_or("LISTEN_ADDR", "0.0.0.0:3000")
            .parse()
            .context("LISTEN_ADDR must be a valid socket address")?;

        let storage = match std::env::var("OBJECT_STORE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
        {
            Some(base_url) => StorageConfig::Http { base_url },
            None => StorageConfig::Fs {
                root: PathBuf::from(env_or("DATA_DIR", "data")),
            },
        };

        Ok(Self {
            listen_addr,
            auth: AuthConfig::from_env()?,
            storage,
            dashboard_dir: PathBuf::from(env_or("DASHBOARD_DIR", "dashboard/dist")),
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
