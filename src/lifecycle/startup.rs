//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the configured store
//! - Start the config watcher and feed reloads to the live rate-limit policy
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::config::{ConfigError, RateLimitConfig, StorageBackend, StorageConfig};
use crate::storage::{MemoryStore, SqliteStore, StoreError, WaitlistStore};
use crate::waitlist::WaitlistService;

/// Anything that can stop the service from coming up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("config watcher: {0}")]
    Watch(#[from] notify::Error),

    #[error("invalid address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Open the store selected by configuration.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn WaitlistStore>, StoreError> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory store; entries are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Sqlite => Ok(Arc::new(SqliteStore::connect(config).await?)),
    }
}

/// Apply published rate-limit policies to the live limiter until the
/// watcher goes away or shutdown fires.
pub fn spawn_policy_reloader(
    service: Arc<WaitlistService>,
    mut policies: watch::Receiver<RateLimitConfig>,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = policies.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let policy = policies.borrow_and_update().clone();
                    service.rate_limiter().update_policy(policy);
                }
                _ = shutdown.recv() => break,
            }
        }
        tracing::debug!("Policy reloader stopped");
    })
}
