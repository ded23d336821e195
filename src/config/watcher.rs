//! Hot reload of the rate-limit policy.
//!
//! The file is re-read on every change. Only `[rate_limit]` takes effect on a
//! running service; edits to any other section are reported and left for the
//! next restart.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::watch;

use crate::config::loader::load_config;
use crate::config::schema::{RateLimitConfig, WaitlistConfig};

/// Watches the config file and publishes the latest rate-limit policy.
pub struct ConfigWatcher {
    path: PathBuf,
    active: WaitlistConfig,
    policy_tx: watch::Sender<RateLimitConfig>,
}

impl ConfigWatcher {
    /// `active` is the configuration the service started with. The receiver
    /// starts at its rate-limit section and only changes when that section does.
    pub fn new(path: &Path, active: WaitlistConfig) -> (Self, watch::Receiver<RateLimitConfig>) {
        let (policy_tx, policy_rx) = watch::channel(active.rate_limit.clone());
        (
            Self {
                path: path.to_path_buf(),
                active,
                policy_tx,
            },
            policy_rx,
        )
    }

    /// Start watching. Dropping the returned handle stops the watch.
    pub fn run(mut self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    match load_config(&self.path) {
                        Ok(reloaded) => self.apply(reloaded),
                        Err(e) => tracing::error!(
                            path = ?self.path,
                            error = %e,
                            "Rejected config reload, keeping current policy"
                        ),
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?path, "Watching config for rate-limit changes");
        Ok(watcher)
    }

    /// Compare a freshly loaded config against the active one and publish
    /// the rate-limit section if it moved.
    fn apply(&mut self, reloaded: WaitlistConfig) {
        let pending = restart_sections(&self.active, &reloaded);
        if !pending.is_empty() {
            tracing::warn!(sections = ?pending, "Config sections changed; restart to apply");
        }

        if reloaded.rate_limit != self.active.rate_limit {
            self.policy_tx.send_replace(reloaded.rate_limit.clone());
        }
        self.active = reloaded;
    }
}

/// Sections that differ between `old` and `new` and cannot change live.
fn restart_sections(old: &WaitlistConfig, new: &WaitlistConfig) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if old.listener != new.listener {
        changed.push("listener");
    }
    if old.timeouts != new.timeouts {
        changed.push("timeouts");
    }
    if old.storage != new.storage {
        changed.push("storage");
    }
    if old.observability != new.observability {
        changed.push("observability");
    }
    if old.security != new.security {
        changed.push("security");
    }
    changed
}
