//! Configuration file watcher for hot reload.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::NanoConfig;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<NanoConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<NanoConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    tracing::info!("Config file change detected, reloading");
                    match load_config(&path) {
                        Ok(new_config) => {
                            let _ = tx.send(new_config);
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Settings that cannot change without a restart.
pub fn restart_required(current: &NanoConfig, next: &NanoConfig) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if current.node != next.node {
        changed.push("node");
    }
    if current.wallet.private_key != next.wallet.private_key {
        changed.push("wallet.private_key");
    }
    if current.server != next.server {
        changed.push("server");
    }
    if current.observability != next.observability {
        changed.push("observability");
    }
    changed
}

/// Copy the hot-reloadable settings of `next` into `running`.
///
/// Returns the new `max_send_amount` when it changed. Everything else in
/// `running` keeps describing what the process actually serves with.
pub fn apply_hot_changes(running: &mut NanoConfig, next: &NanoConfig) -> Option<String> {
    if running.wallet.max_send_amount == next.wallet.max_send_amount {
        return None;
    }
    running.wallet.max_send_amount = next.wallet.max_send_amount.clone();
    Some(running.wallet.max_send_amount.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_max_send_is_hot() {
        let current = NanoConfig::default();
        let mut next = current.clone();
        next.wallet.max_send_amount = "1".to_string();
        assert!(restart_required(&current, &next).is_empty());

        next.node.rpc_timeout_secs = 1;
        next.server.bind_address = "0.0.0.0:1".to_string();
        assert_eq!(restart_required(&current, &next), vec!["node", "server"]);
    }

    #[test]
    fn test_unapplied_changes_keep_warning() {
        let mut running = NanoConfig::default();
        let mut next = running.clone();
        next.node.rpc_timeout_secs = 1;
        next.wallet.max_send_amount = "0.5".to_string();

        assert_eq!(apply_hot_changes(&mut running, &next).as_deref(), Some("0.5"));
        assert_eq!(running.wallet.max_send_amount, "0.5");
        assert_eq!(running.node.rpc_timeout_secs, 60);

        // The same file again: the limit is settled, the node change still pending.
        assert_eq!(apply_hot_changes(&mut running, &next), None);
        assert_eq!(restart_required(&running, &next), vec!["node"]);
    }
}
