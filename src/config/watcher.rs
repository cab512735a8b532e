//! Hot reload of the transport section.
//!
//! Only `[transport]` is forwarded. Logging, metrics and the bind address
//! are read once at startup, so edits to them are logged and ignored.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::{ClientConfig, TransportConfig};

/// Watches a config file and forwards changed transport settings.
pub struct ConfigWatcher {
    path: PathBuf,
    current: Mutex<ClientConfig>,
    updates: mpsc::UnboundedSender<TransportConfig>,
}

impl ConfigWatcher {
    /// `initial` is the configuration already in use; reloads are diffed against it.
    pub fn new(
        path: &Path,
        initial: ClientConfig,
    ) -> (Self, mpsc::UnboundedReceiver<TransportConfig>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            current: Mutex::new(initial),
            updates,
        };
        (watcher, rx)
    }

    /// Start watching on notify's background thread.
    ///
    /// Updates stop when the returned watcher is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    self.reload();
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %path.display(), "Config watcher started");
        Ok(watcher)
    }

    /// Re-read the file; forward the transport section if it changed.
    ///
    /// Returns whether an update was sent.
    fn reload(&self) -> bool {
        let loaded = match load_config(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Config reload failed; keeping current settings");
                return false;
            }
        };

        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if loaded.observability != current.observability || loaded.server != current.server {
            tracing::warn!("Only [transport] changes apply without a restart");
        }
        if loaded.transport == current.transport {
            *current = loaded;
            return false;
        }

        tracing::info!(transport = ?loaded.transport, "Transport settings reloaded");
        let sent = self.updates.send(loaded.transport.clone()).is_ok();
        *current = loaded;
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, contents: &str) {
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn forwards_only_transport_changes() {
        let file = tempfile::NamedTempFile::new().unwrap();
        write(file.path(), "[transport]\nmax_total = 100\n");
        let initial = load_config(file.path()).unwrap();
        let (watcher, mut rx) = ConfigWatcher::new(file.path(), initial);

        // Same settings: nothing forwarded.
        assert!(!watcher.reload());

        write(file.path(), "[transport]\nmax_total = 100\n[server]\nbind_address = \"127.0.0.1:9999\"\n");
        assert!(!watcher.reload());

        write(file.path(), "[transport]\nmax_total = 7\n");
        assert!(watcher.reload());
        assert_eq!(rx.try_recv().unwrap().max_total, 7);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn invalid_reload_keeps_current_settings() {
        let file = tempfile::NamedTempFile::new().unwrap();
        write(file.path(), "[transport]\nmax_total = 5\n");
        let initial = load_config(file.path()).unwrap();
        let (watcher, mut rx) = ConfigWatcher::new(file.path(), initial);

        write(file.path(), "[transport]\nmax_total = 0\n");
        assert!(!watcher.reload());
        assert!(rx.try_recv().is_err());

        // Back to a valid, changed file.
        write(file.path(), "[transport]\nmax_total = 6\n");
        assert!(watcher.reload());
        assert_eq!(rx.try_recv().unwrap().max_total, 6);
    }
}
