use crate::core::error::{Error, Result};
use crate::env::FileWatch;
use notify_debouncer_full::{
    new_debouncer,
    notify::{RecursiveMode, Watcher},
    DebounceEventResult,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Quiet period before a burst of saves is reported as one change
const DEBOUNCE: Duration = Duration::from_millis(500);

/// Watches a project tree for changes to source files
pub struct FileWatcher {
    root_path: PathBuf,
    extensions: Vec<String>,
}

impl FileWatcher {
    /// Create a new file watcher
    pub fn new(root_path: &Path, extensions: &[String]) -> Self {
        Self {
            root_path: root_path.to_path_buf(),
            extensions: extensions.to_vec(),
        }
    }

    /// Start watching; each debounced batch with at least one matching file
    /// is delivered through the returned subscription.
    pub fn watch(self) -> Result<FileWatch> {
        let (tx, rx) = mpsc::unbounded_channel();
        let extensions = self.extensions.clone();

        let mut debouncer = new_debouncer(DEBOUNCE, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let changed: Vec<PathBuf> = events
                        .iter()
                        .flat_map(|event| event.paths.iter())
                        .filter(|path| matches_extension(path, &extensions))
                        .cloned()
                        .collect();
                    if !changed.is_empty() {
                        debug!(?changed, "source files changed");
                        let _ = tx.send(changed);
                    }
                }
                Err(errors) => {
                    for e in errors {
                        warn!("watch error: {}", e);
                    }
                }
            }
        })
        .map_err(|e| Error::Watch(format!("Failed to create file watcher: {}", e)))?;

        debouncer
            .watcher()
            .watch(&self.root_path, RecursiveMode::Recursive)
            .map_err(|e| {
                Error::Watch(format!(
                    "Failed to watch {}: {}",
                    self.root_path.display(),
                    e
                ))
            })?;

        Ok(FileWatch::new(rx, debouncer))
    }
}

/// Check if a path has one of `extensions` (lower case, no dot)
pub fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            extensions.iter().any(|wanted| *wanted == ext)
        })
        .unwrap_or(false)
}
