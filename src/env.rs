//! Capabilities the navigator needs from its host.
//!
//! Each trait has a terminal implementation in `ui` and an in-memory double
//! in [`memory`].

pub mod memory;

use crate::core::error::Result;
use crate::cscope::position::ResolvedQueryItem;
use crate::navigation::history::FilePosition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Outcome of an interactive request: a value, or the user backed out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt<T> {
    Value(T),
    Cancelled,
}

/// Live subscription to file changes.
///
/// Dropping it stops the underlying watcher.
pub struct FileWatch {
    events: mpsc::UnboundedReceiver<Vec<PathBuf>>,
    _guard: Box<dyn Send>,
}

impl FileWatch {
    pub fn new(events: mpsc::UnboundedReceiver<Vec<PathBuf>>, guard: impl Send + 'static) -> Self {
        Self {
            events,
            _guard: Box::new(guard),
        }
    }

    /// Next batch of changed paths, `None` once the watcher is gone
    pub async fn changed(&mut self) -> Option<Vec<PathBuf>> {
        self.events.recv().await
    }

    /// Separate the event stream from the handle that keeps the watcher alive
    pub fn into_parts(self) -> (mpsc::UnboundedReceiver<Vec<PathBuf>>, Box<dyn Send>) {
        (self.events, self._guard)
    }
}

/// The editor surroundings: cursor, files, prompts
#[async_trait]
pub trait Env: Send + Sync {
    /// Project root that queries and builds run in
    fn current_directory(&self) -> PathBuf;

    fn current_word(&self) -> String;

    fn current_position(&self) -> Option<FilePosition>;

    /// Show `position`; a preview must not take focus
    async fn open(&self, position: &FilePosition, preview: bool) -> Result<()>;

    /// Ask for a word, pre-filled with `initial`
    async fn input(&self, initial: &str) -> Result<Prompt<String>>;

    /// Subscribe to changes below `root` of files with one of `extensions`
    fn observe_files(&self, root: &Path, extensions: &[String]) -> Result<FileWatch>;
}

/// Transient status line
pub trait StatusBar: Send + Sync {
    fn show(&self, message: &str);
    fn hide(&self);
}

/// One row of the result list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectItem {
    /// File as reported by cscope
    pub file: String,
    pub line: usize,
    pub column: usize,
    /// Enclosing function
    pub label: String,
    /// Matched text
    pub detail: String,
}

impl SelectItem {
    pub fn position(&self, cwd: &Path) -> FilePosition {
        let path = Path::new(&self.file);
        let file = if path.is_absolute() {
            path.to_path_buf()
        } else {
            cwd.join(path)
        };
        FilePosition::new(file, self.line, self.column)
    }

    /// Text matched against the list filter
    pub fn filter_key(&self) -> String {
        format!("{} {} {}", self.file, self.label, self.detail)
    }
}

impl From<&ResolvedQueryItem> for SelectItem {
    fn from(item: &ResolvedQueryItem) -> Self {
        Self {
            file: item.record.source_file.clone(),
            line: item.record.line_number,
            column: item.column(),
            label: item.record.symbol.clone(),
            detail: item.record.matched_text.clone(),
        }
    }
}

/// Everything a list needs to show one set of results
#[derive(Debug, Clone)]
pub struct SelectRequest {
    pub items: Vec<SelectItem>,
    pub word: String,
    pub cwd: PathBuf,
    /// Preview the highlighted item while the list is open
    pub preview: bool,
}

/// Result list the user picks a location from
#[async_trait]
pub trait SelectList: Send + Sync {
    async fn select(&self, request: SelectRequest) -> Result<Prompt<SelectItem>>;
}
