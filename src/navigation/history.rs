use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::warn;

/// A cursor location inside a file, 0-based
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilePosition {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl FilePosition {
    pub fn new(file: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for FilePosition {
    /// `file:line:column`, 1-based like compiler diagnostics
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line + 1, self.column + 1)
    }
}

/// Stack of positions to jump back to
#[derive(Debug, Default)]
pub struct NavigationHistory {
    positions: Vec<FilePosition>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, position: FilePosition) -> FilePosition {
        self.positions.push(position.clone());
        position
    }

    /// Most recent position, or `None` (with a warning) when empty
    pub fn pop(&mut self) -> Option<FilePosition> {
        let position = self.positions.pop();
        if position.is_none() {
            warn!("End of History");
        }
        position
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Oldest first
    pub fn positions(&self) -> &[FilePosition] {
        &self.positions
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }
}
