use super::query_type::QueryType;
use super::record::QueryRecord;
use crate::core::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Source of file contents used to place results on a column
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Content of the 0-based `line` of `path`, `None` when the file is shorter
    async fn read_line(&self, path: &Path, line: usize) -> std::io::Result<Option<String>>;
}

/// Reads straight from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSourceReader;

#[async_trait]
impl SourceReader for FsSourceReader {
    async fn read_line(&self, path: &Path, line: usize) -> std::io::Result<Option<String>> {
        let bytes = tokio::fs::read(path).await?;
        let content = String::from_utf8_lossy(&bytes);
        Ok(content
            .lines()
            .nth(line)
            .map(|text| text.trim_end_matches('\r').to_string()))
    }
}

/// Highlight range inside a file, 0-based, columns counted in characters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end_column.saturating_sub(self.start_column)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A record placed on the exact line and column of its match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedQueryItem {
    #[serde(flatten)]
    pub record: QueryRecord,
    pub span: Span,
    /// Content of the referenced source line
    pub line_text: String,
}

impl ResolvedQueryItem {
    pub fn column(&self) -> usize {
        self.span.start_column
    }
}

/// Places records on a column by looking up the searched token in the file
#[derive(Clone)]
pub struct PositionResolver {
    reader: Arc<dyn SourceReader>,
    cwd: PathBuf,
    query_type: QueryType,
    word: String,
}

impl PositionResolver {
    pub fn new(reader: Arc<dyn SourceReader>, cwd: &Path, query_type: QueryType, word: &str) -> Self {
        Self {
            reader,
            cwd: cwd.to_path_buf(),
            query_type,
            word: word.to_string(),
        }
    }

    /// Token looked up in the source line; callee results point at the
    /// called function rather than the searched one.
    pub fn token_for<'a>(&'a self, record: &'a QueryRecord) -> &'a str {
        match self.query_type {
            QueryType::Callee => &record.symbol,
            _ => &self.word,
        }
    }

    pub fn full_path(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    pub async fn resolve(&self, record: QueryRecord) -> Result<ResolvedQueryItem> {
        let path = self.full_path(&record.source_file);
        let line_text = self
            .reader
            .read_line(&path, record.line_number)
            .await
            .map_err(|source| Error::PositionResolution { path, source })?
            .unwrap_or_default();

        let span = locate(&line_text, self.token_for(&record), record.line_number);
        Ok(ResolvedQueryItem {
            record,
            span,
            line_text,
        })
    }
}

/// Span of the first occurrence of `token` in `text`, or an empty span at
/// column 0 when it does not occur.
pub fn locate(text: &str, token: &str, line: usize) -> Span {
    let (column, length) = match text.find(token) {
        Some(offset) if !token.is_empty() => (text[..offset].chars().count(), token.chars().count()),
        _ => (0, 0),
    };
    Span {
        start_line: line,
        start_column: column,
        end_line: line,
        end_column: column + length,
    }
}
