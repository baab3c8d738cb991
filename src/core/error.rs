use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// One line of indexer output that does not have the
    /// `file function line text` shape.
    #[error("Malformed record ({reason}): {line}")]
    MalformedRecord { line: String, reason: String },

    #[error("Unknown query type: {0}")]
    UnknownQueryType(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The indexer executable could not be started at all.
    #[error("Failed to run {program}: {message}")]
    ProcessSpawn { program: String, message: String },

    /// The indexer ran and exited unsuccessfully; `stderr` is trimmed.
    #[error("{stderr}")]
    ProcessExit { code: Option<i32>, stderr: String },

    #[error("Could not read {}: {source}", path.display())]
    PositionResolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Watch error: {0}")]
    Watch(String),
}

pub type Result<T> = std::result::Result<T, Error>;
