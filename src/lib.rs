// Core functionality
pub mod core {
    pub mod config;
    pub mod error;
}

// cscope invocation and output handling
pub mod cscope {
    pub mod build;
    pub mod position;
    pub mod process;
    pub mod query;
    pub mod query_type;
    pub mod record;
}

// Jump history and command orchestration
pub mod navigation {
    pub mod command;
    pub mod history;
    pub mod navigator;
}

// Host collaborators
pub mod env;

// User interfaces
pub mod ui {
    pub mod cli;
    pub mod session;
    pub mod terminal;
    pub mod tui;
    pub mod watch;
}

// Re-export commonly used types
pub use crate::core::config::{Config, ConfigStore};
pub use crate::core::error::{Error, Result};
pub use crate::cscope::position::{ResolvedQueryItem, SourceReader, Span};
pub use crate::cscope::query::Cscope;
pub use crate::cscope::query_type::QueryType;
pub use crate::cscope::record::QueryRecord;
pub use crate::env::{Env, Prompt, SelectItem, SelectList, StatusBar};
pub use crate::navigation::command::Command;
pub use crate::navigation::history::{FilePosition, NavigationHistory};
pub use crate::navigation::navigator::Navigator;
pub use crate::ui::cli::Cli;
pub use crate::ui::tui::TuiSelectList;
pub use crate::ui::watch::FileWatcher;
