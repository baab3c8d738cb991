use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// cscope-nav - Jump through cscope results with a navigation history
#[derive(Parser, Debug)]
#[command(name = "cscope-nav")]
#[command(about = "Query a cscope database and jump through the results", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project root (default: current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Configuration file (default: <config dir>/cscope-nav/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// cscope executable, overrides the configuration
    #[arg(long, global = true)]
    pub cscope: Option<String>,

    /// Database file name, overrides the configuration
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the cscope database
    Build,
    /// Run one lookup and print the results
    Query {
        /// symbol, definition, callee, caller, text, egrep, file, include or set
        query_type: String,
        /// Word to look up
        word: String,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive session with result lists and jump history
    Session {
        /// File the cursor starts in
        #[arg(long)]
        file: Option<PathBuf>,
        /// 1-based line the cursor starts on
        #[arg(long, default_value_t = 1)]
        line: usize,
        /// Word under the cursor
        #[arg(long)]
        word: Option<String>,
    },
    /// List the command ids understood by a session
    Commands,
}
