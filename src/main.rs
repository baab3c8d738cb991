use anyhow::Context;
use clap::Parser;
use cscope_nav::ui::cli::Commands;
use cscope_nav::ui::session::Session;
use cscope_nav::ui::terminal::{TerminalEnv, TerminalStatus};
use cscope_nav::{Cli, Command, Config, ConfigStore, Cscope, FilePosition, Navigator, QueryType};
use cscope_nav::TuiSelectList;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("Could not determine current directory")?,
    };
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Build => handle_build(config, root).await,
        Commands::Query { query_type, word, json } => {
            handle_query(config, root, &query_type, &word, json).await
        }
        Commands::Session { file, line, word } => handle_session(config, root, file, line, word).await,
        Commands::Commands => {
            for id in Command::ids() {
                println!("{}", id);
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "cscope_nav=warn",
        1 => "cscope_nav=info",
        _ => "cscope_nav=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<ConfigStore> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(cscope) = &cli.cscope {
        config.cscope = cscope.clone();
    }
    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    Ok(ConfigStore::new(config))
}

async fn handle_build(config: ConfigStore, root: PathBuf) -> anyhow::Result<()> {
    println!("Building cscope database in: {}", root.display());
    let cscope = Cscope::new(config.clone());
    cscope.build(&root).await?;
    println!("✓ {}", config.get().database_path(&root).display());
    Ok(())
}

async fn handle_query(
    config: ConfigStore,
    root: PathBuf,
    query_type: &str,
    word: &str,
    json: bool,
) -> anyhow::Result<()> {
    let query_type: QueryType = query_type.parse()?;
    let cscope = Cscope::new(config);
    let results = cscope.query(query_type, word, &root).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        eprintln!("No results found.");
    }
    for item in &results {
        println!(
            "{}:{}:{}: {} {}",
            item.record.source_file,
            item.record.line_number + 1,
            item.column() + 1,
            item.record.symbol,
            item.record.matched_text
        );
    }
    Ok(())
}

async fn handle_session(
    config: ConfigStore,
    root: PathBuf,
    file: Option<PathBuf>,
    line: usize,
    word: Option<String>,
) -> anyhow::Result<()> {
    let env = Arc::new(TerminalEnv::new(&root));
    if let Some(file) = file {
        let file = if file.is_absolute() { file } else { root.join(file) };
        env.set_position(FilePosition::new(file, line.saturating_sub(1), 0));
    }
    if let Some(word) = word {
        env.set_word(&word);
    }

    let navigator = Navigator::new(
        Cscope::new(config.clone()),
        env.clone(),
        Arc::new(TerminalStatus::new()),
        Arc::new(TuiSelectList::new()),
    );
    Session::new(navigator, env, config).run().await?;
    Ok(())
}
