use super::terminal::TerminalEnv;
use crate::core::config::ConfigStore;
use crate::core::error::{Error, Result};
use crate::env::Env;
use crate::navigation::command::Command;
use crate::navigation::history::FilePosition;
use crate::navigation::navigator::Navigator;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::error;

const HELP: &str = "\
commands:
  <command-id> [word]      run a command (see `cscope-nav commands`)
  at <file>:<line>[:<col>] move the cursor (1-based)
  word <word>              set the word under the cursor
  set <key> <value>        change a configuration value
  history                  list the jump history
  help                     show this text
  quit                     end the session";

/// One line typed into a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    Command(Command, Option<String>),
    At(FilePosition),
    Word(String),
    Set(String, String),
    History,
    Help,
    Quit,
    Empty,
}

impl SessionInput {
    pub fn parse(line: &str, root: &Path) -> Result<Self> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        Ok(match head {
            "" => SessionInput::Empty,
            "quit" | "exit" => SessionInput::Quit,
            "help" | "?" => SessionInput::Help,
            "history" => SessionInput::History,
            "word" => SessionInput::Word(rest.to_string()),
            "at" => SessionInput::At(parse_location(rest, root)?),
            "set" => {
                let (key, value) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| Error::Config("usage: set <key> <value>".to_string()))?;
                SessionInput::Set(key.to_string(), value.trim().to_string())
            }
            id => {
                let command = id.parse::<Command>()?;
                let word = (!rest.is_empty()).then(|| rest.to_string());
                SessionInput::Command(command, word)
            }
        })
    }
}

/// `file:line[:col]`, 1-based, relative paths taken from `root`
pub fn parse_location(location: &str, root: &Path) -> Result<FilePosition> {
    let invalid = || Error::Config(format!("expected <file>:<line>[:<col>], got {:?}", location));
    let number = |s: &str| s.parse::<usize>().ok().filter(|n| *n > 0).map(|n| n - 1);

    let mut parts = location.rsplitn(3, ':');
    let last = parts.next().ok_or_else(invalid)?;
    let middle = parts.next().ok_or_else(invalid)?;
    let (file, line, column) = match (parts.next(), number(middle)) {
        (Some(file), Some(line)) => (file, line, number(last).ok_or_else(invalid)?),
        _ => {
            let file = location.rsplit_once(':').map(|(file, _)| file).ok_or_else(invalid)?;
            (file, number(last).ok_or_else(invalid)?, 0)
        }
    };
    if file.is_empty() {
        return Err(invalid());
    }

    let path = Path::new(file);
    let file = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    Ok(FilePosition::new(file, line, column))
}

/// Interactive loop over stdin driving a navigator
pub struct Session {
    navigator: Navigator,
    env: Arc<TerminalEnv>,
    config: ConfigStore,
}

impl Session {
    pub fn new(navigator: Navigator, env: Arc<TerminalEnv>, config: ConfigStore) -> Self {
        Self {
            navigator,
            env,
            config,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        if let Err(e) = self.navigator.activate().await {
            error!("auto build unavailable: {}", e);
        }
        eprintln!("cscope-nav session, type `help` for commands");

        while let Some(line) = read_line().await? {
            let root = self.env.current_directory();
            let input = match SessionInput::parse(&line, &root) {
                Ok(input) => input,
                Err(e) => {
                    eprintln!("{}", e);
                    continue;
                }
            };
            if input == SessionInput::Quit {
                break;
            }
            if let Err(e) = self.handle(input).await {
                eprintln!("{}", e);
            }
            if let Err(e) = self.navigator.apply_config_changes() {
                error!("failed to apply configuration: {}", e);
            }
        }

        self.navigator.deactivate();
        Ok(())
    }

    async fn handle(&mut self, input: SessionInput) -> Result<()> {
        match input {
            SessionInput::Command(command, word) => {
                self.navigator.execute(command, word.as_deref()).await?;
            }
            SessionInput::At(position) => self.env.set_position(position),
            SessionInput::Word(word) => self.env.set_word(&word),
            SessionInput::Set(key, value) => self.config.set(&key, &value)?,
            SessionInput::History => {
                let history = self.navigator.history();
                if history.is_empty() {
                    eprintln!("history is empty");
                }
                for (depth, position) in history.positions().iter().rev().enumerate() {
                    eprintln!("{:>3}  {}", depth, position);
                }
            }
            SessionInput::Help => eprintln!("{}", HELP),
            SessionInput::Quit | SessionInput::Empty => {}
        }
        Ok(())
    }
}

/// Prompt and read one line from stdin, `None` at EOF
async fn read_line() -> Result<Option<String>> {
    tokio::task::spawn_blocking(|| -> Result<Option<String>> {
        let mut stderr = io::stderr();
        write!(stderr, "> ")?;
        stderr.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    })
    .await
    .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::Other, e.to_string())))?
}
