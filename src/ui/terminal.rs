use super::watch::FileWatcher;
use crate::core::error::{Error, Result};
use crate::env::{Env, FileWatch, Prompt, StatusBar};
use crate::navigation::history::FilePosition;
use async_trait::async_trait;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Cursor {
    word: String,
    position: Option<FilePosition>,
}

/// Editor stand-in for a terminal session.
///
/// The cursor is session state: set explicitly, and moved by every jump.
/// Jumps are printed as `file:line:column` on stdout.
pub struct TerminalEnv {
    root: PathBuf,
    cursor: Mutex<Cursor>,
}

impl TerminalEnv {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            cursor: Mutex::new(Cursor::default()),
        }
    }

    fn cursor(&self) -> MutexGuard<'_, Cursor> {
        self.cursor.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_word(&self, word: &str) {
        self.cursor().word = word.to_string();
    }

    pub fn set_position(&self, position: FilePosition) {
        self.cursor().position = Some(position);
    }
}

#[async_trait]
impl Env for TerminalEnv {
    fn current_directory(&self) -> PathBuf {
        self.root.clone()
    }

    fn current_word(&self) -> String {
        self.cursor().word.clone()
    }

    fn current_position(&self) -> Option<FilePosition> {
        self.cursor().position.clone()
    }

    async fn open(&self, position: &FilePosition, preview: bool) -> Result<()> {
        // The result list draws its own preview.
        if preview {
            return Ok(());
        }
        let mut stdout = io::stdout();
        writeln!(stdout, "{}", position)?;
        stdout.flush()?;
        self.set_position(position.clone());
        Ok(())
    }

    async fn input(&self, initial: &str) -> Result<Prompt<String>> {
        let initial = initial.to_string();
        tokio::task::spawn_blocking(move || read_word(&initial))
            .await
            .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::Other, e.to_string())))?
    }

    fn observe_files(&self, root: &Path, extensions: &[String]) -> Result<FileWatch> {
        FileWatcher::new(root, extensions).watch()
    }
}

/// Prompt on stderr and read one line; EOF cancels, an empty line keeps `initial`
fn read_word(initial: &str) -> Result<Prompt<String>> {
    let mut stderr = io::stderr();
    write!(stderr, "word [{}]: ", initial)?;
    stderr.flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(Prompt::Cancelled);
    }
    let word = line.trim();
    Ok(Prompt::Value(if word.is_empty() {
        initial.to_string()
    } else {
        word.to_string()
    }))
}

/// Status messages on stderr; on a terminal the line is cleared when hidden
#[derive(Debug, Default)]
pub struct TerminalStatus;

impl TerminalStatus {
    pub fn new() -> Self {
        Self
    }
}

impl StatusBar for TerminalStatus {
    fn show(&self, message: &str) {
        let mut stderr = io::stderr();
        if stderr.is_terminal() {
            let _ = write!(stderr, "\r\x1b[2K{}", message);
        } else {
            let _ = writeln!(stderr, "{}", message);
        }
        let _ = stderr.flush();
    }

    fn hide(&self) {
        let mut stderr = io::stderr();
        if stderr.is_terminal() {
            let _ = write!(stderr, "\r\x1b[2K");
            let _ = stderr.flush();
        }
    }
}
