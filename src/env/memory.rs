//! In-memory collaborators for driving the navigator without a terminal.

use super::{Env, FileWatch, Prompt, SelectItem, SelectList, SelectRequest, StatusBar};
use crate::core::error::Result;
use crate::navigation::history::FilePosition;
use crate::ui::watch::matches_extension;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::mpsc;

struct Subscriber {
    extensions: Vec<String>,
    alive: Weak<()>,
    tx: mpsc::UnboundedSender<Vec<PathBuf>>,
}

#[derive(Default)]
struct EnvState {
    word: String,
    position: Option<FilePosition>,
    inputs: VecDeque<Prompt<String>>,
    opened: Vec<(FilePosition, bool)>,
    watchers: Vec<Subscriber>,
}

/// Scripted editor: cursor state is set by the test, prompts answer from a queue
pub struct MemoryEnv {
    cwd: PathBuf,
    state: Mutex<EnvState>,
    live_watches: Arc<()>,
}

impl MemoryEnv {
    pub fn new(cwd: &Path) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            state: Mutex::new(EnvState::default()),
            live_watches: Arc::new(()),
        }
    }

    fn state(&self) -> MutexGuard<'_, EnvState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_word(&self, word: &str) {
        self.state().word = word.to_string();
    }

    pub fn set_position(&self, position: Option<FilePosition>) {
        self.state().position = position;
    }

    /// Queue the answer for the next input prompt
    pub fn push_input(&self, answer: Prompt<String>) {
        self.state().inputs.push_back(answer);
    }

    /// Every `open` call so far with its preview flag
    pub fn opened(&self) -> Vec<(FilePosition, bool)> {
        self.state().opened.clone()
    }

    /// Deliver a change of `path` to matching subscribers; returns how many got it
    pub fn emit_file_change(&self, path: &Path) -> usize {
        let mut state = self.state();
        state.watchers.retain(|s| s.alive.strong_count() > 0 && !s.tx.is_closed());
        let mut delivered = 0;
        for s in &state.watchers {
            if matches_extension(path, &s.extensions) && s.tx.send(vec![path.to_path_buf()]).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Subscriptions handed out and not yet dropped
    pub fn active_watch_count(&self) -> usize {
        Arc::strong_count(&self.live_watches) - 1
    }
}

#[async_trait]
impl Env for MemoryEnv {
    fn current_directory(&self) -> PathBuf {
        self.cwd.clone()
    }

    fn current_word(&self) -> String {
        self.state().word.clone()
    }

    fn current_position(&self) -> Option<FilePosition> {
        self.state().position.clone()
    }

    async fn open(&self, position: &FilePosition, preview: bool) -> Result<()> {
        let mut state = self.state();
        state.opened.push((position.clone(), preview));
        if !preview {
            state.position = Some(position.clone());
        }
        Ok(())
    }

    async fn input(&self, _initial: &str) -> Result<Prompt<String>> {
        Ok(self.state().inputs.pop_front().unwrap_or(Prompt::Cancelled))
    }

    fn observe_files(&self, _root: &Path, extensions: &[String]) -> Result<FileWatch> {
        let (tx, rx) = mpsc::unbounded_channel();
        let alive = Arc::new(());
        self.state().watchers.push(Subscriber {
            extensions: extensions.to_vec(),
            alive: Arc::downgrade(&alive),
            tx,
        });
        // The subscription ends when the guard is dropped, even if the
        // receiver outlives it.
        Ok(FileWatch::new(rx, (alive, self.live_watches.clone())))
    }
}

/// Records every status message
#[derive(Default)]
pub struct MemoryStatusBar {
    messages: Mutex<Vec<String>>,
    visible: Mutex<Option<String>>,
}

impl MemoryStatusBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Message currently shown, if any
    pub fn visible(&self) -> Option<String> {
        self.visible.lock().ok().and_then(|v| v.clone())
    }
}

impl StatusBar for MemoryStatusBar {
    fn show(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
        if let Ok(mut visible) = self.visible.lock() {
            *visible = Some(message.to_string());
        }
    }

    fn hide(&self) {
        if let Ok(mut visible) = self.visible.lock() {
            *visible = None;
        }
    }
}

/// What the scripted list does with the next request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAnswer {
    /// Confirm the item at this index
    Confirm(usize),
    Cancel,
}

/// Result list answering from a queue; cancels when the queue is empty
#[derive(Default)]
pub struct ScriptedSelectList {
    answers: Mutex<VecDeque<SelectAnswer>>,
    requests: Mutex<Vec<SelectRequest>>,
}

impl ScriptedSelectList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_answer(&self, answer: SelectAnswer) {
        if let Ok(mut answers) = self.answers.lock() {
            answers.push_back(answer);
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<SelectRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SelectList for ScriptedSelectList {
    async fn select(&self, request: SelectRequest) -> Result<Prompt<SelectItem>> {
        let answer = self
            .answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .unwrap_or(SelectAnswer::Cancel);

        let chosen = match answer {
            SelectAnswer::Confirm(index) => request.items.get(index).cloned(),
            SelectAnswer::Cancel => None,
        };

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        Ok(match chosen {
            Some(item) => Prompt::Value(item),
            None => Prompt::Cancelled,
        })
    }
}
