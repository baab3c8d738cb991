use super::command::Command;
use super::history::{FilePosition, NavigationHistory};
use crate::core::config::Config;
use crate::core::error::Result;
use crate::cscope::query::Cscope;
use crate::cscope::query_type::QueryType;
use crate::env::{Env, Prompt, SelectItem, SelectList, SelectRequest, StatusBar};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const STATUS_PREFIX: &str = "cscope-nav";

/// The last query's results, kept for `show-results`
#[derive(Debug, Clone)]
pub struct PreviousResults {
    pub word: String,
    pub cwd: PathBuf,
    pub items: Vec<SelectItem>,
}

/// Armed rebuild-on-change: dropping it stops the watcher and the build loop
struct AutoBuild {
    _watch: Box<dyn Send>,
    task: JoinHandle<()>,
}

impl Drop for AutoBuild {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Runs user commands: queries through cscope, result selection, jump history.
///
/// Owns the history and the previous-results cache; nothing else touches them.
pub struct Navigator {
    cscope: Cscope,
    env: Arc<dyn Env>,
    status: Arc<dyn StatusBar>,
    select_list: Arc<dyn SelectList>,
    history: NavigationHistory,
    previous: Option<PreviousResults>,
    auto_build: Option<AutoBuild>,
    config_changes: watch::Receiver<Config>,
}

impl Navigator {
    pub fn new(
        cscope: Cscope,
        env: Arc<dyn Env>,
        status: Arc<dyn StatusBar>,
        select_list: Arc<dyn SelectList>,
    ) -> Self {
        let config_changes = cscope.config().subscribe();
        Self {
            cscope,
            env,
            status,
            select_list,
            history: NavigationHistory::new(),
            previous: None,
            auto_build: None,
            config_changes,
        }
    }

    /// Start of a session: build a missing database and arm rebuilds when
    /// `auto` is on.
    pub async fn activate(&mut self) -> Result<()> {
        let config = self.config_changes.borrow_and_update().clone();
        if config.auto {
            let cwd = self.env.current_directory();
            if !self.cscope.database_exists(&cwd) {
                info!(database = %config.database_path(&cwd).display(), "database missing, building");
                self.build().await.ok();
            }
            self.arm_auto_build()?;
        }
        info!("cscope-nav is now active");
        Ok(())
    }

    /// End of a session
    pub fn deactivate(&mut self) {
        self.disarm_auto_build();
        self.history.clear();
        self.previous = None;
        info!("cscope-nav is now inactive");
    }

    /// React to configuration changes made since the last call; only `auto`
    /// is observed.
    pub fn apply_config_changes(&mut self) -> Result<()> {
        if !self.config_changes.has_changed().unwrap_or(false) {
            return Ok(());
        }
        let auto = self.config_changes.borrow_and_update().auto;
        if auto {
            self.arm_auto_build()
        } else {
            self.disarm_auto_build();
            Ok(())
        }
    }

    pub fn is_auto_build_armed(&self) -> bool {
        self.auto_build.is_some()
    }

    fn arm_auto_build(&mut self) -> Result<()> {
        if self.auto_build.is_some() {
            return Ok(());
        }
        let cwd = self.env.current_directory();
        let extensions = self.cscope.config().get().extension_list();
        let (mut events, guard) = self.env.observe_files(&cwd, &extensions)?.into_parts();

        let cscope = self.cscope.clone();
        let status = self.status.clone();
        let task = tokio::spawn(async move {
            while let Some(changed) = events.recv().await {
                debug!(?changed, "rebuilding after change");
                let _ = build_with_status(&cscope, status.as_ref(), &cwd).await;
            }
        });

        self.auto_build = Some(AutoBuild { _watch: guard, task });
        info!(?extensions, "auto build armed");
        Ok(())
    }

    fn disarm_auto_build(&mut self) {
        if self.auto_build.take().is_some() {
            info!("auto build disarmed");
        }
    }

    pub async fn build(&self) -> Result<()> {
        build_with_status(&self.cscope, self.status.as_ref(), &self.env.current_directory()).await
    }

    /// Look up `word` (or the word under the cursor), let the user pick a
    /// result and jump there.
    ///
    /// Returns the position jumped to; `None` when the user cancelled or
    /// nothing was found.
    pub async fn run_query(
        &mut self,
        query_type: QueryType,
        word: Option<&str>,
        require_input: bool,
    ) -> Result<Option<FilePosition>> {
        let cwd = self.env.current_directory();
        let position = self.env.current_position();
        let mut word = word.map(str::to_string).unwrap_or_else(|| self.env.current_word());

        if require_input {
            match self.env.input(&word).await? {
                Prompt::Value(input) => word = input,
                Prompt::Cancelled => {
                    debug!("input cancelled");
                    return Ok(None);
                }
            }
        }

        self.status.show(&format!("{}: querying...", STATUS_PREFIX));
        let results = self.cscope.query(query_type, &word, &cwd).await;
        self.status.hide();
        let results = results?;

        let items: Vec<SelectItem> = results.iter().map(SelectItem::from).collect();
        self.previous = Some(PreviousResults {
            word: word.clone(),
            cwd: cwd.clone(),
            items: items.clone(),
        });

        if items.is_empty() {
            self.status
                .show(&format!("{}: no results for {} {:?}", STATUS_PREFIX, query_type, word));
            return Ok(None);
        }

        self.choose(items, word, cwd, position).await
    }

    /// Reopen the list of the last query
    pub async fn show_results(&mut self) -> Result<Option<FilePosition>> {
        let Some(previous) = self.previous.clone() else {
            debug!("no previous results");
            return Ok(None);
        };
        if previous.items.is_empty() {
            return Ok(None);
        }
        let position = self.env.current_position();
        self.choose(previous.items, previous.word, previous.cwd, position).await
    }

    async fn choose(
        &mut self,
        items: Vec<SelectItem>,
        word: String,
        cwd: PathBuf,
        position: Option<FilePosition>,
    ) -> Result<Option<FilePosition>> {
        let request = SelectRequest {
            items,
            word,
            cwd: cwd.clone(),
            preview: self.cscope.config().get().preview,
        };

        let item = match self.select_list.select(request).await? {
            Prompt::Value(item) => item,
            Prompt::Cancelled => {
                debug!("selection cancelled");
                return Ok(None);
            }
        };

        if let Some(position) = position {
            self.history.push(position);
        }
        let target = item.position(&cwd);
        self.env.open(&target, false).await?;
        Ok(Some(target))
    }

    /// Jump back to the most recent history entry
    pub async fn pop(&mut self) -> Result<Option<FilePosition>> {
        let Some(position) = self.history.pop() else {
            return Ok(None);
        };
        self.env.open(&position, false).await?;
        Ok(Some(position))
    }

    /// Dispatch one command id; `word` overrides the word under the cursor
    pub async fn execute(&mut self, command: Command, word: Option<&str>) -> Result<()> {
        match command {
            Command::Build => self.build().await,
            Command::Query { query_type, input } => {
                self.run_query(query_type, word, input).await.map(|_| ())
            }
            Command::ShowResults => self.show_results().await.map(|_| ()),
            Command::Pop => self.pop().await.map(|_| ()),
        }
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn previous_results(&self) -> Option<&PreviousResults> {
        self.previous.as_ref()
    }
}

async fn build_with_status(cscope: &Cscope, status: &dyn StatusBar, cwd: &Path) -> Result<()> {
    status.show(&format!("{}: building...", STATUS_PREFIX));
    let result = cscope.build(cwd).await;
    status.hide();
    if let Err(e) = &result {
        warn!("build did not complete: {}", e);
    }
    result
}
