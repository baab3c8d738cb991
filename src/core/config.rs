use super::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

/// Configuration for cscope-nav
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Path of the cscope executable
    pub cscope: String,
    /// Database file name, relative to the project root
    pub database: String,
    /// Flags passed when building the database
    pub build_args: String,
    /// Flags passed on every query
    pub query_args: String,
    /// Build a missing database on start and rebuild on source changes
    pub auto: bool,
    /// Comma separated extensions whose changes trigger a rebuild
    pub extensions: String,
    /// Preview the highlighted result while choosing
    pub preview: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cscope: "cscope".to_string(),
            database: "cscope.out".to_string(),
            build_args: "-Rb".to_string(),
            query_args: "-dL".to_string(),
            auto: true,
            extensions: "c,cc,cpp,cxx,h,hh,hpp,hxx".to_string(),
            preview: true,
        }
    }
}

impl Config {
    /// Get the default configuration file
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
            .map(|dir| dir.join("cscope-nav").join("config.yaml"))
    }

    /// Load the configuration, falling back to defaults when the file is absent
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Ok(path) => path,
                Err(_) => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        Self::from_yaml(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse a YAML document; an empty document yields the defaults
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Build flags split into separate arguments
    pub fn build_flags(&self) -> Vec<String> {
        split_flags(&self.build_args)
    }

    /// Query flags split into separate arguments
    pub fn query_flags(&self) -> Vec<String> {
        split_flags(&self.query_args)
    }

    /// Normalized list of watched extensions (lower case, no leading dot)
    pub fn extension_list(&self) -> Vec<String> {
        self.extensions
            .split(',')
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }

    /// Location of the database inside a project
    pub fn database_path(&self, root: &Path) -> PathBuf {
        root.join(&self.database)
    }

    /// Update one key by its configuration name
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "cscope" => self.cscope = value.to_string(),
            "database" => self.database = value.to_string(),
            "buildArgs" | "build_args" => self.build_args = value.to_string(),
            "queryArgs" | "query_args" => self.query_args = value.to_string(),
            "auto" => self.auto = parse_bool(key, value)?,
            "extensions" => self.extensions = value.to_string(),
            "preview" => self.preview = parse_bool(key, value)?,
            _ => return Err(Error::Config(format!("Unknown configuration key: {}", key))),
        }
        Ok(())
    }
}

fn split_flags(flags: &str) -> Vec<String> {
    flags.split_whitespace().map(str::to_string).collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        other => Err(Error::Config(format!(
            "Expected a boolean for {}, got {:?}",
            key, other
        ))),
    }
}

/// Shared, observable configuration.
///
/// Cloning the store hands out another reference to the same live values.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    tx: Arc<watch::Sender<Config>>,
}

impl ConfigStore {
    pub fn new(config: Config) -> Self {
        let (tx, _rx) = watch::channel(config);
        Self { tx: Arc::new(tx) }
    }

    /// Snapshot of the current values
    pub fn get(&self) -> Config {
        self.tx.borrow().clone()
    }

    /// Set a key; observers are only notified when the value actually changes
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut next = self.get();
        next.set(key, value)?;
        self.tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        Ok(())
    }

    /// Receiver that observes every change made through this store
    pub fn subscribe(&self) -> watch::Receiver<Config> {
        self.tx.subscribe()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
