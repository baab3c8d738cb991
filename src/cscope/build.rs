use super::process::{self, Invocation};
use super::query::Cscope;
use crate::core::error::Result;
use std::path::Path;
use tracing::{error, info};

impl Cscope {
    /// Invocation for a database build: `[buildArgs.., -f, db]`
    pub fn build_invocation(&self, cwd: &Path) -> Invocation {
        let config = self.config.get();
        let mut args = config.build_flags();
        args.push("-f".to_string());
        args.push(config.database.clone());
        Invocation::new(config.cscope, args, cwd)
    }

    /// Build (or rebuild) the database for the project at `cwd`.
    ///
    /// Concurrent calls are not merged; each one runs its own process.
    pub async fn build(&self, cwd: &Path) -> Result<()> {
        match process::run(&self.build_invocation(cwd)).await {
            Ok(output) => {
                info!(cwd = %cwd.display(), "build finished: {}", output.stdout);
                Ok(())
            }
            Err(e) => {
                error!(cwd = %cwd.display(), "build failed: {}", e);
                Err(e)
            }
        }
    }

    /// Whether the database file exists under `cwd`
    pub fn database_exists(&self, cwd: &Path) -> bool {
        self.config.get().database_path(cwd).exists()
    }
}
