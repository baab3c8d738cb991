use super::position::{FsSourceReader, PositionResolver, ResolvedQueryItem, SourceReader};
use super::process::{self, Invocation};
use super::query_type::QueryType;
use super::record::QueryRecord;
use crate::core::config::ConfigStore;
use crate::core::error::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Runs cscope queries and builds against the live configuration
#[derive(Clone)]
pub struct Cscope {
    pub(crate) config: ConfigStore,
    reader: Arc<dyn SourceReader>,
}

impl Cscope {
    pub fn new(config: ConfigStore) -> Self {
        Self::with_reader(config, Arc::new(FsSourceReader))
    }

    /// Use a custom source reader for column resolution
    pub fn with_reader(config: ConfigStore, reader: Arc<dyn SourceReader>) -> Self {
        Self { config, reader }
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Invocation for one lookup: `[queryArgs.., -f, db, flag, word]`
    pub fn query_invocation(&self, query_type: QueryType, word: &str, cwd: &Path) -> Invocation {
        let config = self.config.get();
        let mut args = config.query_flags();
        args.push("-f".to_string());
        args.push(config.database.clone());
        args.push(query_type.flag().to_string());
        args.push(word.to_string());
        Invocation::new(config.cscope, args, cwd)
    }

    /// Run a lookup and resolve every result to its exact position.
    ///
    /// Lines that fail to parse or whose file cannot be read are logged and
    /// dropped. The result keeps the order cscope printed the lines in.
    pub async fn query(
        &self,
        query_type: QueryType,
        word: &str,
        cwd: &Path,
    ) -> Result<Vec<ResolvedQueryItem>> {
        let invocation = self.query_invocation(query_type, word, cwd);
        let resolver = PositionResolver::new(self.reader.clone(), cwd, query_type, word);

        let mut stream = process::run_streaming(&invocation)?;
        let mut pending = JoinSet::new();
        let mut slots: Vec<Option<ResolvedQueryItem>> = Vec::new();

        while let Some(line) = stream.next_line().await {
            let record = match QueryRecord::parse(&line) {
                Ok(record) => record,
                Err(e) => {
                    warn!("cannot parse: {}", e);
                    continue;
                }
            };
            let index = slots.len();
            slots.push(None);
            let resolver = resolver.clone();
            pending.spawn(async move { (index, resolver.resolve(record).await) });
        }

        if let Err(e) = stream.finish().await {
            pending.shutdown().await;
            error!(query = %query_type, word, "query failed: {}", e);
            return Err(e);
        }

        while let Some(joined) = pending.join_next().await {
            match joined {
                Ok((index, Ok(item))) => slots[index] = Some(item),
                Ok((_, Err(e))) => warn!("dropping result: {}", e),
                Err(e) => error!("position resolution panicked: {}", e),
            }
        }

        let results: Vec<ResolvedQueryItem> = slots.into_iter().flatten().collect();
        info!(query = %query_type, word, count = results.len(), "query finished");
        debug!(?results, "results");
        Ok(results)
    }
}
