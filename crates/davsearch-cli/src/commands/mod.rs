//! Command implementations.

pub mod config;
pub mod containers;
pub mod search;

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use davsearch_backend::{FsStore, FsStoreConfig};
use davsearch_engine::{EngineConfig, SearchEngine};

use crate::error::CliResult;

/// Engine over a calendar tree on disk.
pub type FsEngine = SearchEngine<Arc<FsStore>, Arc<FsStore>>;

/// Opens the calendar tree at `root` and builds an engine over it.
pub async fn open_engine(root: &Path, config: EngineConfig) -> CliResult<FsEngine> {
    let store = Arc::new(FsStore::open(FsStoreConfig::new(root)).await?);
    info!(root = %root.display(), "Opened calendar tree");
    Ok(SearchEngine::new(store.clone(), store, config))
}
