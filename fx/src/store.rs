//! Pluggable storage backends for rate tables.
//!
//! The cache's freshness contract is independent of the medium: the
//! in-memory store lives for the process, the JSON-file store also covers
//! restarts. Keys are `fx_<BASE>`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use freightquote_common::Currency;
use tracing::warn;

use crate::error::{FxError, FxResult};
use crate::table::RateTable;

/// Storage seam for rate tables.
///
/// `save` replaces any previous table for the same base wholesale.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Load the stored table for a base currency, if any.
    async fn load(&self, base: &Currency) -> FxResult<Option<RateTable>>;

    /// Store a table, replacing the previous one for its base.
    async fn save(&self, table: &RateTable) -> FxResult<()>;
}

/// In-memory rate store.
#[derive(Default)]
pub struct MemoryRateStore {
    tables: DashMap<String, RateTable>,
}

impl MemoryRateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn load(&self, base: &Currency) -> FxResult<Option<RateTable>> {
        Ok(self
            .tables
            .get(&RateTable::storage_key_for(base))
            .map(|t| t.clone()))
    }

    async fn save(&self, table: &RateTable) -> FxResult<()> {
        self.tables.insert(table.storage_key(), table.clone());
        Ok(())
    }
}

/// On-disk rate store: one JSON file per base currency.
pub struct JsonFileRateStore {
    dir: PathBuf,
}

impl JsonFileRateStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> FxResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| FxError::Store(e.to_string()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, base: &Currency) -> PathBuf {
        self.dir
            .join(format!("{}.json", RateTable::storage_key_for(base)))
    }
}

#[async_trait]
impl RateStore for JsonFileRateStore {
    async fn load(&self, base: &Currency) -> FxResult<Option<RateTable>> {
        let path = self.path_for(base);
        if !path.exists() {
            return Ok(None);
        }

        // An unreadable cache file is treated as a miss, not a failure.
        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(table) => Ok(Some(table)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding unreadable rate table");
                    Ok(None)
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read rate table");
                Ok(None)
            }
        }
    }

    async fn save(&self, table: &RateTable) -> FxResult<()> {
        let path = self.path_for(&table.base);
        let content =
            serde_json::to_string_pretty(table).map_err(|e| FxError::Store(e.to_string()))?;
        write_atomic(&path, &content).map_err(|e| FxError::Store(e.to_string()))
    }
}

/// Write via a temp file + rename so readers never see a partial table.
fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)
}
