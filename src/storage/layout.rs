use crate::core::error::Result;
use std::fs;
use std::path::PathBuf;

/// Flat on-disk layout, all artifacts as siblings under a single root:
/// `shard_{i}.data`, `shard_{i}.meta.json`, `stats.json`, `spill.store`,
/// `documents.store`.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub base_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(StorageLayout { base_dir })
    }

    pub fn shard_data_path(&self, shard_id: u16) -> PathBuf {
        self.base_dir.join(format!("shard_{}.data", shard_id))
    }

    pub fn shard_meta_path(&self, shard_id: u16) -> PathBuf {
        self.base_dir.join(format!("shard_{}.meta.json", shard_id))
    }

    pub fn stats_path(&self) -> PathBuf {
        self.base_dir.join("stats.json")
    }

    pub fn documents_path(&self) -> PathBuf {
        self.base_dir.join("documents.store")
    }

    pub fn spill_store_path(&self) -> PathBuf {
        self.base_dir.join("spill.store")
    }
}
