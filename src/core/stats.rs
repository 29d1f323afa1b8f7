use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Global index statistics, written once by the builder and read-only
/// thereafter. Persisted as `stats.json` alongside the shard files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_docs: u64,
    pub avg_doc_length: f64,
    pub num_shards: u16,
    pub k1: f64,
    pub b: f64,
    pub built_at: DateTime<Utc>,
}

impl IndexStats {
    pub fn new(total_docs: u64, avg_doc_length: f64, num_shards: u16, k1: f64, b: f64) -> Self {
        IndexStats {
            total_docs,
            avg_doc_length,
            num_shards,
            k1,
            b,
            built_at: Utc::now(),
        }
    }
}

/// Per-shard sidecar metadata, persisted as `shard_{i}.meta.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShardMeta {
    pub term_count: u64,
    pub doc_count: u64,
    pub total_tf: u64,
}
