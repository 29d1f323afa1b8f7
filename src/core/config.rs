use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory for all on-disk artifacts (shards, stats, spill store,
    /// document store).
    pub storage_path: PathBuf,

    /// Number of shards the term space is partitioned into. Build-time only:
    /// changing this invalidates any shards already on disk.
    pub num_shards: u16,

    /// Postings held in a shard's memory buffer before it flushes to disk.
    pub mem_cap_per_shard: u32,

    /// Documents processed per pass-1/pass-2 batch.
    pub batch_size: u32,

    /// BM25 term-frequency saturation parameter.
    pub k1: f64,
    /// BM25 length-normalization strength.
    pub b: f64,

    /// Default number of results returned when a caller doesn't specify K.
    pub default_top_k: u32,

    pub stopwords_enabled: bool,
    pub min_term_length: u8,
    pub max_term_length: u8,

    /// Memory cap (item count) for the crawl frontier's Spill Queue.
    pub queue_memory_cap: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_path: PathBuf::from("./data"),
            num_shards: 16,
            mem_cap_per_shard: 10_000,
            batch_size: 1_000,
            k1: 1.2,
            b: 0.75,
            default_top_k: 10,
            stopwords_enabled: true,
            min_term_length: 2,
            max_term_length: 64,
            queue_memory_cap: 10_000,
        }
    }
}
