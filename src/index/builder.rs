use crate::collaborators::doc_store::DocumentStore;
use crate::collaborators::tokenizer::Tokenizer;
use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::stats::IndexStats;
use crate::core::types::DocId;
use crate::index::hash::shard_id;
use crate::index::posting::Posting;
use crate::index::shard::Shard;
use crate::storage::file_lock::FileLock;
use crate::storage::layout::StorageLayout;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Owns the finalized shards and the global stats, handed back by
/// `Builder::build` and consumed by the query evaluator.
pub struct ShardSet {
    pub shards: Vec<Shard>,
    pub stats: IndexStats,
}

impl ShardSet {
    pub fn num_shards(&self) -> u16 {
        self.shards.len() as u16
    }

    pub fn get_postings(&self, term: &str) -> Result<Vec<Posting>> {
        let idx = shard_id(term, self.num_shards());
        self.shards[idx as usize].get_postings(term)
    }

    /// Returns the global index statistics computed at build time. One of
    /// the two entry points the outer service may assume exist alongside
    /// `get_postings`.
    pub fn stats(&self) -> IndexStats {
        self.stats.clone()
    }
}

/// Two-pass builder: pass 1 computes per-document token length and the
/// corpus average; pass 2 re-tokenizes and routes postings to shards.
pub struct Builder<'a> {
    storage: StorageLayout,
    config: Config,
    tokenizer: Box<dyn Tokenizer>,
    doc_store: &'a dyn DocumentStore,
}

impl<'a> Builder<'a> {
    pub fn new(storage: StorageLayout, config: Config, tokenizer: Box<dyn Tokenizer>, doc_store: &'a dyn DocumentStore) -> Self {
        Builder { storage, config, tokenizer, doc_store }
    }

    pub fn build(self) -> Result<ShardSet> {
        // Only one build may run against a given storage root at a time;
        // the lock is held for the lifetime of this call and released on
        // drop regardless of how `build` returns.
        let _lock = FileLock::acquire(&self.storage, true)?;

        let total_docs = self.doc_store.len();
        log::info!("build starting: {} documents, {} shards", total_docs, self.config.num_shards);

        let avg_doc_length = self.pass1_doc_lengths(total_docs)?;
        log::info!("pass 1 complete: avg_doc_length={:.2}", avg_doc_length);

        let shards: Vec<Shard> = (0..self.config.num_shards)
            .map(|i| Shard::new(i, self.config.num_shards, &self.storage, self.config.mem_cap_per_shard))
            .collect();

        self.pass2_emit_postings(total_docs, &shards)?;

        for shard in &shards {
            shard.finalize()?;
        }

        let stats = IndexStats::new(total_docs, avg_doc_length, self.config.num_shards, self.config.k1, self.config.b);
        self.write_stats(&stats)?;
        log::info!("build finished: {} documents indexed", total_docs);

        Ok(ShardSet { shards, stats })
    }

    fn text_for(doc: &crate::core::types::Document) -> String {
        format!("{} {}", doc.title, doc.body)
    }

    fn pass1_doc_lengths(&self, total_docs: u64) -> Result<f64> {
        let mut total_length: u64 = 0;
        let mut offset = 0u64;
        let batch_size = self.config.batch_size as u64;

        while offset < total_docs {
            let batch = self.doc_store.scan(offset, batch_size)?;
            if batch.is_empty() {
                break;
            }
            for doc in &batch {
                let len = self.tokenizer.tokenize(&Self::text_for(doc)).len() as u64;
                total_length += len;
            }
            offset += batch.len() as u64;
        }

        if total_docs == 0 {
            Ok(1.0)
        } else {
            Ok(total_length as f64 / total_docs as f64)
        }
    }

    fn pass2_emit_postings(&self, total_docs: u64, shards: &[Shard]) -> Result<()> {
        let num_shards = shards.len() as u16;
        let batch_size = self.config.batch_size as u64;
        let mut offset = 0u64;
        let processed = AtomicUsize::new(0);

        while offset < total_docs {
            let batch = self.doc_store.scan(offset, batch_size)?;
            if batch.is_empty() {
                break;
            }

            // Tokenization is the expensive, embarrassingly parallel part;
            // results are collected in input order so shard submission
            // below stays strictly ascending by doc_id per term.
            let per_doc: Vec<(DocId, u32, HashMap<String, Vec<u32>>)> = batch
                .par_iter()
                .map(|doc| {
                    let tokens = self.tokenizer.tokenize(&Self::text_for(doc));
                    let doc_length = tokens.len() as u32;
                    let mut positions: HashMap<String, Vec<u32>> = HashMap::new();
                    for (pos, term) in tokens.into_iter().enumerate() {
                        positions.entry(term).or_default().push(pos as u32);
                    }
                    (doc.doc_id, doc_length, positions)
                })
                .collect();

            for (doc_id, doc_length, term_positions) in per_doc {
                for (term, positions) in term_positions {
                    let shard_idx = shard_id(&term, num_shards);
                    let posting = Posting {
                        doc_id,
                        tf: positions.len() as u32,
                        positions,
                        doc_length,
                    };
                    shards[shard_idx as usize].add_posting(&term, posting)?;
                }
            }

            let done = processed.fetch_add(batch.len(), Ordering::Relaxed) + batch.len();
            log::debug!("pass 2 progress: {}/{}", done, total_docs);
            offset += batch.len() as u64;
        }

        Ok(())
    }

    fn write_stats(&self, stats: &IndexStats) -> Result<()> {
        let json = serde_json::to_vec_pretty(stats)?;
        let tmp_path = self.storage.stats_path().with_extension("json.tmp");
        fs::write(&tmp_path, &json)?;
        fs::rename(&tmp_path, self.storage.stats_path())?;
        Ok(())
    }
}
