use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::ShardMeta;
use crate::index::posting::{Posting, PostingList};
use crate::storage::layout::StorageLayout;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

/// `shard_{i}.data` magic bytes, identifying the file format before any
/// bincode deserialization is attempted.
const SHARD_MAGIC: &[u8; 4] = b"FSSH";
const SHARD_FORMAT_VERSION: u32 = 1;

/// Fixed 12-byte header written before the bincode-serialized term map:
/// magic, format version, `num_shards`, `shard_id`. Lets a shard file be
/// identified and validated in isolation, e.g. after a `num_shards` config
/// change invalidates every existing shard.
#[derive(Debug, Clone, Copy)]
struct ShardHeader {
    num_shards: u16,
    shard_id: u16,
}

impl ShardHeader {
    const LEN: usize = 4 + 4 + 2 + 2;

    fn encode(&self) -> [u8; Self::LEN] {
        let mut buf = [0u8; Self::LEN];
        buf[0..4].copy_from_slice(SHARD_MAGIC);
        buf[4..8].copy_from_slice(&SHARD_FORMAT_VERSION.to_le_bytes());
        buf[8..10].copy_from_slice(&self.num_shards.to_le_bytes());
        buf[10..12].copy_from_slice(&self.shard_id.to_le_bytes());
        buf
    }

    fn decode(bytes: &[u8], expected_shard_id: u16) -> Result<(Self, usize)> {
        if bytes.len() < Self::LEN {
            return Err(Error::new(ErrorKind::InvariantViolation, "shard file truncated before header"));
        }
        if &bytes[0..4] != SHARD_MAGIC {
            return Err(Error::new(ErrorKind::InvariantViolation, "shard file missing magic bytes, not a shard data file"));
        }
        let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        if version != SHARD_FORMAT_VERSION {
            return Err(Error::new(ErrorKind::InvariantViolation, format!("shard file format version {} unsupported", version)));
        }
        let num_shards = u16::from_le_bytes(bytes[8..10].try_into().unwrap());
        let shard_id = u16::from_le_bytes(bytes[10..12].try_into().unwrap());
        if shard_id != expected_shard_id {
            return Err(Error::new(
                ErrorKind::InvariantViolation,
                format!("shard file belongs to shard {} but was opened as shard {}", shard_id, expected_shard_id),
            ));
        }
        Ok((ShardHeader { num_shards, shard_id }, Self::LEN))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShardState {
    Empty,
    Buffering,
    Final,
}

struct ShardInner {
    state: ShardState,
    buffer: HashMap<String, Vec<Posting>>,
    buffered_count: u32,
    meta: ShardMeta,
    /// Lazily populated after `finalize`; avoids re-reading the shard file
    /// on every `get_postings` call once it has been loaded once.
    disk_cache: Option<HashMap<String, PostingList>>,
}

/// One shard of the term space: `term -> PostingsList`, owned by its own
/// mutex and file. Goes through `Empty -> Buffering -> ... -> Final`; reads
/// are rejected until `Final`.
pub struct Shard {
    pub shard_id: u16,
    num_shards: u16,
    data_path: PathBuf,
    meta_path: PathBuf,
    mem_cap: u32,
    inner: Mutex<ShardInner>,
}

impl Shard {
    pub fn new(shard_id: u16, num_shards: u16, storage: &StorageLayout, mem_cap: u32) -> Self {
        Shard {
            shard_id,
            num_shards,
            data_path: storage.shard_data_path(shard_id),
            meta_path: storage.shard_meta_path(shard_id),
            mem_cap,
            inner: Mutex::new(ShardInner {
                state: ShardState::Empty,
                buffer: HashMap::new(),
                buffered_count: 0,
                meta: ShardMeta::default(),
                disk_cache: None,
            }),
        }
    }

    /// Buffers a posting for `term`, flushing to disk once the shard's
    /// buffered posting count reaches `mem_cap`.
    pub fn add_posting(&self, term: &str, posting: Posting) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.state == ShardState::Final {
            return Err(Error::new(ErrorKind::InvalidState, "shard is finalized, cannot accept more postings"));
        }
        inner.state = ShardState::Buffering;
        inner.buffer.entry(term.to_string()).or_default().push(posting);
        inner.buffered_count += 1;

        if inner.buffered_count >= self.mem_cap {
            self.flush_locked(&mut inner)?;
        }

        Ok(())
    }

    /// Merges buffered postings into the on-disk map and writes it back
    /// atomically (write-to-temp-then-rename). Because callers append
    /// postings in ascending `doc_id` order, the merged list for a term
    /// stays ascending without a re-sort — asserted in debug builds.
    fn flush_locked(&self, inner: &mut ShardInner) -> Result<()> {
        if inner.buffer.is_empty() {
            return Ok(());
        }

        let mut on_disk = self.read_raw_map()?;

        for (term, mut new_postings) in inner.buffer.drain() {
            let entry = on_disk.entry(term).or_insert_with(Vec::new);

            if let (Some(last), Some(first_new)) = (entry.last(), new_postings.first()) {
                debug_assert!(
                    last.doc_id.value() < first_new.doc_id.value(),
                    "postings must be appended in strictly ascending doc_id order"
                );
            }

            entry.append(&mut new_postings);
        }

        inner.meta.term_count = on_disk.len() as u64;
        inner.meta.total_tf = on_disk.values().flatten().map(|p| p.tf as u64).sum();
        let mut doc_ids: std::collections::HashSet<u64> = std::collections::HashSet::new();
        for postings in on_disk.values() {
            for p in postings {
                doc_ids.insert(p.doc_id.value());
            }
        }
        inner.meta.doc_count = doc_ids.len() as u64;

        self.write_raw_map(&on_disk)?;
        self.write_meta(&inner.meta)?;

        inner.buffered_count = 0;
        inner.disk_cache = None;
        log::info!(
            "shard {} flushed: {} terms, {} docs, {} total_tf",
            self.shard_id, inner.meta.term_count, inner.meta.doc_count, inner.meta.total_tf
        );

        Ok(())
    }

    pub fn finalize(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        self.flush_locked(&mut inner)?;
        inner.state = ShardState::Final;
        Ok(())
    }

    /// Returns the postings for `term`, or an empty list if the shard
    /// holds no postings for it. Requires the shard to be finalized.
    pub fn get_postings(&self, term: &str) -> Result<Vec<Posting>> {
        let mut inner = self.inner.lock();
        if inner.state != ShardState::Final {
            return Err(Error::new(ErrorKind::InvalidState, "shard is not finalized, cannot be read"));
        }

        if inner.disk_cache.is_none() {
            inner.disk_cache = Some(self.read_encoded_map()?);
        }

        match inner.disk_cache.as_ref().unwrap().get(term) {
            Some(list) => list.iter(),
            None => Ok(Vec::new()),
        }
    }

    pub fn meta(&self) -> ShardMeta {
        self.inner.lock().meta.clone()
    }

    fn read_raw_map(&self) -> Result<HashMap<String, Vec<Posting>>> {
        let encoded = self.read_encoded_map()?;
        let mut raw = HashMap::with_capacity(encoded.len());
        for (term, list) in encoded {
            raw.insert(term, list.iter()?);
        }
        Ok(raw)
    }

    fn read_encoded_map(&self) -> Result<HashMap<String, PostingList>> {
        if !self.data_path.exists() {
            return Ok(HashMap::new());
        }
        let bytes = fs::read(&self.data_path)?;
        if bytes.is_empty() {
            return Ok(HashMap::new());
        }
        let (header, offset) = ShardHeader::decode(&bytes, self.shard_id)?;
        if header.num_shards != self.num_shards {
            return Err(Error::new(
                ErrorKind::InvariantViolation,
                format!(
                    "shard file was written for num_shards={} but is being opened with num_shards={}",
                    header.num_shards, self.num_shards
                ),
            ));
        }
        Ok(bincode::deserialize(&bytes[offset..])?)
    }

    fn write_raw_map(&self, map: &HashMap<String, Vec<Posting>>) -> Result<()> {
        let mut encoded = HashMap::with_capacity(map.len());
        for (term, postings) in map {
            encoded.insert(term.clone(), PostingList::new(postings.clone())?);
        }

        let header = ShardHeader { num_shards: self.num_shards, shard_id: self.shard_id };
        let body = bincode::serialize(&encoded)?;

        let tmp_path = self.data_path.with_extension("data.tmp");
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(&header.encode())?;
            tmp.write_all(&body)?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.data_path)?;
        Ok(())
    }

    fn write_meta(&self, meta: &ShardMeta) -> Result<()> {
        let json = serde_json::to_vec_pretty(meta)?;
        let tmp_path = self.meta_path.with_extension("meta.json.tmp");
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(&json)?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.meta_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DocId;
    use tempfile::tempdir;

    fn posting(doc_id: u64) -> Posting {
        Posting { doc_id: DocId(doc_id), tf: 1, positions: vec![0], doc_length: 5 }
    }

    #[test]
    fn flushes_in_ascending_order_across_multiple_flushes() {
        let dir = tempdir().unwrap();
        let storage = StorageLayout::new(dir.path().to_path_buf()).unwrap();
        let shard = Shard::new(0, 1, &storage, 3);

        for doc_id in 1..=10u64 {
            shard.add_posting("x", posting(doc_id)).unwrap();
        }
        shard.finalize().unwrap();

        let postings = shard.get_postings("x").unwrap();
        assert_eq!(postings.len(), 10);
        for (i, p) in postings.iter().enumerate() {
            assert_eq!(p.doc_id, DocId(i as u64 + 1));
        }
    }

    #[test]
    fn rejects_reads_before_finalize() {
        let dir = tempdir().unwrap();
        let storage = StorageLayout::new(dir.path().to_path_buf()).unwrap();
        let shard = Shard::new(0, 1, &storage, 100);
        shard.add_posting("x", posting(1)).unwrap();

        let err = shard.get_postings("x").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidState));
    }

    #[test]
    fn unknown_term_returns_empty() {
        let dir = tempdir().unwrap();
        let storage = StorageLayout::new(dir.path().to_path_buf()).unwrap();
        let shard = Shard::new(0, 1, &storage, 100);
        shard.add_posting("x", posting(1)).unwrap();
        shard.finalize().unwrap();

        assert!(shard.get_postings("y").unwrap().is_empty());
    }

    #[test]
    fn rejects_shard_file_written_for_a_different_num_shards() {
        let dir = tempdir().unwrap();
        let storage = StorageLayout::new(dir.path().to_path_buf()).unwrap();

        let shard = Shard::new(0, 4, &storage, 100);
        shard.add_posting("x", posting(1)).unwrap();
        shard.finalize().unwrap();

        // Reopen the same on-disk file as if the config's num_shards changed.
        let reopened = Shard::new(0, 8, &storage, 100);
        let err = reopened.finalize().and_then(|_| reopened.get_postings("x")).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvariantViolation));
    }

    #[test]
    fn rejects_file_with_no_magic_bytes() {
        let dir = tempdir().unwrap();
        let storage = StorageLayout::new(dir.path().to_path_buf()).unwrap();
        fs::write(storage.shard_data_path(0), b"not a shard file").unwrap();

        let shard = Shard::new(0, 1, &storage, 100);
        let err = shard.finalize().and_then(|_| shard.get_postings("x")).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvariantViolation));
    }
}
