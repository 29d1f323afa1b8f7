use crate::core::error::Result;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

/// Durable, ordered append-store backing the Spill Queue's overflow.
///
/// Frames are `[u32 len][bytes]`, appended in insertion order. Draining the
/// oldest `n` frames reads them off the front and rewrites the remainder to
/// a temp file that is renamed over the original, mirroring the
/// write-temp-then-rename publication the shard flush path uses: a crash
/// mid-drain leaves either the pre-drain or post-drain file, never a
/// half-written one.
///
/// Opened fresh (truncated) at process start: the store carries no
/// durability guarantee across restarts by design.
pub struct SpillStore {
    path: PathBuf,
    file: File,
    count: u64,
}

impl SpillStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        log::info!("spill store truncated at startup: {}", path.display());
        Ok(SpillStore { path, file, count: 0 })
    }

    pub fn len(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Appends frames to the tail, fsyncing once for the whole batch.
    pub fn push_batch(&mut self, items: &[Vec<u8>]) -> Result<()> {
        for item in items {
            let len = item.len() as u32;
            self.file.write_all(&len.to_le_bytes())?;
            self.file.write_all(item)?;
        }
        self.file.sync_all()?;
        self.count += items.len() as u64;
        Ok(())
    }

    /// Reads and removes up to `n` frames from the front, preserving order.
    pub fn pop_front_batch(&mut self, n: u64) -> Result<Vec<Vec<u8>>> {
        if self.count == 0 || n == 0 {
            return Ok(Vec::new());
        }

        let mut reader = BufReader::new(File::open(&self.path)?);
        let take = std::cmp::min(n, self.count);
        let mut drained = Vec::with_capacity(take as usize);

        for _ in 0..take {
            let mut len_buf = [0u8; 4];
            reader.read_exact(&mut len_buf)?;
            let len = u32::from_le_bytes(len_buf) as usize;
            let mut data = vec![0u8; len];
            reader.read_exact(&mut data)?;
            drained.push(data);
        }

        let mut remainder = Vec::new();
        reader.read_to_end(&mut remainder)?;

        let tmp_path = self.path.with_extension("store.tmp");
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(&remainder)?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        self.file = OpenOptions::new().write(true).append(true).open(&self.path)?;
        self.count -= take;

        Ok(drained)
    }
}
