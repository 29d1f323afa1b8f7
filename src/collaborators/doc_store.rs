use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocId, Document};
use crate::storage::layout::StorageLayout;
use crc32fast::Hasher;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicU64, Ordering};

/// Storage for the fetched documents the builder reads and the query
/// evaluator hydrates results from.
///
/// Not part of the three core components, but the minimal real collaborator
/// needed to exercise them end to end: a single append-only file of
/// length-prefixed, checksummed `Document` frames, with an in-memory offset
/// index built on open.
pub trait DocumentStore: Send + Sync {
    /// Appends a document, assigning it the next dense `DocId`.
    fn append(&mut self, url: &str, title: &str, body: &str) -> Result<DocId>;

    /// Returns up to `limit` documents starting at the `offset`-th document
    /// (0-indexed), in ascending `doc_id` order.
    fn scan(&self, offset: u64, limit: u64) -> Result<Vec<Document>>;

    /// Looks up a single document by id.
    fn get(&self, doc_id: DocId) -> Result<Option<Document>>;

    /// Total documents stored.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

const MAGIC: &[u8; 4] = b"FSDS";
const FORMAT_VERSION: u32 = 1;

struct FrameLocation {
    offset: u64,
    len: u32,
}

/// File-backed `DocumentStore`. The file begins with a fixed 8-byte header
/// (`magic` + format version) followed by a sequence of frames:
/// `[u32 len][bincode Document][u32 crc32(data)]`.
pub struct SegmentedDocumentStore {
    file: File,
    index: Vec<FrameLocation>,
    next_id: AtomicU64,
}

impl SegmentedDocumentStore {
    /// Opens (creating if absent) the store at the layout's configured path
    /// for appending, rebuilding the offset index from whatever frames are
    /// already present.
    pub fn open(storage: &StorageLayout) -> Result<Self> {
        let path = storage.documents_path();
        let is_new = !path.exists();

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)?;

        if is_new {
            file.write_all(MAGIC)?;
            file.write_all(&FORMAT_VERSION.to_le_bytes())?;
            file.sync_all()?;
        }

        let index = Self::rebuild_index(&mut file)?;
        let next_id = index.len() as u64 + 1;

        file.seek(SeekFrom::End(0))?;

        Ok(SegmentedDocumentStore {
            file,
            index,
            next_id: AtomicU64::new(next_id),
        })
    }

    fn rebuild_index(file: &mut File) -> Result<Vec<FrameLocation>> {
        file.seek(SeekFrom::Start(0))?;
        let mut header = [0u8; 8];
        let read = file.read(&mut header)?;
        if read == 0 {
            return Ok(Vec::new());
        }
        if read < 8 || &header[..4] != MAGIC {
            return Err(Error::new(ErrorKind::InvariantViolation, "document store header corrupt"));
        }

        let mut index = Vec::new();
        let mut cursor = 8u64;
        let mut reader = BufReader::new(&*file);
        loop {
            let mut len_buf = [0u8; 4];
            match reader.read_exact(&mut len_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            let len = u32::from_le_bytes(len_buf);
            let mut data = vec![0u8; len as usize];
            reader.read_exact(&mut data)?;
            let mut crc_buf = [0u8; 4];
            reader.read_exact(&mut crc_buf)?;
            let stored_crc = u32::from_le_bytes(crc_buf);
            let mut hasher = Hasher::new();
            hasher.update(&data);
            if hasher.finalize() != stored_crc {
                return Err(Error::new(ErrorKind::InvariantViolation, "document store frame checksum mismatch"));
            }

            index.push(FrameLocation {
                offset: cursor + 4,
                len,
            });
            cursor += 4 + len as u64 + 4;
        }

        Ok(index)
    }

    fn read_frame(&self, loc: &FrameLocation) -> Result<Document> {
        let mut file = self.file.try_clone()?;
        file.seek(SeekFrom::Start(loc.offset))?;
        let mut data = vec![0u8; loc.len as usize];
        file.read_exact(&mut data)?;
        Ok(bincode::deserialize(&data)?)
    }
}

impl DocumentStore for SegmentedDocumentStore {
    fn append(&mut self, url: &str, title: &str, body: &str) -> Result<DocId> {
        let doc_id = DocId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let doc = Document::new(doc_id, url, title, body);

        let data = bincode::serialize(&doc)?;
        let len = data.len() as u32;
        let mut hasher = Hasher::new();
        hasher.update(&data);
        let crc = hasher.finalize();

        self.file.seek(SeekFrom::End(0))?;
        let offset = self.file.stream_position()? + 4;
        self.file.write_all(&len.to_le_bytes())?;
        self.file.write_all(&data)?;
        self.file.write_all(&crc.to_le_bytes())?;

        self.index.push(FrameLocation { offset, len });
        log::debug!("document store appended doc_id={}", doc_id.value());

        Ok(doc_id)
    }

    fn scan(&self, offset: u64, limit: u64) -> Result<Vec<Document>> {
        let start = offset as usize;
        if start >= self.index.len() {
            return Ok(Vec::new());
        }
        let end = std::cmp::min(start + limit as usize, self.index.len());
        self.index[start..end].iter().map(|loc| self.read_frame(loc)).collect()
    }

    fn get(&self, doc_id: DocId) -> Result<Option<Document>> {
        let idx = doc_id.value().checked_sub(1);
        match idx {
            Some(idx) if (idx as usize) < self.index.len() => {
                Ok(Some(self.read_frame(&self.index[idx as usize])?))
            }
            _ => Ok(None),
        }
    }

    fn len(&self) -> u64 {
        self.index.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn append_and_scan_roundtrip() {
        let dir = tempdir().unwrap();
        let layout = StorageLayout::new(dir.path().to_path_buf()).unwrap();
        let mut store = SegmentedDocumentStore::open(&layout).unwrap();

        let id1 = store.append("http://a", "Title A", "body a").unwrap();
        let id2 = store.append("http://b", "Title B", "body b").unwrap();
        assert_eq!(id1, DocId(1));
        assert_eq!(id2, DocId(2));
        assert_eq!(store.len(), 2);

        let docs = store.scan(0, 10).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].doc_id, DocId(1));
        assert_eq!(docs[1].url, "http://b");
    }

    #[test]
    fn get_by_id() {
        let dir = tempdir().unwrap();
        let layout = StorageLayout::new(dir.path().to_path_buf()).unwrap();
        let mut store = SegmentedDocumentStore::open(&layout).unwrap();
        store.append("http://a", "Title A", "body a").unwrap();

        assert!(store.get(DocId(1)).unwrap().is_some());
        assert!(store.get(DocId(2)).unwrap().is_none());
    }

    #[test]
    fn reopen_rebuilds_index() {
        let dir = tempdir().unwrap();
        let layout = StorageLayout::new(dir.path().to_path_buf()).unwrap();
        {
            let mut store = SegmentedDocumentStore::open(&layout).unwrap();
            store.append("http://a", "Title A", "body a").unwrap();
            store.append("http://b", "Title B", "body b").unwrap();
        }
        let store = SegmentedDocumentStore::open(&layout).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(DocId(2)).unwrap().unwrap().title, "Title B");
    }
}
