use crate::core::error::Result;
use crate::queue::spill_store::SpillStore;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::path::Path;

struct Inner {
    primary: VecDeque<Vec<u8>>,
    overflow_buffer: VecDeque<Vec<u8>>,
    store: SpillStore,
}

/// Memory-bounded, disk-spillable FIFO.
///
/// `primary` holds the head of the queue (drained by `get`); once it
/// reaches the memory cap `M`, new items accumulate in `overflow_buffer`.
/// When the overflow buffer exceeds `S = M / 2`, it is drained to the
/// durable store in insertion order. All three together preserve global
/// FIFO order: `primary` front, then whatever is durable (oldest first),
/// then `overflow_buffer`.
///
/// Single-process only: the durable store is truncated whenever a new
/// `SpillQueue` is constructed, so it is not meant to survive a restart.
pub struct SpillQueue<T> {
    inner: Mutex<Inner>,
    memory_cap: usize,
    _marker: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> SpillQueue<T> {
    pub fn open(store_path: impl AsRef<Path>, memory_cap: usize) -> Result<Self> {
        let store = SpillStore::open(store_path)?;
        Ok(SpillQueue {
            inner: Mutex::new(Inner {
                primary: VecDeque::new(),
                overflow_buffer: VecDeque::new(),
                store,
            }),
            memory_cap: memory_cap.max(2),
            _marker: PhantomData,
        })
    }

    fn spill_batch_size(&self) -> usize {
        self.memory_cap / 2
    }

    pub fn put(&self, item: T) -> Result<()> {
        let data = bincode::serialize(&item)?;
        let mut inner = self.inner.lock();

        if inner.primary.len() < self.memory_cap {
            inner.primary.push_back(data);
            return Ok(());
        }

        let spill_threshold = self.spill_batch_size();
        if inner.overflow_buffer.len() > spill_threshold {
            let batch: Vec<Vec<u8>> = inner.overflow_buffer.drain(..).collect();
            log::debug!("spilling {} items to durable store", batch.len());
            inner.store.push_batch(&batch)?;
        }
        inner.overflow_buffer.push_back(data);

        Ok(())
    }

    pub fn get(&self) -> Result<Option<T>> {
        let mut inner = self.inner.lock();
        self.refill_if_needed(&mut inner)?;

        match inner.primary.pop_front() {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    pub fn peek(&self) -> Result<Option<T>> {
        let mut inner = self.inner.lock();
        self.refill_if_needed(&mut inner)?;

        match inner.primary.front() {
            Some(data) => Ok(Some(bincode::deserialize(data)?)),
            None => Ok(None),
        }
    }

    fn refill_if_needed(&self, inner: &mut Inner) -> Result<()> {
        if !inner.primary.is_empty() {
            return Ok(());
        }

        let batch = self.spill_batch_size() as u64;
        if !inner.store.is_empty() {
            let drained = inner.store.pop_front_batch(batch)?;
            log::debug!("refilled {} items from durable store", drained.len());
            inner.primary.extend(drained);
            return Ok(());
        }

        if !inner.overflow_buffer.is_empty() {
            let take = std::cmp::min(batch as usize, inner.overflow_buffer.len());
            let moved: Vec<Vec<u8>> = inner.overflow_buffer.drain(..take).collect();
            inner.primary.extend(moved);
        }

        Ok(())
    }

    pub fn size(&self) -> u64 {
        let inner = self.inner.lock();
        inner.primary.len() as u64 + inner.overflow_buffer.len() as u64 + inner.store.len()
    }

    pub fn memory_size(&self) -> u64 {
        let inner = self.inner.lock();
        inner.primary.len() as u64 + inner.overflow_buffer.len() as u64
    }

    pub fn clear(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.primary.clear();
        inner.overflow_buffer.clear();
        let remaining = inner.store.len();
        inner.store.pop_front_batch(remaining)?;
        Ok(())
    }
}
