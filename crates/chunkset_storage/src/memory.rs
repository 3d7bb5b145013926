//! In-memory storage backend and chunk directory for testing.

use crate::backend::StorageBackend;
use crate::directory::{ChunkDirectory, ChunkId};
use crate::error::{StorageError, StorageResult};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// An in-memory storage backend.
///
/// Clones share the same bytes, which is how [`MemoryChunkDirectory`] hands
/// out read handles on a chunk that was written through another handle.
///
/// # Example
///
/// ```rust
/// use chunkset_storage::{StorageBackend, InMemoryBackend};
///
/// let mut backend = InMemoryBackend::new();
/// let offset = backend.append(b"test data").unwrap();
/// assert_eq!(offset, 0);
/// assert_eq!(backend.size().unwrap(), 9);
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryBackend {
    data: Arc<RwLock<Vec<u8>>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory backend with pre-existing data.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Returns a copy of all data in the backend.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.read().clone()
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let data = self.data.read();
        let size = data.len() as u64;
        let offset_usize = offset as usize;
        let end = offset_usize.saturating_add(len);

        if offset > size || end > data.len() {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        Ok(data[offset_usize..end].to_vec())
    }

    fn append(&mut self, new_data: &[u8]) -> StorageResult<u64> {
        let mut data = self.data.write();
        let offset = data.len() as u64;
        data.extend_from_slice(new_data);
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        // In-memory backend has no pending writes
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.read().len() as u64)
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct DirectoryState {
    chunks: HashMap<ChunkId, InMemoryBackend>,
    next_id: u64,
    /// Remaining successful `create` calls before injected failures start.
    creates_before_failure: Option<usize>,
}

/// A chunk directory that keeps every chunk in memory.
///
/// Besides being fast, it counts the read handles that are currently open,
/// which lets tests check that iterators release their handles, and it can
/// inject allocation failures to exercise staged rewrites.
#[derive(Debug, Default)]
pub struct MemoryChunkDirectory {
    state: Mutex<DirectoryState>,
    open_readers: Arc<AtomicUsize>,
}

impl MemoryChunkDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of read handles that have not been dropped yet.
    #[must_use]
    pub fn open_readers(&self) -> usize {
        self.open_readers.load(Ordering::SeqCst)
    }

    /// Makes every `create` after the next `successful` ones fail.
    pub fn fail_creates_after(&self, successful: usize) {
        self.state.lock().creates_before_failure = Some(successful);
    }

    /// Removes a previously injected failure.
    pub fn clear_injected_failures(&self) {
        self.state.lock().creates_before_failure = None;
    }
}

impl ChunkDirectory for MemoryChunkDirectory {
    fn create(&self) -> StorageResult<(ChunkId, Box<dyn StorageBackend>)> {
        let mut state = self.state.lock();

        if let Some(remaining) = state.creates_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(StorageError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    "injected chunk allocation failure",
                )));
            }
            *remaining -= 1;
        }

        let id = ChunkId::new(state.next_id);
        state.next_id += 1;

        let backend = InMemoryBackend::new();
        state.chunks.insert(id, backend.clone());
        Ok((id, Box::new(backend)))
    }

    fn open(&self, id: ChunkId) -> StorageResult<Box<dyn StorageBackend>> {
        let state = self.state.lock();
        let backend = state
            .chunks
            .get(&id)
            .cloned()
            .ok_or(StorageError::UnknownChunk { id: id.as_u64() })?;

        self.open_readers.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ReadHandle {
            backend,
            open_readers: Arc::clone(&self.open_readers),
        }))
    }

    fn remove(&self, id: ChunkId) -> StorageResult<()> {
        self.state.lock().chunks.remove(&id);
        Ok(())
    }

    fn chunk_count(&self) -> usize {
        self.state.lock().chunks.len()
    }

    fn location(&self) -> Option<&Path> {
        None
    }
}

/// Read-only view on an in-memory chunk that decrements the open-handle
/// counter when dropped.
#[derive(Debug)]
struct ReadHandle {
    backend: InMemoryBackend,
    open_readers: Arc<AtomicUsize>,
}

impl StorageBackend for ReadHandle {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        self.backend.read_at(offset, len)
    }

    fn append(&mut self, _data: &[u8]) -> StorageResult<u64> {
        Err(StorageError::ReadOnly)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        self.backend.size()
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }
}

impl Drop for ReadHandle {
    fn drop(&mut self) {
        self.open_readers.fetch_sub(1, Ordering::SeqCst);
    }
}
