//! Chunk directory trait definition.

use crate::backend::StorageBackend;
use crate::error::StorageResult;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Identifier of one chunk inside a [`ChunkDirectory`].
///
/// Identifiers are allocated monotonically by the directory and are never
/// reused for the lifetime of that directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkId(u64);

impl ChunkId {
    /// Creates a chunk ID from its raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}", self.0)
    }
}

/// Allocator for chunk storage.
///
/// A directory hands out one uniquely named, writable backend per chunk and
/// later reopens it for reading. It is the only component that creates or
/// deletes chunk storage; the collection that owns the directory decides
/// *when* chunks are removed.
///
/// Methods take `&self` so that a collection can stage replacement chunks
/// while it still streams from its current ones.
///
/// # Implementors
///
/// - [`super::TempChunkDirectory`] - One file per chunk
/// - [`super::MemoryChunkDirectory`] - For testing
pub trait ChunkDirectory: Send + Sync + fmt::Debug {
    /// Allocates a new, empty chunk and returns its ID with a writable backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be created.
    fn create(&self) -> StorageResult<(ChunkId, Box<dyn StorageBackend>)>;

    /// Opens an independent read handle on an existing chunk.
    ///
    /// # Errors
    ///
    /// Returns an error if the chunk is unknown or cannot be opened.
    fn open(&self, id: ChunkId) -> StorageResult<Box<dyn StorageBackend>>;

    /// Deletes the backing storage of a chunk.
    ///
    /// Removing a chunk whose storage is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage exists but cannot be deleted.
    fn remove(&self, id: ChunkId) -> StorageResult<()>;

    /// Returns the number of chunks currently allocated.
    fn chunk_count(&self) -> usize;

    /// Returns the filesystem location of the chunks, if they live on disk.
    fn location(&self) -> Option<&Path>;
}

/// Lets several owners share one directory, e.g. a store and a test probe.
impl<D: ChunkDirectory + ?Sized> ChunkDirectory for Arc<D> {
    fn create(&self) -> StorageResult<(ChunkId, Box<dyn StorageBackend>)> {
        (**self).create()
    }

    fn open(&self, id: ChunkId) -> StorageResult<Box<dyn StorageBackend>> {
        (**self).open(id)
    }

    fn remove(&self, id: ChunkId) -> StorageResult<()> {
        (**self).remove(id)
    }

    fn chunk_count(&self) -> usize {
        (**self).chunk_count()
    }

    fn location(&self) -> Option<&Path> {
        (**self).location()
    }
}
