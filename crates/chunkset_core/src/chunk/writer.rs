//! Sequential chunk writer.

use crate::chunk::frame::put_frame;
use crate::chunk::SealedChunk;
use crate::error::CoreResult;
use chunkset_codec::Encode;
use chunkset_storage::{ChunkDirectory, ChunkId, StorageBackend};

/// Bytes buffered before they are appended to the backend.
const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Builds one chunk by appending element frames.
///
/// A writer allocates its chunk on creation. If it is dropped before
/// [`ChunkWriter::seal`] succeeds, the partially written chunk is removed
/// from the directory, so a failed write never leaves a half-built chunk
/// behind.
pub(crate) struct ChunkWriter<'d> {
    directory: &'d dyn ChunkDirectory,
    id: ChunkId,
    backend: Box<dyn StorageBackend>,
    buffer: Vec<u8>,
    len: usize,
    bytes: u64,
    sealed: bool,
}

impl<'d> ChunkWriter<'d> {
    /// Allocates a new chunk in `directory`.
    pub(crate) fn create(directory: &'d dyn ChunkDirectory) -> CoreResult<Self> {
        let (id, backend) = directory.create()?;
        Ok(Self {
            directory,
            id,
            backend,
            buffer: Vec::with_capacity(WRITE_BUFFER_SIZE),
            len: 0,
            bytes: 0,
            sealed: false,
        })
    }

    /// Appends one element.
    pub(crate) fn append<T: Encode>(&mut self, element: &T) -> CoreResult<()> {
        let payload = element.encode()?;
        let before = self.buffer.len();
        put_frame(&mut self.buffer, &payload)?;
        self.bytes += (self.buffer.len() - before) as u64;
        self.len += 1;

        if self.buffer.len() >= WRITE_BUFFER_SIZE {
            self.drain()?;
        }
        Ok(())
    }

    fn drain(&mut self) -> CoreResult<()> {
        if !self.buffer.is_empty() {
            self.backend.append(&self.buffer)?;
            self.buffer.clear();
        }
        Ok(())
    }

    /// Flushes all frames and makes the chunk read-only.
    pub(crate) fn seal(mut self, sync: bool) -> CoreResult<SealedChunk> {
        self.drain()?;
        self.backend.flush()?;
        if sync {
            self.backend.sync()?;
        }
        self.sealed = true;

        Ok(SealedChunk {
            id: self.id,
            len: self.len,
            bytes: self.bytes,
        })
    }
}

impl Drop for ChunkWriter<'_> {
    fn drop(&mut self) {
        if self.sealed {
            return;
        }
        if let Err(e) = self.directory.remove(self.id) {
            tracing::warn!(chunk = %self.id, error = %e, "failed to remove unsealed chunk");
        }
    }
}
