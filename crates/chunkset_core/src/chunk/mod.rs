//! Chunk files.
//!
//! A sealed chunk is an immutable, append-once sequence of element frames.
//! Chunks are written once by a [`writer::ChunkWriter`] and then read back
//! any number of times by independent [`reader::ChunkReader`]s.
//!
//! ## Frame Format
//!
//! ```text
//! | payload_len (4) | payload (N) | crc32 (4) |
//! ```
//!
//! The payload is the codec encoding of one element and the CRC covers the
//! payload only. A chunk carries no header: its element count and byte size
//! live in the [`SealedChunk`] descriptor kept by the owning store, and a
//! reader checks the file against both.

pub(crate) mod frame;
pub(crate) mod reader;
pub(crate) mod writer;

use chunkset_storage::ChunkId;

pub use frame::compute_crc32;

/// Descriptor of a sealed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealedChunk {
    id: ChunkId,
    len: usize,
    bytes: u64,
}

impl SealedChunk {
    /// Returns the chunk's identifier in its directory.
    #[must_use]
    pub fn id(&self) -> ChunkId {
        self.id
    }

    /// Returns the number of elements in the chunk.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the chunk holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the size of the chunk in bytes.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}
