//! Streaming chunk reader.
//!
//! Reads element frames one by one from a sealed chunk, keeping memory
//! bounded by the read buffer regardless of the chunk size.

use crate::chunk::frame::{self, CRC_SIZE, HEADER_SIZE};
use crate::chunk::SealedChunk;
use crate::error::{CoreError, CoreResult};
use chunkset_codec::Decode;
use chunkset_storage::{ChunkDirectory, StorageBackend};
use std::marker::PhantomData;

/// Read buffer size for streaming iteration.
const READ_BUFFER_SIZE: usize = 64 * 1024; // 64 KB

/// A streaming reader over the elements of one sealed chunk.
///
/// The reader owns exactly one read handle, released when the reader is
/// dropped.
///
/// # Error Handling
///
/// Sealed chunks are complete by construction, so unlike a log tail a
/// truncated frame is corruption, not the end of data:
///
/// - Truncated frames return [`CoreError::ChunkCorruption`]
/// - CRC mismatches return [`CoreError::ChecksumMismatch`]
/// - A frame count or byte size that disagrees with the chunk descriptor
///   returns [`CoreError::ChunkCorruption`]
pub(crate) struct ChunkReader<T> {
    chunk: SealedChunk,
    backend: Box<dyn StorageBackend>,
    total_size: u64,
    /// File offset of `buffer[buffer_pos]`.
    current_offset: u64,
    buffer: Vec<u8>,
    buffer_pos: usize,
    buffer_len: usize,
    decoded: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Decode> ChunkReader<T> {
    /// Opens a read handle on `chunk`.
    pub(crate) fn open(directory: &dyn ChunkDirectory, chunk: SealedChunk) -> CoreResult<Self> {
        let backend = directory.open(chunk.id())?;
        let total_size = backend.size()?;

        if total_size != chunk.bytes() {
            return Err(CoreError::chunk_corruption(format!(
                "chunk {} holds {total_size} bytes, expected {}",
                chunk.id(),
                chunk.bytes()
            )));
        }

        let capacity = usize::try_from(total_size)
            .unwrap_or(READ_BUFFER_SIZE)
            .min(READ_BUFFER_SIZE);

        Ok(Self {
            chunk,
            backend,
            total_size,
            current_offset: 0,
            buffer: vec![0u8; capacity],
            buffer_pos: 0,
            buffer_len: 0,
            decoded: 0,
            _marker: PhantomData,
        })
    }

    /// Ensures at least `min_bytes` are available in the buffer from the
    /// current position.
    ///
    /// Returns `false` if the chunk ends first. Frames larger than the buffer
    /// grow it to the next power of two.
    fn ensure_buffered(&mut self, min_bytes: usize) -> CoreResult<bool> {
        let available = self.buffer_len - self.buffer_pos;
        if available >= min_bytes {
            return Ok(true);
        }

        let unread = self.total_size - self.current_offset - available as u64;
        if (available as u64).saturating_add(unread) < min_bytes as u64 {
            return Ok(false);
        }

        // Move the unconsumed tail to the front of the buffer
        self.buffer.copy_within(self.buffer_pos..self.buffer_len, 0);
        self.buffer_len = available;
        self.buffer_pos = 0;

        if min_bytes > self.buffer.len() {
            self.buffer.resize(min_bytes.next_power_of_two(), 0);
        }

        let to_read = (self.buffer.len() - self.buffer_len)
            .min(usize::try_from(unread).unwrap_or(usize::MAX));

        if to_read > 0 {
            let read_offset = self.current_offset + available as u64;
            let data = self.backend.read_at(read_offset, to_read)?;
            self.buffer[self.buffer_len..self.buffer_len + data.len()].copy_from_slice(&data);
            self.buffer_len += data.len();
        }

        Ok(self.buffer_len >= min_bytes)
    }

    /// Decodes the next element, or returns `None` once every element listed
    /// in the descriptor has been read.
    pub(crate) fn next_element(&mut self) -> CoreResult<Option<T>> {
        if self.decoded == self.chunk.len() {
            if self.current_offset != self.total_size {
                return Err(CoreError::chunk_corruption(format!(
                    "chunk {} has trailing bytes after {} elements",
                    self.chunk.id(),
                    self.decoded
                )));
            }
            return Ok(None);
        }

        if !self.ensure_buffered(HEADER_SIZE)? {
            return Err(self.truncated());
        }

        let start = self.buffer_pos;
        let payload_len = frame::payload_len(&self.buffer[start..start + HEADER_SIZE]);
        let total_len = HEADER_SIZE + payload_len + CRC_SIZE;

        if !self.ensure_buffered(total_len)? {
            return Err(self.truncated());
        }

        // ensure_buffered may have compacted the buffer
        let start = self.buffer_pos;
        let payload_start = start + HEADER_SIZE;
        let payload_end = payload_start + payload_len;
        let payload = &self.buffer[payload_start..payload_end];

        frame::verify(payload, &self.buffer[payload_end..payload_end + CRC_SIZE])?;
        let element = T::decode(payload)?;

        self.buffer_pos += total_len;
        self.current_offset += total_len as u64;
        self.decoded += 1;

        Ok(Some(element))
    }

    fn truncated(&self) -> CoreError {
        CoreError::chunk_corruption(format!(
            "chunk {} ends inside frame {} at offset {}",
            self.chunk.id(),
            self.decoded,
            self.current_offset
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::writer::ChunkWriter;
    use chunkset_storage::{MemoryChunkDirectory, TempChunkDirectory};

    fn write_chunk(directory: &dyn ChunkDirectory, values: &[String]) -> SealedChunk {
        let mut writer = ChunkWriter::create(directory).unwrap();
        for value in values {
            writer.append(value).unwrap();
        }
        writer.seal(false).unwrap()
    }

    fn read_all(directory: &dyn ChunkDirectory, chunk: SealedChunk) -> CoreResult<Vec<String>> {
        let mut reader = ChunkReader::<String>::open(directory, chunk)?;
        let mut out = Vec::new();
        while let Some(value) = reader.next_element()? {
            out.push(value);
        }
        Ok(out)
    }

    #[test]
    fn reads_back_in_insertion_order() {
        let directory = MemoryChunkDirectory::new();
        let values: Vec<String> = ["C", "D", "A", "E", "B"].map(String::from).to_vec();
        let chunk = write_chunk(&directory, &values);

        assert_eq!(chunk.len(), 5);
        assert_eq!(read_all(&directory, chunk).unwrap(), values);
    }

    #[test]
    fn empty_chunk_has_no_elements() {
        let directory = MemoryChunkDirectory::new();
        let chunk = write_chunk(&directory, &[]);
        assert!(chunk.is_empty());
        assert!(read_all(&directory, chunk).unwrap().is_empty());
    }

    #[test]
    fn frames_larger_than_buffer() {
        let directory = MemoryChunkDirectory::new();
        let big = "x".repeat(READ_BUFFER_SIZE * 2 + 17);
        let values = vec!["small".to_string(), big, "tail".to_string()];
        let chunk = write_chunk(&directory, &values);

        assert_eq!(read_all(&directory, chunk).unwrap(), values);
    }

    #[test]
    fn many_frames_across_buffer_refills() {
        let directory = TempChunkDirectory::new("reader").unwrap();
        let values: Vec<String> = (0..20_000).map(|i| format!("element-{i}")).collect();
        let chunk = write_chunk(&directory, &values);

        assert_eq!(read_all(&directory, chunk).unwrap(), values);
    }

    #[test]
    fn descriptor_size_mismatch_is_corruption() {
        let directory = MemoryChunkDirectory::new();
        let chunk = write_chunk(&directory, &["a".to_string()]);
        let wrong = SealedChunk {
            bytes: chunk.bytes() + 1,
            ..chunk
        };

        let result = ChunkReader::<String>::open(&directory, wrong);
        assert!(matches!(result, Err(CoreError::ChunkCorruption { .. })));
    }

    #[test]
    fn descriptor_count_mismatch_is_corruption() {
        let directory = MemoryChunkDirectory::new();
        let chunk = write_chunk(&directory, &["a".to_string(), "b".to_string()]);

        let fewer = SealedChunk { len: 1, ..chunk };
        assert!(matches!(
            read_all(&directory, fewer),
            Err(CoreError::ChunkCorruption { .. })
        ));

        let more = SealedChunk { len: 3, ..chunk };
        assert!(matches!(
            read_all(&directory, more),
            Err(CoreError::ChunkCorruption { .. })
        ));
    }

    #[test]
    fn dropping_reader_releases_handle() {
        let directory = MemoryChunkDirectory::new();
        let chunk = write_chunk(&directory, &["a".to_string()]);

        let reader = ChunkReader::<String>::open(&directory, chunk).unwrap();
        assert_eq!(directory.open_readers(), 1);
        drop(reader);
        assert_eq!(directory.open_readers(), 0);
    }
}
