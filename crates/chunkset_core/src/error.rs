//! Error types for chunkset core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in chunked collection operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] chunkset_storage::StorageError),

    /// Element codec error.
    #[error("codec error: {0}")]
    Codec(#[from] chunkset_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The operation is deliberately not provided by a chunked collection.
    #[error("unsupported operation: {operation}")]
    Unsupported {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// `next` was called on an iterator with no remaining elements.
    #[error("iterator exhausted")]
    IteratorExhausted,

    /// A chunk file does not match its descriptor.
    #[error("chunk corruption: {message}")]
    ChunkCorruption {
        /// Description of the corruption.
        message: String,
    },

    /// Checksum mismatch detected in an element frame.
    #[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Expected checksum.
        expected: u32,
        /// Actual checksum.
        actual: u32,
    },

    /// The configuration is not usable.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates an unsupported operation error.
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Creates a chunk corruption error.
    pub fn chunk_corruption(message: impl Into<String>) -> Self {
        Self::ChunkCorruption {
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
