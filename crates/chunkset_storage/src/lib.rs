//! # Chunkset Storage
//!
//! Byte-store backends and temporary chunk directories for chunkset.
//!
//! This crate provides the lowest-level storage abstraction used by the
//! chunked collection. Backends are **opaque byte stores** - they do not
//! interpret the frames written into them.
//!
//! ## Design Principles
//!
//! - Backends are simple byte stores (read, append, flush)
//! - No knowledge of chunk frames, element codecs or sort runs
//! - A [`ChunkDirectory`] hands out uniquely named backends, one per chunk,
//!   and is the only component that creates or deletes chunk storage
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral storage
//! - [`FileBackend`] - Backed by a file through OS file APIs
//!
//! ## Available Directories
//!
//! - [`TempChunkDirectory`] - Chunk files in a temporary (or caller-chosen) directory
//! - [`MemoryChunkDirectory`] - Chunks held in memory, with open-handle accounting
//!
//! ## Example
//!
//! ```rust
//! use chunkset_storage::{ChunkDirectory, MemoryChunkDirectory, StorageBackend};
//!
//! let directory = MemoryChunkDirectory::new();
//! let (id, mut writer) = directory.create().unwrap();
//! writer.append(b"hello world").unwrap();
//!
//! let reader = directory.open(id).unwrap();
//! assert_eq!(reader.read_at(0, 5).unwrap(), b"hello");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod directory;
mod error;
mod file;
mod memory;
mod temp;

pub use backend::StorageBackend;
pub use directory::{ChunkDirectory, ChunkId};
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::{InMemoryBackend, MemoryChunkDirectory};
pub use temp::TempChunkDirectory;
