//! # Chunkset Core
//!
//! A disk-backed collection for datasets too large to keep in memory.
//!
//! This crate provides:
//! - [`ChunkedStore`]: an append-only collection that keeps at most one chunk
//!   of elements in memory and seals the rest into chunk files
//! - [`ChunkIter`]: a lazy iterator that crosses chunk boundaries holding at
//!   most one open read handle
//! - Set operations: `contains`, `contains_all`, `remove_all`, `retain_all`
//! - External merge sort with duplicate elimination
//!
//! Elements are any type implementing [`Element`], i.e. a codec from
//! `chunkset_codec` plus a total order.
//!
//! ## Example
//!
//! ```rust
//! use chunkset_core::{ChunkedStore, Config};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let config = Config::new().chunk_size(2).temp_dir(dir.path());
//! let mut store: ChunkedStore<String> = ChunkedStore::open(config).unwrap();
//!
//! for word in ["pear", "apple", "fig", "apple"] {
//!     store.add(word.to_string()).unwrap();
//! }
//! assert!(store.contains(&"fig".to_string()).unwrap());
//!
//! store.sort().unwrap();
//! let words: Vec<String> = store.iter().collect::<Result<_, _>>().unwrap();
//! assert_eq!(words, ["apple", "fig", "pear"]);
//!
//! store.close().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod chunk;
mod config;
mod element;
mod error;
mod iter;
mod layout;
mod set_ops;
mod sort;
mod store;

pub use chunk::{compute_crc32, SealedChunk};
pub use config::{Config, DEFAULT_CHUNK_SIZE, DEFAULT_FILE_PREFIX, DEFAULT_MERGE_FAN_IN};
pub use element::Element;
pub use error::{CoreError, CoreResult};
pub use iter::ChunkIter;
pub use set_ops::{ElementSource, Operand};
pub use sort::SortStats;
pub use store::ChunkedStore;

pub use chunkset_codec::{cbor_element, CodecError, Decode, Encode};
pub use chunkset_storage::{ChunkDirectory, ChunkId, MemoryChunkDirectory, StorageError, TempChunkDirectory};
