//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores
//! and common test scenarios.

use chunkset_core::{ChunkedStore, Config, CoreResult, Element};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A test store with automatic cleanup.
pub struct TestStore<T: Element> {
    /// The store instance.
    pub store: ChunkedStore<T>,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl<T: Element> TestStore<T> {
    /// Creates a new in-memory test store.
    pub fn memory(chunk_size: usize) -> Self {
        Self {
            store: ChunkedStore::in_memory(chunk_size).expect("Failed to create in-memory store"),
            temp_dir: None,
        }
    }

    /// Creates a new file-based test store in its own temporary directory.
    pub fn file(chunk_size: usize) -> Self {
        Self::file_with(Config::new().chunk_size(chunk_size))
    }

    /// Creates a file-based test store from `config`, overriding its
    /// `temp_dir`.
    pub fn file_with(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = ChunkedStore::open(config.temp_dir(temp_dir.path()))
            .expect("Failed to create file store");

        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the chunk directory if file-based, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }

    /// Lists the chunk files currently on disk, sorted by name.
    pub fn chunk_files(&self) -> Vec<PathBuf> {
        let Some(dir) = self.path() else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .expect("Failed to list chunk directory")
            .map(|entry| entry.expect("Failed to read directory entry").path())
            .collect();
        files.sort();
        files
    }
}

impl<T: Element> std::ops::Deref for TestStore<T> {
    type Target = ChunkedStore<T>;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

impl<T: Element> std::ops::DerefMut for TestStore<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.store
    }
}

/// Runs a test with a temporary in-memory store.
pub fn with_memory_store<T, F, R>(chunk_size: usize, f: F) -> R
where
    T: Element,
    F: FnOnce(&mut ChunkedStore<T>) -> R,
{
    let mut test_store = TestStore::memory(chunk_size);
    f(&mut test_store.store)
}

/// Runs a test with a temporary file-based store.
pub fn with_file_store<T, F, R>(chunk_size: usize, f: F) -> R
where
    T: Element,
    F: FnOnce(&mut ChunkedStore<T>) -> R,
{
    let mut test_store = TestStore::file(chunk_size);
    f(&mut test_store.store)
}

/// Collects every element of `store` in iteration order.
pub fn collect<T: Element>(store: &ChunkedStore<T>) -> Vec<T> {
    store
        .iter()
        .collect::<CoreResult<_>>()
        .expect("Failed to iterate store")
}

/// Installs a tracing subscriber that honours `RUST_LOG` and writes through
/// the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use crate::generators::collision_key;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Creates a file store holding `0..count` in insertion order.
    pub fn populated_store(count: u64, chunk_size: usize) -> TestStore<u64> {
        let mut test_store = TestStore::file(chunk_size);
        test_store.add_all(0..count).expect("Failed to populate store");
        test_store
    }

    /// Creates a file store holding `count` high-collision hex keys.
    ///
    /// Each key has `dimensions` hex digits, so at most `16^dimensions`
    /// distinct keys exist.
    pub fn collision_store(count: usize, dimensions: usize, seed: u64) -> TestStore<String> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut test_store = TestStore::file(100);
        for _ in 0..count {
            test_store
                .add(collision_key(rng.gen(), dimensions))
                .expect("Failed to add key");
        }
        test_store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_has_no_files() {
        let mut test_store = TestStore::<i32>::memory(2);
        test_store.add_all(1..=5).unwrap();
        assert!(test_store.path().is_none());
        assert!(test_store.chunk_files().is_empty());
    }

    #[test]
    fn file_store_lists_sealed_chunks() {
        let mut test_store = TestStore::<i32>::file(2);
        test_store.add_all(1..=5).unwrap();
        assert_eq!(test_store.chunk_files().len(), 2);
        assert!(test_store
            .chunk_files()
            .iter()
            .all(|p| p.extension().is_some_and(|e| e == "chunk")));
    }

    #[test]
    fn with_file_store_cleans_up() {
        let location = with_file_store::<i32, _, _>(1, |store| {
            store.add_all([1, 2]).unwrap();
            store.location().unwrap().to_path_buf()
        });
        assert!(!location.exists());
    }

    #[test]
    fn populated_scenario() {
        let test_store = scenarios::populated_store(10, 3);
        assert_eq!(collect(&test_store), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn collision_scenario_is_deterministic() {
        let a = scenarios::collision_store(50, 2, 9);
        let b = scenarios::collision_store(50, 2, 9);
        assert_eq!(collect(&a), collect(&b));
    }
}
