//! The chunked store.

use crate::chunk::SealedChunk;
use crate::config::Config;
use crate::element::Element;
use crate::error::{CoreError, CoreResult};
use crate::iter::ChunkIter;
use crate::layout::{write_sealed, Layout, LayoutBuilder};
use chunkset_storage::{ChunkDirectory, MemoryChunkDirectory, TempChunkDirectory};
use std::fmt;
use std::path::Path;

/// A collection that keeps at most one chunk of elements in memory.
///
/// Elements are appended to an in-memory *active chunk*. When it holds
/// `chunk_size` elements it is sealed into a chunk file and a fresh active
/// chunk is started. Iteration visits the sealed chunks in creation order and
/// then the active chunk, so elements come back in insertion order.
///
/// The store exclusively owns its chunk files. They are deleted by
/// [`ChunkedStore::clear`], by [`ChunkedStore::close`], and on drop.
///
/// # Invariants
///
/// - `len() == sum(sealed chunk lengths) + active chunk length`
/// - `len()` is tracked incrementally; iterating never changes it
/// - every sealed chunk holds exactly `chunk_size` elements
/// - the active chunk holds fewer than `chunk_size` elements after every
///   successful call
///
/// # Example
///
/// ```rust
/// use chunkset_core::ChunkedStore;
///
/// let mut store = ChunkedStore::in_memory(2).unwrap();
/// store.add_all([1, 5, 3, 1, 6]).unwrap();
/// assert_eq!(store.len(), 5);
///
/// store.sort().unwrap();
/// let sorted: Vec<i32> = store.iter().collect::<Result<_, _>>().unwrap();
/// assert_eq!(sorted, vec![1, 3, 5, 6]);
/// ```
pub struct ChunkedStore<T: Element> {
    pub(crate) config: Config,
    pub(crate) directory: Box<dyn ChunkDirectory>,
    pub(crate) sealed: Vec<SealedChunk>,
    pub(crate) active: Vec<T>,
    len: usize,
}

impl<T: Element> ChunkedStore<T> {
    /// Creates an empty store with the given chunk size, keeping chunk files
    /// in a fresh temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `chunk_size` is zero or the temporary directory
    /// cannot be created.
    pub fn new(chunk_size: usize) -> CoreResult<Self> {
        Self::open(Config::new().chunk_size(chunk_size))
    }

    /// Creates an empty store from a configuration.
    ///
    /// Chunk files go to `config.temp_dir` if set, otherwise to a fresh
    /// system temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the directory
    /// cannot be created.
    pub fn open(config: Config) -> CoreResult<Self> {
        config.validate()?;
        let directory = match &config.temp_dir {
            Some(path) => TempChunkDirectory::in_dir(path, &config.file_prefix)?,
            None => TempChunkDirectory::new(&config.file_prefix)?,
        };
        Self::with_directory(config, Box::new(directory))
    }

    /// Creates an empty store whose chunks are held in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if `chunk_size` is zero.
    pub fn in_memory(chunk_size: usize) -> CoreResult<Self> {
        Self::with_directory(
            Config::new().chunk_size(chunk_size),
            Box::new(MemoryChunkDirectory::new()),
        )
    }

    /// Creates an empty store on top of an existing chunk directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_directory(config: Config, directory: Box<dyn ChunkDirectory>) -> CoreResult<Self> {
        config.validate()?;
        tracing::debug!(
            chunk_size = config.chunk_size,
            location = ?directory.location(),
            "created chunked store"
        );
        Ok(Self {
            config,
            directory,
            sealed: Vec::new(),
            active: Vec::new(),
            len: 0,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the maximum number of elements per chunk.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.config.chunk_size
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the store holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the sealed chunk descriptors in creation order.
    #[must_use]
    pub fn sealed_chunks(&self) -> &[SealedChunk] {
        &self.sealed
    }

    /// Returns the number of elements in the active chunk.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Returns where chunk files are stored, if on disk.
    #[must_use]
    pub fn location(&self) -> Option<&Path> {
        self.directory.location()
    }

    /// Appends an element. Always returns `true`.
    ///
    /// If the active chunk becomes full it is sealed to a new chunk file. Should
    /// sealing fail, the element stays in the active chunk, `len()` still
    /// counts it, and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the element cannot be encoded or the chunk cannot
    /// be written.
    pub fn add(&mut self, element: T) -> CoreResult<bool> {
        self.active.push(element);
        self.len += 1;

        if self.active.len() >= self.config.chunk_size {
            self.seal_active()?;
        }
        Ok(true)
    }

    /// Appends every element of `elements`.
    ///
    /// Returns whether at least one element was added.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first error of [`ChunkedStore::add`].
    pub fn add_all<I>(&mut self, elements: I) -> CoreResult<bool>
    where
        I: IntoIterator<Item = T>,
    {
        let mut added = false;
        for element in elements {
            added |= self.add(element)?;
        }
        Ok(added)
    }

    /// Seals full chunks off the front of the active buffer.
    ///
    /// After a failed seal the buffer may hold more than `chunk_size`
    /// elements; each sealed chunk still takes exactly `chunk_size`.
    fn seal_active(&mut self) -> CoreResult<()> {
        let chunk_size = self.config.chunk_size;
        while self.active.len() >= chunk_size {
            let chunk = write_sealed(
                self.directory.as_ref(),
                &self.active[..chunk_size],
                self.config.sync_on_seal,
            )?;
            tracing::debug!(
                chunk = %chunk.id(),
                elements = chunk.len(),
                bytes = chunk.bytes(),
                "sealed active chunk"
            );
            self.sealed.push(chunk);
            self.active.drain(..chunk_size);
        }
        Ok(())
    }

    /// Removes every element and deletes all chunk files.
    ///
    /// # Errors
    ///
    /// Returns an error if a chunk file cannot be deleted. The store is empty
    /// afterwards regardless; undeleted files are still removed when the
    /// directory is dropped.
    pub fn clear(&mut self) -> CoreResult<()> {
        let sealed = std::mem::take(&mut self.sealed);
        self.active.clear();
        self.len = 0;
        tracing::debug!(chunks = sealed.len(), "clearing chunked store");
        self.remove_chunks(&sealed)
    }

    /// Positional removal is not supported.
    ///
    /// A chunked store is not indexable; supporting this would require
    /// rewriting every chunk after `index`.
    ///
    /// # Errors
    ///
    /// Always returns [`CoreError::Unsupported`].
    pub fn remove_at(&mut self, _index: usize) -> CoreResult<T> {
        Err(CoreError::unsupported("remove_at"))
    }

    /// Materialising the store is not supported.
    ///
    /// Use [`ChunkedStore::iter`] to stream the elements instead.
    ///
    /// # Errors
    ///
    /// Always returns [`CoreError::Unsupported`].
    pub fn to_vec(&self) -> CoreResult<Vec<T>> {
        Err(CoreError::unsupported("to_vec"))
    }

    /// Returns a lazy iterator over all elements in insertion order.
    ///
    /// The iterator borrows the store, so the store cannot be modified until
    /// the iterator is dropped.
    pub fn iter(&self) -> ChunkIter<'_, T> {
        ChunkIter::new(self)
    }

    /// Deletes all backing storage and consumes the store.
    ///
    /// # Errors
    ///
    /// Returns an error if a chunk file cannot be deleted.
    pub fn close(mut self) -> CoreResult<()> {
        self.clear()
    }

    /// Returns a builder for a replacement layout in this store's directory.
    pub(crate) fn layout_builder(&self) -> LayoutBuilder<'_, T> {
        LayoutBuilder::new(
            self.directory.as_ref(),
            self.config.chunk_size,
            self.config.sync_on_seal,
        )
    }

    /// Replaces the store's contents with `layout` and deletes the chunks it
    /// replaces.
    pub(crate) fn install(&mut self, layout: Layout<T>) -> CoreResult<()> {
        let replaced = std::mem::replace(&mut self.sealed, layout.sealed);
        self.active = layout.active;
        self.len = layout.len;
        tracing::debug!(
            elements = self.len,
            chunks = self.sealed.len(),
            replaced = replaced.len(),
            "installed rewritten layout"
        );
        self.remove_chunks(&replaced)
    }

    fn remove_chunks(&self, chunks: &[SealedChunk]) -> CoreResult<()> {
        let mut first_error = None;
        for chunk in chunks {
            if let Err(e) = self.directory.remove(chunk.id()) {
                tracing::warn!(chunk = %chunk.id(), error = %e, "failed to delete chunk");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

impl<T: Element> Drop for ChunkedStore<T> {
    fn drop(&mut self) {
        for chunk in &self.sealed {
            if let Err(e) = self.directory.remove(chunk.id()) {
                tracing::warn!(chunk = %chunk.id(), error = %e, "failed to delete chunk on drop");
            }
        }
    }
}

impl<'s, T: Element> IntoIterator for &'s ChunkedStore<T> {
    type Item = CoreResult<T>;
    type IntoIter = ChunkIter<'s, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Element> fmt::Debug for ChunkedStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkedStore")
            .field("chunk_size", &self.config.chunk_size)
            .field("len", &self.len)
            .field("sealed_chunks", &self.sealed.len())
            .field("active_len", &self.active.len())
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn store(chunk_size: usize) -> ChunkedStore<i32> {
        ChunkedStore::in_memory(chunk_size).unwrap()
    }

    fn chunk_lens(store: &ChunkedStore<i32>) -> Vec<usize> {
        store.sealed_chunks().iter().map(SealedChunk::len).collect()
    }

    #[test]
    fn add_increments_len() {
        let mut store = store(2);
        assert!(store.add(1).unwrap());
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
    }

    #[test]
    fn add_seals_full_chunks() {
        let mut store = store(2);
        store.add_all(1..=5).unwrap();

        assert_eq!(chunk_lens(&store), vec![2, 2]);
        assert_eq!(store.active_len(), 1);
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn chunk_size_one_seals_every_element() {
        let mut store = store(1);
        store.add_all([7, 8, 9]).unwrap();
        assert_eq!(chunk_lens(&store), vec![1, 1, 1]);
        assert_eq!(store.active_len(), 0);
    }

    #[test]
    fn add_all_empty_returns_false() {
        let mut store = store(2);
        assert!(!store.add_all(Vec::new()).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert!(matches!(
            ChunkedStore::<i32>::in_memory(0),
            Err(CoreError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn clear_deletes_chunks() {
        let mut store = store(2);
        store.add_all(1..=3).unwrap();
        store.clear().unwrap();

        assert!(store.is_empty());
        assert!(store.sealed_chunks().is_empty());
        assert_eq!(store.active_len(), 0);
        assert_eq!(store.directory.chunk_count(), 0);
    }

    #[test]
    fn store_is_reusable_after_clear() {
        let mut store = store(2);
        store.add_all(1..=3).unwrap();
        store.clear().unwrap();
        store.add_all([10, 11, 12]).unwrap();

        let values: Vec<i32> = store.iter().collect::<CoreResult<_>>().unwrap();
        assert_eq!(values, vec![10, 11, 12]);
    }

    #[test]
    fn unsupported_operations() {
        let mut store = store(2);
        assert!(matches!(
            store.remove_at(0),
            Err(CoreError::Unsupported { operation: "remove_at" })
        ));
        assert!(matches!(
            store.to_vec(),
            Err(CoreError::Unsupported { operation: "to_vec" })
        ));

        store.add_all(1..=3).unwrap();
        assert!(store.remove_at(1).is_err());
        assert!(store.to_vec().is_err());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn failed_seal_keeps_element_counted() {
        let directory = MemoryChunkDirectory::new();
        directory.fail_creates_after(0);
        let mut store: ChunkedStore<i32> =
            ChunkedStore::with_directory(Config::new().chunk_size(2), Box::new(directory))
                .unwrap();

        store.add(1).unwrap();
        assert!(store.add(2).is_err());
        assert_eq!(store.len(), 2);
        assert_eq!(store.active_len(), 2);
        assert!(store.sealed_chunks().is_empty());
    }

    #[test]
    fn add_after_failed_seal_keeps_chunks_bounded() {
        let directory = Arc::new(MemoryChunkDirectory::new());
        let mut store: ChunkedStore<i32> = ChunkedStore::with_directory(
            Config::new().chunk_size(2),
            Box::new(Arc::clone(&directory)),
        )
        .unwrap();

        store.add(1).unwrap();
        directory.fail_creates_after(0);
        assert!(store.add(2).is_err());
        directory.clear_injected_failures();
        store.add(3).unwrap();

        assert_eq!(chunk_lens(&store), vec![2]);
        assert_eq!(store.active_len(), 1);
        assert_eq!(store.len(), 3);
        let elements: Vec<i32> = store.iter().collect::<CoreResult<_>>().unwrap();
        assert_eq!(elements, vec![1, 2, 3]);

        store.add(4).unwrap();
        assert_eq!(chunk_lens(&store), vec![2, 2]);
        assert_eq!(store.active_len(), 0);
    }

    #[test]
    fn file_store_deletes_files_on_close() {
        let dir = tempdir().unwrap();
        let mut store: ChunkedStore<i32> =
            ChunkedStore::open(Config::new().chunk_size(2).temp_dir(dir.path())).unwrap();
        store.add_all(1..=6).unwrap();

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
        store.close().unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn file_store_deletes_files_on_drop() {
        let dir = tempdir().unwrap();
        {
            let mut store: ChunkedStore<String> =
                ChunkedStore::open(Config::new().chunk_size(2).temp_dir(dir.path())).unwrap();
            store.add_all(["a", "b", "c"].map(String::from)).unwrap();
            assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn default_location_is_temporary() {
        let store: ChunkedStore<i32> = ChunkedStore::new(4).unwrap();
        let location = store.location().unwrap().to_path_buf();
        assert!(location.exists());
        drop(store);
        assert!(!location.exists());
    }
}
