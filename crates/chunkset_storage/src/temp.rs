//! Chunk directory backed by temporary files.

use crate::backend::StorageBackend;
use crate::directory::{ChunkDirectory, ChunkId};
use crate::error::StorageResult;
use crate::file::FileBackend;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

/// File extension of chunk files.
const CHUNK_EXTENSION: &str = "chunk";

#[derive(Debug)]
enum Root {
    /// A private temporary directory, deleted with the `TempDir`.
    Owned(TempDir),
    /// A caller-provided directory shared with other files.
    Shared(PathBuf),
}

impl Root {
    fn path(&self) -> &Path {
        match self {
            Root::Owned(dir) => dir.path(),
            Root::Shared(path) => path,
        }
    }
}

#[derive(Debug, Default)]
struct Allocation {
    next_id: u64,
    live: BTreeSet<ChunkId>,
}

/// A chunk directory that stores each chunk in its own file.
///
/// File names have the form `{prefix}-{tag}-{id}.chunk`, where `tag` is a
/// UUID chosen once per directory. Two directories sharing the same parent
/// therefore never collide, and a directory never reuses a name.
///
/// Files that are still allocated when the directory is dropped are deleted.
///
/// # Example
///
/// ```rust
/// use chunkset_storage::{ChunkDirectory, StorageBackend, TempChunkDirectory};
///
/// let directory = TempChunkDirectory::new("example").unwrap();
/// let (id, mut writer) = directory.create().unwrap();
/// writer.append(b"bytes").unwrap();
/// writer.flush().unwrap();
///
/// assert!(directory.chunk_path(id).exists());
/// directory.remove(id).unwrap();
/// assert!(!directory.chunk_path(id).exists());
/// ```
#[derive(Debug)]
pub struct TempChunkDirectory {
    root: Root,
    prefix: String,
    tag: String,
    allocation: Mutex<Allocation>,
}

impl TempChunkDirectory {
    /// Creates a directory inside a fresh system temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new(prefix: &str) -> StorageResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{prefix}-"))
            .tempdir()?;
        Ok(Self::with_root(Root::Owned(dir), prefix))
    }

    /// Creates a directory that places chunk files under `path`.
    ///
    /// `path` is created if missing and is left in place on drop; only the
    /// chunk files are deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be created.
    pub fn in_dir(path: &Path, prefix: &str) -> StorageResult<Self> {
        fs::create_dir_all(path)?;
        Ok(Self::with_root(Root::Shared(path.to_path_buf()), prefix))
    }

    fn with_root(root: Root, prefix: &str) -> Self {
        Self {
            root,
            prefix: prefix.to_string(),
            tag: Uuid::new_v4().simple().to_string(),
            allocation: Mutex::new(Allocation::default()),
        }
    }

    /// Returns the path of the file backing `id`.
    #[must_use]
    pub fn chunk_path(&self, id: ChunkId) -> PathBuf {
        self.root.path().join(format!(
            "{}-{}-{}.{}",
            self.prefix, self.tag, id, CHUNK_EXTENSION
        ))
    }

    /// Returns the paths of all allocated chunk files, in allocation order.
    #[must_use]
    pub fn chunk_paths(&self) -> Vec<PathBuf> {
        let allocation = self.allocation.lock();
        allocation
            .live
            .iter()
            .map(|&id| self.chunk_path(id))
            .collect()
    }
}

impl ChunkDirectory for TempChunkDirectory {
    fn create(&self) -> StorageResult<(ChunkId, Box<dyn StorageBackend>)> {
        let mut allocation = self.allocation.lock();
        let id = ChunkId::new(allocation.next_id);
        allocation.next_id += 1;

        let backend = FileBackend::create_new(&self.chunk_path(id))?;
        allocation.live.insert(id);
        tracing::trace!(chunk = %id, "allocated chunk file");

        Ok((id, Box::new(backend)))
    }

    fn open(&self, id: ChunkId) -> StorageResult<Box<dyn StorageBackend>> {
        let backend = FileBackend::open_read_only(&self.chunk_path(id))?;
        Ok(Box::new(backend))
    }

    fn remove(&self, id: ChunkId) -> StorageResult<()> {
        let mut allocation = self.allocation.lock();
        match fs::remove_file(self.chunk_path(id)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        allocation.live.remove(&id);
        Ok(())
    }

    fn chunk_count(&self) -> usize {
        self.allocation.lock().live.len()
    }

    fn location(&self) -> Option<&Path> {
        Some(self.root.path())
    }
}

impl Drop for TempChunkDirectory {
    fn drop(&mut self) {
        let live = std::mem::take(&mut self.allocation.get_mut().live);
        for id in live {
            let path = self.chunk_path(id);
            if let Err(e) = fs::remove_file(&path) {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "failed to delete chunk file");
                }
            }
        }
    }
}
