//! Staged chunk layouts.
//!
//! Every operation that rewrites a store (set operations and sort) streams
//! its surviving elements into a [`LayoutBuilder`]. The builder packs them
//! into full chunks in fresh files and keeps the final partial chunk in
//! memory. Nothing touches the store until the finished [`Layout`] is
//! installed, and dropping an unfinished builder deletes every chunk it
//! staged.

use crate::chunk::writer::ChunkWriter;
use crate::chunk::SealedChunk;
use crate::element::Element;
use crate::error::CoreResult;
use chunkset_storage::ChunkDirectory;

/// A complete replacement for a store's contents.
#[derive(Debug)]
pub(crate) struct Layout<T> {
    pub(crate) sealed: Vec<SealedChunk>,
    pub(crate) active: Vec<T>,
    pub(crate) len: usize,
}

/// Packs a stream of elements into `chunk_size`-sized chunks.
pub(crate) struct LayoutBuilder<'d, T> {
    directory: &'d dyn ChunkDirectory,
    chunk_size: usize,
    sync_on_seal: bool,
    sealed: Vec<SealedChunk>,
    pending: Vec<T>,
    len: usize,
    finished: bool,
}

impl<'d, T: Element> LayoutBuilder<'d, T> {
    pub(crate) fn new(directory: &'d dyn ChunkDirectory, chunk_size: usize, sync_on_seal: bool) -> Self {
        Self {
            directory,
            chunk_size,
            sync_on_seal,
            sealed: Vec::new(),
            pending: Vec::new(),
            len: 0,
            finished: false,
        }
    }

    /// Appends one element, sealing a chunk whenever `chunk_size` elements
    /// are pending.
    pub(crate) fn push(&mut self, element: T) -> CoreResult<()> {
        self.pending.push(element);
        self.len += 1;

        if self.pending.len() >= self.chunk_size {
            let chunk = write_sealed(self.directory, &self.pending, self.sync_on_seal)?;
            self.sealed.push(chunk);
            self.pending.clear();
        }
        Ok(())
    }

    /// Number of elements pushed so far.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Completes the layout. The remaining partial chunk becomes the active
    /// buffer.
    pub(crate) fn finish(mut self) -> Layout<T> {
        self.finished = true;
        Layout {
            sealed: std::mem::take(&mut self.sealed),
            active: std::mem::take(&mut self.pending),
            len: self.len,
        }
    }
}

impl<T> Drop for LayoutBuilder<'_, T> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        for chunk in &self.sealed {
            if let Err(e) = self.directory.remove(chunk.id()) {
                tracing::warn!(chunk = %chunk.id(), error = %e, "failed to discard staged chunk");
            }
        }
    }
}

/// Writes `elements` into a new sealed chunk.
pub(crate) fn write_sealed<T: Element>(
    directory: &dyn ChunkDirectory,
    elements: &[T],
    sync: bool,
) -> CoreResult<SealedChunk> {
    let mut writer = ChunkWriter::create(directory)?;
    for element in elements {
        writer.append(element)?;
    }
    let chunk = writer.seal(sync)?;
    tracing::trace!(chunk = %chunk.id(), elements = chunk.len(), "sealed chunk");
    Ok(chunk)
}
