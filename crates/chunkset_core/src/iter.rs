//! Cross-chunk iteration.

use crate::chunk::reader::ChunkReader;
use crate::element::Element;
use crate::error::{CoreError, CoreResult};
use crate::store::ChunkedStore;

/// A lazy, single-pass iterator over every element of a [`ChunkedStore`].
///
/// Sealed chunks are visited in creation order, followed by the active chunk.
/// A chunk's read handle is opened only when the previous chunk is exhausted
/// and is released before the next one is opened, so at most one handle is
/// held at a time.
///
/// The iterator borrows the store immutably: the store cannot be mutated
/// while an iterator is alive, so there is no stale-snapshot case to handle.
///
/// Two styles are available:
///
/// - `Iterator<Item = CoreResult<T>>` for use with adapters
/// - [`ChunkIter::has_next`] / [`ChunkIter::next_element`] with an explicit
///   [`ChunkIter::close`]
///
/// Any error closes the iterator. Dropping it closes it as well.
pub struct ChunkIter<'s, T: Element> {
    store: &'s ChunkedStore<T>,
    /// Index of the next sealed chunk to open.
    next_chunk: usize,
    reader: Option<ChunkReader<T>>,
    /// Position of the next element in the active chunk.
    active_pos: usize,
    peeked: Option<T>,
    closed: bool,
}

impl<'s, T: Element> ChunkIter<'s, T> {
    pub(crate) fn new(store: &'s ChunkedStore<T>) -> Self {
        Self {
            store,
            next_chunk: 0,
            reader: None,
            active_pos: 0,
            peeked: None,
            closed: false,
        }
    }

    fn advance(&mut self) -> CoreResult<Option<T>> {
        if self.closed {
            return Ok(None);
        }

        loop {
            if let Some(reader) = self.reader.as_mut() {
                if let Some(element) = reader.next_element()? {
                    return Ok(Some(element));
                }
                // Release the handle before opening the next chunk
                self.reader = None;
            }

            if let Some(&chunk) = self.store.sealed.get(self.next_chunk) {
                self.next_chunk += 1;
                self.reader = Some(ChunkReader::open(self.store.directory.as_ref(), chunk)?);
                continue;
            }

            if let Some(element) = self.store.active.get(self.active_pos) {
                self.active_pos += 1;
                return Ok(Some(element.clone()));
            }

            self.close();
            return Ok(None);
        }
    }

    fn advance_or_close(&mut self) -> CoreResult<Option<T>> {
        let result = self.advance();
        if result.is_err() {
            self.close();
        }
        result
    }

    /// Returns whether another element is available.
    ///
    /// May open the next chunk to find out.
    ///
    /// # Errors
    ///
    /// Returns an error if a chunk cannot be read; the iterator is closed.
    pub fn has_next(&mut self) -> CoreResult<bool> {
        if self.peeked.is_none() {
            self.peeked = self.advance_or_close()?;
        }
        Ok(self.peeked.is_some())
    }

    /// Returns the next element.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IteratorExhausted`] past the end, or an error if a
    /// chunk cannot be read.
    pub fn next_element(&mut self) -> CoreResult<T> {
        if let Some(element) = self.peeked.take() {
            return Ok(element);
        }
        self.advance_or_close()?.ok_or(CoreError::IteratorExhausted)
    }

    /// Releases the open read handle, if any. Idempotent.
    ///
    /// A closed iterator yields no further elements.
    pub fn close(&mut self) {
        self.reader = None;
        self.peeked = None;
        self.closed = true;
    }

    /// Returns whether the iterator has been closed or exhausted.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<T: Element> Iterator for ChunkIter<'_, T> {
    type Item = CoreResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(element) = self.peeked.take() {
            return Some(Ok(element));
        }
        self.advance_or_close().transpose()
    }
}

impl<T: Element> Drop for ChunkIter<'_, T> {
    fn drop(&mut self) {
        self.close();
    }
}
