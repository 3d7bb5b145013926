//! K-way merge of sorted runs with duplicate elimination.

use crate::chunk::reader::ChunkReader;
use crate::chunk::SealedChunk;
use crate::element::Element;
use crate::error::CoreResult;
use chunkset_storage::ChunkDirectory;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// The next unread element of one run.
struct Head<T> {
    element: T,
    run: usize,
}

impl<T: Ord> Ord for Head<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.element
            .cmp(&other.element)
            .then_with(|| self.run.cmp(&other.run))
    }
}

impl<T: Ord> PartialOrd for Head<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord> PartialEq for Head<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: Ord> Eq for Head<T> {}

/// Merges sorted runs into one strictly ascending sequence.
///
/// Holds one read handle and one head element per run. Heads that compare
/// equal are ordered by run index, and only the first occurrence of each
/// value is emitted.
pub(crate) struct RunMerger<T> {
    readers: Vec<ChunkReader<T>>,
    heap: BinaryHeap<Reverse<Head<T>>>,
    last: Option<T>,
    skipped: usize,
}

impl<T: Element> RunMerger<T> {
    /// Opens every run in `runs` and loads its first element.
    pub(crate) fn open(directory: &dyn ChunkDirectory, runs: &[SealedChunk]) -> CoreResult<Self> {
        let mut readers = Vec::with_capacity(runs.len());
        let mut heap = BinaryHeap::with_capacity(runs.len());

        for (run, &chunk) in runs.iter().enumerate() {
            let mut reader = ChunkReader::open(directory, chunk)?;
            if let Some(element) = reader.next_element()? {
                heap.push(Reverse(Head { element, run }));
            }
            readers.push(reader);
        }

        Ok(Self {
            readers,
            heap,
            last: None,
            skipped: 0,
        })
    }

    /// Returns the next distinct element, or `None` once all runs are drained.
    pub(crate) fn next_distinct(&mut self) -> CoreResult<Option<T>> {
        while let Some(Reverse(Head { element, run })) = self.heap.pop() {
            if let Some(next) = self.readers[run].next_element()? {
                self.heap.push(Reverse(Head { element: next, run }));
            }

            if self.last.as_ref() == Some(&element) {
                self.skipped += 1;
                continue;
            }
            self.last = Some(element.clone());
            return Ok(Some(element));
        }
        Ok(None)
    }

    /// Number of duplicates dropped so far.
    pub(crate) fn skipped(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::write_sealed;
    use chunkset_storage::MemoryChunkDirectory;

    fn drain(merger: &mut RunMerger<u32>) -> Vec<u32> {
        let mut out = Vec::new();
        while let Some(element) = merger.next_distinct().unwrap() {
            out.push(element);
        }
        out
    }

    #[test]
    fn merges_and_dedups_across_runs() {
        let directory = MemoryChunkDirectory::new();
        let runs = vec![
            write_sealed(&directory, &[1u32, 4, 7], false).unwrap(),
            write_sealed(&directory, &[1u32, 2, 7, 9], false).unwrap(),
            write_sealed(&directory, &[3u32, 4], false).unwrap(),
        ];

        let mut merger = RunMerger::open(&directory, &runs).unwrap();
        assert_eq!(drain(&mut merger), vec![1, 2, 3, 4, 7, 9]);
        assert_eq!(merger.skipped(), 3);
    }

    #[test]
    fn drops_duplicates_within_a_run() {
        let directory = MemoryChunkDirectory::new();
        let runs = vec![write_sealed(&directory, &[5u32, 5, 5, 6], false).unwrap()];

        let mut merger = RunMerger::open(&directory, &runs).unwrap();
        assert_eq!(drain(&mut merger), vec![5, 6]);
    }

    #[test]
    fn no_runs_yields_nothing() {
        let directory = MemoryChunkDirectory::new();
        let mut merger = RunMerger::<u32>::open(&directory, &[]).unwrap();
        assert!(merger.next_distinct().unwrap().is_none());
    }

    #[test]
    fn holds_one_handle_per_run() {
        let directory = MemoryChunkDirectory::new();
        let runs = vec![
            write_sealed(&directory, &[1u32], false).unwrap(),
            write_sealed(&directory, &[2u32], false).unwrap(),
        ];

        let merger = RunMerger::<u32>::open(&directory, &runs).unwrap();
        assert_eq!(directory.open_readers(), 2);
        drop(merger);
        assert_eq!(directory.open_readers(), 0);
    }
}
