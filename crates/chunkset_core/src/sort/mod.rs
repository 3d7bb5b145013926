//! External merge sort with duplicate elimination.
//!
//! Sorting replaces a store's contents with a strictly ascending,
//! duplicate-free sequence while holding at most `chunk_size` elements in
//! memory at once.
//!
//! ## Algorithm
//!
//! 1. **Run generation**: the store is read in batches of `chunk_size`; each
//!    batch is sorted, deduplicated and written to a run file.
//! 2. **Intermediate passes**: while more than `merge_fan_in` runs exist,
//!    groups of `merge_fan_in` runs are merged into single runs.
//! 3. **Final merge**: the remaining runs are merged through a binary heap
//!    keyed by each run's next element. Only the first occurrence of every
//!    value is emitted, and the output is repacked into `chunk_size` chunks.
//!
//! ## Invariants
//!
//! - The store's original chunks are deleted only after the final merge
//!   completes
//! - Run files are deleted whether the sort succeeds or fails

mod merge;
mod runs;

use crate::config::Config;
use crate::element::Element;
use crate::error::CoreResult;
use crate::layout::Layout;
use crate::store::ChunkedStore;
use merge::RunMerger;
use runs::StagedRuns;

/// Statistics of a completed sort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortStats {
    /// Number of elements before sorting.
    pub input_elements: usize,
    /// Number of sorted runs generated.
    pub runs: usize,
    /// Number of merge passes, including the final one.
    pub merge_passes: usize,
    /// Number of elements after sorting.
    pub output_elements: usize,
    /// Number of duplicate elements dropped.
    pub duplicates_removed: usize,
}

/// Sorts the contents of a [`ChunkedStore`] into a fresh layout.
pub(crate) struct ExternalSorter {
    chunk_size: usize,
    merge_fan_in: usize,
    sync: bool,
}

impl ExternalSorter {
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            chunk_size: config.chunk_size,
            merge_fan_in: config.merge_fan_in,
            sync: config.sync_on_seal,
        }
    }

    /// Produces the sorted layout of `store` without modifying it.
    pub(crate) fn sort<T: Element>(&self, store: &ChunkedStore<T>) -> CoreResult<(Layout<T>, SortStats)> {
        let directory = store.directory.as_ref();
        let mut staged = StagedRuns::new(directory, self.sync);

        // Run generation
        let mut input_elements = 0usize;
        let mut batch = Vec::with_capacity(self.chunk_size);
        for element in store.iter() {
            batch.push(element?);
            input_elements += 1;
            if batch.len() >= self.chunk_size {
                staged.push_batch(&mut batch)?;
            }
        }
        if !batch.is_empty() {
            staged.push_batch(&mut batch)?;
        }
        let runs = staged.len();
        tracing::debug!(input_elements, runs, "generated sorted runs");

        if runs == 0 {
            return Ok((
                Layout {
                    sealed: Vec::new(),
                    active: Vec::new(),
                    len: 0,
                },
                SortStats::default(),
            ));
        }

        let intermediate = staged.reduce::<T>(self.merge_fan_in)?;

        // Final merge straight into the new layout
        let mut merger = RunMerger::<T>::open(directory, staged.runs())?;
        let mut builder = store.layout_builder();
        while let Some(element) = merger.next_distinct()? {
            builder.push(element)?;
        }
        let layout = builder.finish();
        tracing::debug!(
            runs = staged.len(),
            elements = layout.len,
            duplicates = merger.skipped(),
            "final merge complete"
        );
        drop(merger);
        drop(staged);

        let stats = SortStats {
            input_elements,
            runs,
            merge_passes: intermediate + 1,
            output_elements: layout.len,
            duplicates_removed: input_elements - layout.len,
        };
        Ok((layout, stats))
    }
}

impl<T: Element> ChunkedStore<T> {
    /// Sorts the store in ascending order and removes duplicates.
    ///
    /// Elements are considered duplicates when they compare equal. The
    /// sorted sequence is repacked into full chunks and replaces the store's
    /// contents; `len()` becomes the number of distinct elements. Sorting an
    /// already sorted, duplicate-free store yields the same sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing a chunk fails. The store is then
    /// left exactly as it was before the call.
    pub fn sort(&mut self) -> CoreResult<SortStats> {
        let (layout, stats) = ExternalSorter::new(&self.config).sort(self)?;
        self.install(layout)?;
        tracing::debug!(
            input = stats.input_elements,
            output = stats.output_elements,
            runs = stats.runs,
            passes = stats.merge_passes,
            "sorted chunked store"
        );
        Ok(stats)
    }
}
