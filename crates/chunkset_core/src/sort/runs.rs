//! Sorted run files.

use crate::chunk::writer::ChunkWriter;
use crate::chunk::SealedChunk;
use crate::element::Element;
use crate::error::CoreResult;
use crate::layout::write_sealed;
use crate::sort::merge::RunMerger;
use chunkset_storage::ChunkDirectory;

/// Runs staged for a sort that has not completed yet.
///
/// Every run still listed is deleted on drop, so a sort that fails at any
/// point leaves no run files behind.
pub(crate) struct StagedRuns<'d> {
    directory: &'d dyn ChunkDirectory,
    sync: bool,
    runs: Vec<SealedChunk>,
}

impl<'d> StagedRuns<'d> {
    pub(crate) fn new(directory: &'d dyn ChunkDirectory, sync: bool) -> Self {
        Self {
            directory,
            sync,
            runs: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.runs.len()
    }

    pub(crate) fn runs(&self) -> &[SealedChunk] {
        &self.runs
    }

    /// Sorts `batch`, drops its duplicates and stages it as a new run.
    pub(crate) fn push_batch<T: Element>(&mut self, batch: &mut Vec<T>) -> CoreResult<()> {
        batch.sort_unstable();
        batch.dedup();
        let run = write_sealed(self.directory, batch, self.sync)?;
        self.runs.push(run);
        batch.clear();
        Ok(())
    }

    /// Merges groups of `fan_in` runs into single runs until at most `fan_in`
    /// runs remain. Returns the number of passes made.
    pub(crate) fn reduce<T: Element>(&mut self, fan_in: usize) -> CoreResult<usize> {
        let mut passes = 0;
        while self.runs.len() > fan_in {
            // Merged runs are appended at the back, so the inputs of the next
            // group are always at the front.
            let mut remaining = self.runs.len();
            while remaining > 0 {
                let take = fan_in.min(remaining);
                remaining -= take;
                if take == 1 {
                    self.runs.rotate_left(1);
                    continue;
                }
                let merged = self.merge_front::<T>(take)?;
                self.runs.push(merged);
                self.retire_front(take)?;
            }
            passes += 1;
            tracing::debug!(pass = passes, runs = self.runs.len(), "intermediate merge pass");
        }
        Ok(passes)
    }

    fn merge_front<T: Element>(&self, count: usize) -> CoreResult<SealedChunk> {
        let mut merger = RunMerger::<T>::open(self.directory, &self.runs[..count])?;
        let mut writer = ChunkWriter::create(self.directory)?;
        while let Some(element) = merger.next_distinct()? {
            writer.append(&element)?;
        }
        tracing::trace!(runs = count, duplicates = merger.skipped(), "merged runs");
        writer.seal(self.sync)
    }

    fn retire_front(&mut self, count: usize) -> CoreResult<()> {
        let retired: Vec<SealedChunk> = self.runs.drain(..count).collect();
        for (i, run) in retired.iter().enumerate() {
            if let Err(e) = self.directory.remove(run.id()) {
                // Keep tracking what is left so drop can retry
                self.runs.extend_from_slice(&retired[i..]);
                return Err(e.into());
            }
        }
        Ok(())
    }
}

impl Drop for StagedRuns<'_> {
    fn drop(&mut self) {
        for run in &self.runs {
            if let Err(e) = self.directory.remove(run.id()) {
                tracing::warn!(run = %run.id(), error = %e, "failed to delete sort run");
            }
        }
    }
}
