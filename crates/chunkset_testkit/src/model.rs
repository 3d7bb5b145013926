//! In-memory reference model.
//!
//! [`ReferenceModel`] implements the observable behaviour of a chunked store
//! on a plain `Vec`, so property tests can run the same operations against
//! both and compare results.

use crate::generators::StoreOperation;
use chunkset_core::{ChunkedStore, CoreResult, Operand};
use std::collections::BTreeSet;

/// A `Vec`-backed model of a chunked store of `i32`.
#[derive(Debug, Clone, Default)]
pub struct ReferenceModel {
    elements: Vec<i32>,
}

impl ReferenceModel {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the elements in insertion order.
    #[must_use]
    pub fn elements(&self) -> &[i32] {
        &self.elements
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns whether the model is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns whether every element of `others` is present.
    #[must_use]
    pub fn contains_all(&self, others: &[i32]) -> bool {
        others.iter().all(|e| self.elements.contains(e))
    }

    /// Applies `op` and returns its boolean result, or `None` for
    /// operations without one.
    pub fn apply(&mut self, op: &StoreOperation) -> Option<bool> {
        match op {
            StoreOperation::Add(e) => {
                self.elements.push(*e);
                Some(true)
            }
            StoreOperation::AddAll(es) => {
                self.elements.extend_from_slice(es);
                Some(!es.is_empty())
            }
            StoreOperation::Clear => {
                self.elements.clear();
                None
            }
            StoreOperation::RemoveAll(es) => {
                if es.is_empty() {
                    return Some(false);
                }
                let before = self.elements.len();
                self.elements.retain(|e| !es.contains(e));
                Some(self.elements.len() != before)
            }
            StoreOperation::RetainAll(es) => {
                let before = self.elements.len();
                self.elements.retain(|e| es.contains(e));
                Some(self.elements.len() != before)
            }
            StoreOperation::RemoveItself => {
                let changed = !self.elements.is_empty();
                self.elements.clear();
                Some(changed)
            }
            StoreOperation::RetainItself => Some(false),
            StoreOperation::Sort => {
                let distinct: BTreeSet<i32> = self.elements.drain(..).collect();
                self.elements.extend(distinct);
                None
            }
        }
    }
}

/// Applies `op` to `store`, mirroring [`ReferenceModel::apply`].
///
/// # Errors
///
/// Returns any error reported by the store.
pub fn apply_to_store(store: &mut ChunkedStore<i32>, op: &StoreOperation) -> CoreResult<Option<bool>> {
    Ok(match op {
        StoreOperation::Add(e) => Some(store.add(*e)?),
        StoreOperation::AddAll(es) => Some(store.add_all(es.iter().copied())?),
        StoreOperation::Clear => {
            store.clear()?;
            None
        }
        StoreOperation::RemoveAll(es) => Some(store.remove_all(es)?),
        StoreOperation::RetainAll(es) => Some(store.retain_all(es)?),
        StoreOperation::RemoveItself => Some(store.remove_all(Operand::Itself)?),
        StoreOperation::RetainItself => Some(store.retain_all(Operand::Itself)?),
        StoreOperation::Sort => {
            store.sort()?;
            None
        }
    })
}
