//! Set operations over a chunked store.
//!
//! Membership tests are linear scans; there is no index. Bulk removal and
//! retention stream the store through a [`LayoutBuilder`], so the surviving
//! elements are repacked into full chunks in fresh files and the old chunks
//! are deleted only after the new layout is complete.
//!
//! The argument of a bulk operation is an [`Operand`]. It may itself be too
//! large for memory (another [`ChunkedStore`], for instance). Arguments of up
//! to `membership_budget` elements are held in a `BTreeSet`; larger ones are
//! re-scanned once per batch of store elements instead.

use crate::element::Element;
use crate::error::CoreResult;
use crate::layout::LayoutBuilder;
use crate::store::ChunkedStore;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::hash::BuildHasher;
use std::ops::ControlFlow;

/// A collection that can be scanned as the argument of a set operation.
pub trait ElementSource<T> {
    /// Returns the number of elements the source yields, duplicates included.
    fn source_len(&self) -> usize;

    /// Calls `f` on each element in turn until it returns
    /// [`ControlFlow::Break`].
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read.
    fn for_each_element(&self, f: &mut dyn FnMut(&T) -> ControlFlow<()>) -> CoreResult<()>;
}

macro_rules! in_memory_source {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<T> ElementSource<T> for $ty {
                fn source_len(&self) -> usize {
                    self.len()
                }

                fn for_each_element(
                    &self,
                    f: &mut dyn FnMut(&T) -> ControlFlow<()>,
                ) -> CoreResult<()> {
                    for element in self {
                        if f(element).is_break() {
                            break;
                        }
                    }
                    Ok(())
                }
            }
        )*
    };
}

in_memory_source!(Vec<T>, VecDeque<T>, BTreeSet<T>);

impl<T, S: BuildHasher> ElementSource<T> for HashSet<T, S> {
    fn source_len(&self) -> usize {
        self.len()
    }

    fn for_each_element(&self, f: &mut dyn FnMut(&T) -> ControlFlow<()>) -> CoreResult<()> {
        for element in self {
            if f(element).is_break() {
                break;
            }
        }
        Ok(())
    }
}

impl<T: Element> ElementSource<T> for ChunkedStore<T> {
    fn source_len(&self) -> usize {
        self.len()
    }

    fn for_each_element(&self, f: &mut dyn FnMut(&T) -> ControlFlow<()>) -> CoreResult<()> {
        for element in self.iter() {
            if f(&element?).is_break() {
                break;
            }
        }
        Ok(())
    }
}

/// The argument of a bulk set operation.
///
/// Usually built with `From`/`Into`:
///
/// ```rust
/// use chunkset_core::{ChunkedStore, Operand};
///
/// let mut store = ChunkedStore::in_memory(2).unwrap();
/// store.add_all(1..=6).unwrap();
///
/// assert!(store.remove_all(&[2, 4, 6]).unwrap());
/// assert!(!store.remove_all(None::<&Vec<i32>>).unwrap());
/// assert!(!store.retain_all(Operand::Itself).unwrap());
///
/// let left: Vec<i32> = store.iter().collect::<Result<_, _>>().unwrap();
/// assert_eq!(left, vec![1, 3, 5]);
/// ```
pub enum Operand<'a, T> {
    /// No argument at all.
    Absent,
    /// The store the operation is called on.
    Itself,
    /// Elements borrowed from a slice.
    Slice(&'a [T]),
    /// Any other scannable collection.
    Source(&'a dyn ElementSource<T>),
}

impl<T> Operand<'_, T> {
    fn source_len(&self) -> usize {
        match self {
            Self::Absent | Self::Itself => 0,
            Self::Slice(elements) => elements.len(),
            Self::Source(source) => source.source_len(),
        }
    }

    fn for_each_element(&self, f: &mut dyn FnMut(&T) -> ControlFlow<()>) -> CoreResult<()> {
        match self {
            Self::Absent | Self::Itself => Ok(()),
            Self::Slice(elements) => {
                for element in *elements {
                    if f(element).is_break() {
                        break;
                    }
                }
                Ok(())
            }
            Self::Source(source) => source.for_each_element(f),
        }
    }
}

impl<T> std::fmt::Debug for Operand<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absent => f.write_str("Absent"),
            Self::Itself => f.write_str("Itself"),
            Self::Slice(elements) => write!(f, "Slice(len={})", elements.len()),
            Self::Source(source) => write!(f, "Source(len={})", source.source_len()),
        }
    }
}

impl<'a, T> From<&'a [T]> for Operand<'a, T> {
    fn from(elements: &'a [T]) -> Self {
        Self::Slice(elements)
    }
}

impl<'a, T, const N: usize> From<&'a [T; N]> for Operand<'a, T> {
    fn from(elements: &'a [T; N]) -> Self {
        Self::Slice(elements)
    }
}

impl<'a, T> From<&'a Vec<T>> for Operand<'a, T> {
    fn from(elements: &'a Vec<T>) -> Self {
        Self::Slice(elements)
    }
}

impl<'a, T: 'a> From<&'a VecDeque<T>> for Operand<'a, T> {
    fn from(elements: &'a VecDeque<T>) -> Self {
        Self::Source(elements)
    }
}

impl<'a, T: 'a> From<&'a BTreeSet<T>> for Operand<'a, T> {
    fn from(elements: &'a BTreeSet<T>) -> Self {
        Self::Source(elements)
    }
}

impl<'a, T: 'a, S: BuildHasher + 'a> From<&'a HashSet<T, S>> for Operand<'a, T> {
    fn from(elements: &'a HashSet<T, S>) -> Self {
        Self::Source(elements)
    }
}

impl<'a, T: Element + 'a> From<&'a ChunkedStore<T>> for Operand<'a, T> {
    fn from(store: &'a ChunkedStore<T>) -> Self {
        Self::Source(store)
    }
}

impl<'a, T, X: Into<Operand<'a, T>>> From<Option<X>> for Operand<'a, T> {
    fn from(operand: Option<X>) -> Self {
        operand.map_or(Self::Absent, Into::into)
    }
}

/// Membership test over an operand.
enum Membership<'o, 'a, T> {
    /// The operand's distinct elements, held in memory.
    Resident(BTreeSet<T>),
    /// The operand itself, scanned once per tested batch.
    Streamed(&'o Operand<'a, T>),
}

impl<'o, 'a, T: Element> Membership<'o, 'a, T> {
    fn build(operand: &'o Operand<'a, T>, budget: usize) -> CoreResult<Self> {
        if operand.source_len() > budget {
            return Ok(Self::Streamed(operand));
        }
        let mut set = BTreeSet::new();
        operand.for_each_element(&mut |element| {
            set.insert(element.clone());
            ControlFlow::Continue(())
        })?;
        Ok(Self::Resident(set))
    }

    /// Returns, for each element of `batch`, whether the operand contains it.
    fn test(&self, batch: &[T]) -> CoreResult<Vec<bool>> {
        match self {
            Self::Resident(set) => Ok(batch.iter().map(|element| set.contains(element)).collect()),
            Self::Streamed(operand) => {
                let mut index: Vec<&T> = batch.iter().collect();
                index.sort_unstable();
                index.dedup();

                let mut hits = vec![false; index.len()];
                let mut remaining = index.len();
                operand.for_each_element(&mut |element| {
                    if let Ok(pos) = index.binary_search(&element) {
                        if !hits[pos] {
                            hits[pos] = true;
                            remaining -= 1;
                        }
                    }
                    if remaining == 0 {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                })?;

                Ok(batch
                    .iter()
                    .map(|element| {
                        index
                            .binary_search(&element)
                            .is_ok_and(|pos| hits[pos])
                    })
                    .collect())
            }
        }
    }
}

impl<T: Element> ChunkedStore<T> {
    /// Returns whether the store holds an element equal to `element`.
    ///
    /// Scans the store from the start; stops at the first match.
    ///
    /// # Errors
    ///
    /// Returns an error if a chunk cannot be read.
    pub fn contains(&self, element: &T) -> CoreResult<bool> {
        for candidate in self.iter() {
            if candidate? == *element {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Returns whether every distinct element of `operand` is in the store.
    ///
    /// [`Operand::Absent`], [`Operand::Itself`] and empty collections are
    /// trivially contained. Distinct argument elements are checked in batches
    /// of at most `membership_budget`, one store scan per batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the store or the operand cannot be read.
    pub fn contains_all<'a>(&self, operand: impl Into<Operand<'a, T>>) -> CoreResult<bool>
    where
        T: 'a,
    {
        let operand = operand.into();
        if matches!(operand, Operand::Absent | Operand::Itself) {
            return Ok(true);
        }

        let budget = self.config.effective_membership_budget().max(1);
        let mut pending = BTreeSet::new();
        let mut outcome: CoreResult<bool> = Ok(true);

        operand.for_each_element(&mut |element| {
            pending.insert(element.clone());
            if pending.len() < budget {
                return ControlFlow::Continue(());
            }
            outcome = self.remove_present(&mut pending);
            match outcome {
                Ok(true) => ControlFlow::Continue(()),
                _ => ControlFlow::Break(()),
            }
        })?;

        match outcome {
            Ok(true) => self.remove_present(&mut pending),
            other => other,
        }
    }

    /// Removes from `pending` every element found in the store. Returns
    /// whether `pending` ended up empty.
    fn remove_present(&self, pending: &mut BTreeSet<T>) -> CoreResult<bool> {
        if pending.is_empty() {
            return Ok(true);
        }
        for element in self.iter() {
            pending.remove(&element?);
            if pending.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Removes every element that is also in `operand`.
    ///
    /// - [`Operand::Absent`] or an empty collection changes nothing
    /// - [`Operand::Itself`] clears the store
    ///
    /// Returns whether at least one element was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing a chunk fails. The store is then
    /// left exactly as it was before the call.
    pub fn remove_all<'a>(&mut self, operand: impl Into<Operand<'a, T>>) -> CoreResult<bool>
    where
        T: 'a,
    {
        let operand = operand.into();
        match operand {
            Operand::Absent => Ok(false),
            Operand::Itself => {
                let changed = !self.is_empty();
                self.clear()?;
                Ok(changed)
            }
            _ if operand.source_len() == 0 => Ok(false),
            _ => self.rewrite(&operand, false),
        }
    }

    /// Keeps only the elements that are also in `operand`.
    ///
    /// - [`Operand::Absent`] and [`Operand::Itself`] change nothing
    /// - an empty collection clears the store
    ///
    /// Returns whether the contents changed.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing a chunk fails. The store is then
    /// left exactly as it was before the call.
    pub fn retain_all<'a>(&mut self, operand: impl Into<Operand<'a, T>>) -> CoreResult<bool>
    where
        T: 'a,
    {
        let operand = operand.into();
        match operand {
            Operand::Absent | Operand::Itself => Ok(false),
            _ if operand.source_len() == 0 => {
                let changed = !self.is_empty();
                self.clear()?;
                Ok(changed)
            }
            _ => self.rewrite(&operand, true),
        }
    }

    /// Returns whether some element's presence in `set` differs from
    /// `keep_present`.
    fn drops_any(&self, set: &BTreeSet<T>, keep_present: bool) -> CoreResult<bool> {
        for element in self.iter() {
            if set.contains(&element?) != keep_present {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Streams the store through a membership test, keeping elements whose
    /// presence in `operand` equals `keep_present`.
    fn rewrite(&mut self, operand: &Operand<'_, T>, keep_present: bool) -> CoreResult<bool> {
        let chunk_size = self.config.chunk_size;
        let membership = Membership::build(operand, self.config.effective_membership_budget())?;
        let streamed = matches!(membership, Membership::Streamed(_));

        // A resident set is cheap to probe, so skip staging when nothing goes
        if let Membership::Resident(set) = &membership {
            if !self.drops_any(set, keep_present)? {
                tracing::debug!(elements = self.len(), "rewrite would remove nothing");
                return Ok(false);
            }
        }

        let layout = {
            let mut builder: LayoutBuilder<'_, T> = self.layout_builder();
            let mut iter = self.iter();
            let mut batch = Vec::with_capacity(chunk_size);
            let mut removed = 0usize;

            loop {
                while batch.len() < chunk_size {
                    match iter.next() {
                        Some(element) => batch.push(element?),
                        None => break,
                    }
                }
                if batch.is_empty() {
                    break;
                }

                let present = membership.test(&batch)?;
                for (element, present) in batch.drain(..).zip(present) {
                    if present == keep_present {
                        builder.push(element)?;
                    } else {
                        removed += 1;
                    }
                }
            }

            tracing::debug!(
                removed,
                kept = builder.len(),
                streamed,
                operation = if keep_present { "retain_all" } else { "remove_all" },
                "rewrote chunked store"
            );

            if removed == 0 {
                return Ok(false);
            }
            builder.finish()
        };

        self.install(layout)?;
        Ok(true)
    }
}
