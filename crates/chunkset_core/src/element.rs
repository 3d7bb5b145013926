//! Element capability set.

use chunkset_codec::{Decode, Encode};

/// Values that can be stored in a [`crate::ChunkedStore`].
///
/// An element must round-trip through its codec and carry a total order.
/// Equality is assumed to agree with the order: if `a.cmp(b)` is `Equal`
/// then `a == b`. Sorting relies on this to drop duplicates.
///
/// The trait is implemented for every type that satisfies the bounds.
pub trait Element: Encode + Decode + Ord + Clone {}

impl<T> Element for T where T: Encode + Decode + Ord + Clone {}
