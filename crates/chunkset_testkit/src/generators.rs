//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random elements, chunk sizes and
//! operation sequences for chunked stores.

use proptest::prelude::*;

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Builds a high-collision key from the low `4 * dimensions` bits of `r`.
///
/// Keys look like `random@line.constant.prefix{3,F,0}`; with `dimensions`
/// hex digits at most `16^dimensions` distinct keys exist.
#[must_use]
pub fn collision_key(mut r: u32, dimensions: usize) -> String {
    let mut key = String::with_capacity(32 + 2 * dimensions);
    key.push_str("random@line.constant.prefix{");
    for j in 0..dimensions {
        if j > 0 {
            key.push(',');
        }
        key.push(char::from(HEX[(r & 15) as usize]));
        r >>= 4;
    }
    key.push('}');
    key
}

/// Strategy for elements drawn from a small range, so that duplicates and
/// matches between collections are common.
pub fn element_strategy() -> impl Strategy<Value = i32> {
    -20..20i32
}

/// Strategy for a batch of elements.
pub fn elements_strategy(max_len: usize) -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(element_strategy(), 0..max_len)
}

/// Strategy for chunk sizes small enough to cross many chunk boundaries.
pub fn chunk_size_strategy() -> impl Strategy<Value = usize> {
    1..8usize
}

/// Strategy for high-collision string keys.
pub fn collision_key_strategy(dimensions: usize) -> impl Strategy<Value = String> {
    any::<u32>().prop_map(move |r| collision_key(r, dimensions))
}

/// An operation on a chunked store.
#[derive(Debug, Clone)]
pub enum StoreOperation {
    /// Append one element
    Add(i32),
    /// Append several elements
    AddAll(Vec<i32>),
    /// Remove everything
    Clear,
    /// Remove the elements of a collection
    RemoveAll(Vec<i32>),
    /// Keep only the elements of a collection
    RetainAll(Vec<i32>),
    /// Remove the store from itself
    RemoveItself,
    /// Retain the store within itself
    RetainItself,
    /// Sort and deduplicate
    Sort,
}

/// Strategy for generating store operations.
pub fn store_operation_strategy() -> impl Strategy<Value = StoreOperation> {
    prop_oneof![
        4 => element_strategy().prop_map(StoreOperation::Add),
        3 => elements_strategy(16).prop_map(StoreOperation::AddAll),
        1 => Just(StoreOperation::Clear),
        3 => elements_strategy(8).prop_map(StoreOperation::RemoveAll),
        2 => elements_strategy(24).prop_map(StoreOperation::RetainAll),
        1 => Just(StoreOperation::RemoveItself),
        1 => Just(StoreOperation::RetainItself),
        2 => Just(StoreOperation::Sort),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StoreOperation>> {
    prop::collection::vec(store_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
