//! Model-based property tests for chunked stores.

use chunkset_core::{ChunkedStore, Config, MemoryChunkDirectory};
use chunkset_testkit::prelude::*;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

fn memory_store(chunk_size: usize, membership_budget: usize) -> ChunkedStore<i32> {
    let config = Config::new()
        .chunk_size(chunk_size)
        .membership_budget(membership_budget);
    ChunkedStore::with_directory(config, Box::new(MemoryChunkDirectory::new())).unwrap()
}

fn chunk_lens_are_packed(store: &ChunkedStore<i32>) -> bool {
    store
        .sealed_chunks()
        .iter()
        .all(|chunk| chunk.len() == store.chunk_size())
        && store.active_len() < store.chunk_size()
}

proptest! {
    #![proptest_config(PropTestConfig::default().to_proptest_config())]

    #[test]
    fn store_matches_model(
        chunk_size in chunk_size_strategy(),
        budget in 1..16usize,
        ops in operation_sequence_strategy(1, 40),
    ) {
        let mut store = memory_store(chunk_size, budget);
        let mut model = ReferenceModel::new();

        for op in &ops {
            let expected = model.apply(op);
            let actual = apply_to_store(&mut store, op).unwrap();
            prop_assert_eq!(actual, expected, "result of {:?}", op);
            prop_assert_eq!(store.len(), model.len());
        }
        prop_assert_eq!(collect(&store), model.elements().to_vec());
    }

    #[test]
    fn len_is_sum_of_chunks(
        chunk_size in chunk_size_strategy(),
        ops in operation_sequence_strategy(1, 30),
    ) {
        let mut store = memory_store(chunk_size, chunk_size);
        for op in &ops {
            apply_to_store(&mut store, op).unwrap();
            let sealed: usize = store.sealed_chunks().iter().map(|c| c.len()).sum();
            prop_assert_eq!(store.len(), sealed + store.active_len());
            prop_assert!(store.active_len() < chunk_size);
        }
    }

    #[test]
    fn rewrites_repack_chunks(
        chunk_size in chunk_size_strategy(),
        values in elements_strategy(60),
        remove in elements_strategy(10),
    ) {
        let mut store = memory_store(chunk_size, chunk_size);
        store.add_all(values.iter().copied()).unwrap();

        store.remove_all(&remove).unwrap();
        prop_assert!(chunk_lens_are_packed(&store));

        store.sort().unwrap();
        prop_assert!(chunk_lens_are_packed(&store));
    }

    #[test]
    fn sort_is_strictly_ascending(
        chunk_size in chunk_size_strategy(),
        values in elements_strategy(200),
    ) {
        let mut store = memory_store(chunk_size, chunk_size);
        store.add_all(values.iter().copied()).unwrap();

        let stats = store.sort().unwrap();

        let expected: Vec<i32> = values.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        prop_assert_eq!(collect(&store), expected.clone());
        prop_assert_eq!(stats.input_elements, values.len());
        prop_assert_eq!(stats.output_elements, expected.len());
        prop_assert_eq!(stats.duplicates_removed, values.len() - expected.len());
    }

    #[test]
    fn sort_with_small_fan_in(
        chunk_size in 1..4usize,
        fan_in in 2..4usize,
        keys in prop::collection::vec(collision_key_strategy(2), 0..150),
    ) {
        let config = Config::new().chunk_size(chunk_size).merge_fan_in(fan_in);
        let mut store: ChunkedStore<String> =
            ChunkedStore::with_directory(config, Box::new(MemoryChunkDirectory::new())).unwrap();
        store.add_all(keys.iter().cloned()).unwrap();

        store.sort().unwrap();

        let expected: Vec<String> = keys.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        prop_assert_eq!(collect(&store), expected);
    }

    #[test]
    fn contains_all_matches_model(
        chunk_size in chunk_size_strategy(),
        budget in 1..8usize,
        values in elements_strategy(40),
        probe in elements_strategy(12),
    ) {
        let store = {
            let mut store = memory_store(chunk_size, budget);
            store.add_all(values.iter().copied()).unwrap();
            store
        };
        let mut model = ReferenceModel::new();
        model.apply(&StoreOperation::AddAll(values));

        prop_assert_eq!(store.contains_all(&probe).unwrap(), model.contains_all(&probe));
        for element in &probe {
            prop_assert_eq!(store.contains(element).unwrap(), model.elements().contains(element));
        }
    }

    #[test]
    fn iteration_holds_at_most_one_handle(
        chunk_size in chunk_size_strategy(),
        values in elements_strategy(40),
    ) {
        let directory = Arc::new(MemoryChunkDirectory::new());
        let mut store: ChunkedStore<i32> = ChunkedStore::with_directory(
            Config::new().chunk_size(chunk_size),
            Box::new(Arc::clone(&directory)),
        )
        .unwrap();
        store.add_all(values.iter().copied()).unwrap();

        let mut iter = store.iter();
        while iter.has_next().unwrap() {
            prop_assert!(directory.open_readers() <= 1);
            iter.next_element().unwrap();
        }
        drop(iter);
        prop_assert_eq!(directory.open_readers(), 0);
    }
}

#[test]
fn file_store_keeps_one_file_per_sealed_chunk() {
    init_tracing();
    let mut test_store = TestStore::<i32>::file(3);
    test_store.add_all(0..20).unwrap();
    assert_eq!(test_store.chunk_files().len(), 6);

    test_store.remove_all(&[0, 1, 2, 3, 4, 5, 6]).unwrap();
    assert_eq!(test_store.chunk_files().len(), test_store.sealed_chunks().len());

    test_store.sort().unwrap();
    assert_eq!(test_store.chunk_files().len(), test_store.sealed_chunks().len());

    test_store.clear().unwrap();
    assert!(test_store.chunk_files().is_empty());
}

#[test]
fn collision_keys_sort_strictly_ascending() {
    init_tracing();
    let mut test_store = scenarios::collision_store(10_000, 6, 0xC0FFEE);
    test_store.sort().unwrap();

    let keys = collect(&test_store);
    assert_eq!(keys.len(), test_store.len());
    assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn store_argument_streamed_against_budget() {
    let mut store = memory_store(2, 1);
    store.add_all(1..=6).unwrap();

    let mut argument = memory_store(2, 1);
    argument.add_all([6, 4, 2]).unwrap();

    assert!(store.contains_all(&argument).unwrap());
    assert!(store.remove_all(&argument).unwrap());
    assert_eq!(collect(&store), vec![1, 3, 5]);
    assert!(!store.retain_all(&[1, 3, 5, 7]).unwrap());
}
