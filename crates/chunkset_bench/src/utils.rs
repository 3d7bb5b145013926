//! Benchmark utilities.

use chunkset_core::{ChunkedStore, Config, Element};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Generate `count` random integers in `0..range`.
pub fn random_integers(count: usize, range: u64, seed: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| rng.gen_range(0..range)).collect()
}

/// Generate `count` hex keys with `dimensions` digits each.
pub fn random_keys(count: usize, dimensions: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let mut r: u32 = rng.gen();
            let digits: Vec<String> = (0..dimensions)
                .map(|_| {
                    let digit = char::from(HEX[(r & 15) as usize]);
                    r >>= 4;
                    digit.to_string()
                })
                .collect();
            format!("random@line.constant.prefix{{{}}}", digits.join(","))
        })
        .collect()
}

/// Create a file-backed store in a fresh temporary directory, removed
/// together with the store.
pub fn file_store<T: Element>(chunk_size: usize) -> ChunkedStore<T> {
    file_store_with(Config::new().chunk_size(chunk_size))
}

/// Create a file-backed store from `config`.
pub fn file_store_with<T: Element>(config: Config) -> ChunkedStore<T> {
    ChunkedStore::open(config).unwrap()
}
