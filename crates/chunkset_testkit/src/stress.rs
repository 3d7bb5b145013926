//! Stress tests for chunkset.
//!
//! These helpers push large volumes through a store and report throughput.

use crate::generators::collision_key;
use chunkset_core::{ChunkedStore, Config, CoreResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total elements processed.
    pub total_elements: usize,
    /// Elements left in the store afterwards.
    pub remaining_elements: usize,
    /// Total duration.
    pub duration: Duration,
    /// Elements processed per second.
    pub elements_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(total: usize, remaining: usize, duration: Duration) -> Self {
        let elements_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_elements: total,
            remaining_elements: remaining,
            duration,
            elements_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {name} ===");
        println!("Elements processed: {}", self.total_elements);
        println!("Elements remaining: {}", self.remaining_elements);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} elements/sec", self.elements_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of elements to add.
    pub elements: usize,
    /// Elements per chunk.
    pub chunk_size: usize,
    /// Hex digits per generated key; fewer digits mean more duplicates.
    pub key_dimensions: usize,
    /// Seed of the key generator.
    pub seed: u64,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            elements: 100_000,
            chunk_size: 1_000,
            key_dimensions: 6,
            seed: 42,
        }
    }
}

impl StressConfig {
    fn keys(&self) -> impl Iterator<Item = String> + '_ {
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..self.elements).map(move |_| collision_key(rng.gen(), self.key_dimensions))
    }

    fn store(&self) -> CoreResult<ChunkedStore<String>> {
        ChunkedStore::open(Config::new().chunk_size(self.chunk_size))
    }
}

/// Adds `config.elements` keys, then sorts them.
///
/// # Errors
///
/// Returns any error reported by the store.
pub fn stress_sort(config: &StressConfig) -> CoreResult<StressTestResult> {
    let mut store = config.store()?;
    store.add_all(config.keys())?;

    let start = Instant::now();
    store.sort()?;
    let result = StressTestResult::new(config.elements, store.len(), start.elapsed());

    store.close()?;
    Ok(result)
}

/// Adds `config.elements` keys and times the adds alone.
///
/// # Errors
///
/// Returns any error reported by the store.
pub fn stress_sequential_adds(config: &StressConfig) -> CoreResult<StressTestResult> {
    let mut store = config.store()?;

    let start = Instant::now();
    store.add_all(config.keys())?;
    let result = StressTestResult::new(config.elements, store.len(), start.elapsed());

    store.close()?;
    Ok(result)
}

/// Removes every other distinct key from a populated store, with the keys
/// to remove held in a second chunked store.
///
/// # Errors
///
/// Returns any error reported by either store.
pub fn stress_remove_all(config: &StressConfig) -> CoreResult<StressTestResult> {
    let mut store = config.store()?;
    store.add_all(config.keys())?;

    let mut to_remove = config.store()?;
    to_remove.add_all(config.keys().step_by(2))?;

    let start = Instant::now();
    store.remove_all(&to_remove)?;
    let result = StressTestResult::new(config.elements, store.len(), start.elapsed());

    to_remove.close()?;
    store.close()?;
    Ok(result)
}
