//! Benchmarks for chunkset.
//!
//! The benchmarks live under `benches/`; this library only holds the data
//! generators they share.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
