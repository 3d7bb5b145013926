//! # Chunkset Testkit
//!
//! Test utilities for chunkset.
//!
//! This crate provides:
//! - Store fixtures backed by memory or by a private temporary directory
//! - Property-based test generators using proptest
//! - An in-memory reference model to check stores against
//! - Stress helpers that time large adds, rewrites and sorts
//!
//! ## Usage
//!
//! ```rust
//! use chunkset_testkit::prelude::*;
//!
//! with_file_store::<i32, _, _>(2, |store| {
//!     store.add_all([3, 1, 2]).unwrap();
//!     store.sort().unwrap();
//!     assert_eq!(collect(store), vec![1, 2, 3]);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod model;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::model::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use model::*;
pub use stress::*;
