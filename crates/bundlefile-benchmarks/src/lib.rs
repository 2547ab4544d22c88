//! bundlefile benchmarking suite
//!
//! Benchmarks for document decoding, version selection and the full
//! resolution of generated bundle graphs.

pub mod common;

pub use common::*;
