//! Tessera Performance Benchmarks
//!
//! This crate contains benchmarks for the row engine:
//! - Field access on owned rows (packed, generic and split storage)
//! - View access and materialization
//! - Layout registry interning and draining
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench -p tessera-bench
//! ```

pub mod utils;
