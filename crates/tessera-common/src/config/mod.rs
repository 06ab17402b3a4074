//! Configuration for the tuple engine.
//!
//! This module provides the settings consumed by the layout registry and the
//! transform library.

mod tuple;

pub use tuple::{TupleConfig, TupleConfigBuilder};
