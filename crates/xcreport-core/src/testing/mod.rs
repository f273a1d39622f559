//! Testing utilities for deterministic report tests.

pub mod fixtures;
pub mod static_source;

pub use fixtures::SampleBundle;
pub use static_source::{FetchRecord, StaticSource};
