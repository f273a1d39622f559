//! # xcreport-proto
//!
//! Shared types and error definitions for xcreport.
//!
//! This crate provides the value types that flow between the engine and the
//! command-line front end:
//! - Test and report status enums
//! - The reconciled `Statistics` record
//! - The crate-wide error type

mod error;
mod statistics;
mod status;

pub use error::{Error, Result};
pub use statistics::{Statistics, StatsSource, success_rate};
pub use status::{OverallStatus, TestStatus};
