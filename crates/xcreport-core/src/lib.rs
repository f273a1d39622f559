//! # xcreport-core
//!
//! Report engine for Xcode result bundles.
//!
//! This crate provides:
//! - Normalization of the bundle's tagged JSON into plain values
//! - Reference resolution through a pluggable `ResultSource`
//! - Flattening of the test hierarchy and statistics reconciliation
//! - Coverage trees with repository links
//! - Report synthesis and HTML/JSON rendering

pub mod config;
pub mod coverage;
mod flatten;
pub mod model;
mod normalize;
pub mod reconcile;
pub mod render;
pub mod report;
mod resolve;
pub mod skip_list;
pub mod source;
pub mod testing;
mod text;

pub use config::{CoverageLinkConfig, ConfigError, DEFAULT_CONFIG_FILE, ReportConfig};
pub use coverage::{CoverageNode, rewrite_path};
pub use flatten::flatten;
pub use model::{FailureSummary, TestCase, TestNode};
pub use normalize::{RawNode, coerce_scalar, normalize};
pub use reconcile::{ReconcileInput, SectionCounts, StatusTally, reconcile};
pub use render::{HtmlRenderer, JsonRenderer, ReportWriter};
pub use report::{Chapter, ClassGroup, Report, Section, Synthesizer};
pub use resolve::{is_empty_record, resolve};
pub use skip_list::{SkipListError, SkippedTestSet};
pub use source::{
    AuthoritativeCounts, DirectorySource, ResultSource, SourceError, XcrunSource,
    fetch_authoritative_counts,
};
pub use text::{anchor_id, escape_html, format_seconds, truncate_with_ellipsis};

/// Crate version, stamped into generated report documents.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
