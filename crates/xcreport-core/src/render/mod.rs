//! Output artifacts derived from a [`Report`].
//!
//! - `HtmlRenderer`: standalone document and check-run fragments
//! - `JsonRenderer`: statistics record and full report document
//! - `ReportWriter`: writes any of the above to disk

pub mod html;
pub mod json;

pub use html::{FRAGMENT_CHAR_LIMIT, HtmlRenderer};
pub use json::{JsonRenderer, ReportDocument, parse_statistics};

use crate::report::Report;
use std::path::{Path, PathBuf};
use tracing::debug;
use xcreport_proto::Result;

/// File name of the summary fragment.
pub const SUMMARY_FRAGMENT: &str = "report-summary.html";

/// File name of the detail fragment.
pub const DETAIL_FRAGMENT: &str = "report-detail.html";

/// Writes rendered artifacts, creating parent directories as needed.
#[derive(Debug, Default)]
pub struct ReportWriter {
    html: HtmlRenderer,
    json: JsonRenderer,
}

impl ReportWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the standalone HTML document.
    pub fn write_html(&self, report: &Report, path: &Path) -> Result<PathBuf> {
        write_file(path, &self.html.document(report))
    }

    /// Writes both fragments into `dir`.
    pub fn write_fragments(&self, report: &Report, dir: &Path) -> Result<Vec<PathBuf>> {
        Ok(vec![
            write_file(&dir.join(SUMMARY_FRAGMENT), &self.html.summary_fragment(report))?,
            write_file(&dir.join(DETAIL_FRAGMENT), &self.html.detail_fragment(report))?,
        ])
    }

    /// Writes the statistics record.
    pub fn write_statistics(&self, report: &Report, path: &Path) -> Result<PathBuf> {
        write_file(path, &self.json.statistics(report)?)
    }

    /// Writes the full report document.
    pub fn write_report_json(&self, report: &Report, path: &Path) -> Result<PathBuf> {
        write_file(path, &self.json.report(report)?)
    }
}

fn write_file(path: &Path, content: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    debug!("Wrote {} ({} bytes)", path.display(), content.len());
    Ok(path.to_path_buf())
}
