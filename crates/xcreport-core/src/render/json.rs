//! Machine-readable output.

use crate::report::Report;
use chrono::{DateTime, Utc};
use serde::Serialize;
use xcreport_proto::{Result, Statistics};

/// Full report document with generation metadata.
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub generated_at: DateTime<Utc>,
    pub xcreport_version: &'static str,
    #[serde(flatten)]
    pub report: &'a Report,
}

/// Renders reports as JSON.
#[derive(Debug, Default)]
pub struct JsonRenderer;

impl JsonRenderer {
    pub fn new() -> Self {
        Self
    }

    /// The flat statistics record check-run scripts read.
    pub fn statistics(&self, report: &Report) -> Result<String> {
        Ok(serde_json::to_string_pretty(&report.statistics)?)
    }

    /// The whole report model, stamped with the current time.
    pub fn report(&self, report: &Report) -> Result<String> {
        self.report_at(report, Utc::now())
    }

    pub fn report_at(&self, report: &Report, generated_at: DateTime<Utc>) -> Result<String> {
        let document = ReportDocument {
            generated_at,
            xcreport_version: crate::VERSION,
            report,
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }
}

/// Parses a statistics record written by [`JsonRenderer::statistics`].
pub fn parse_statistics(json: &str) -> Result<Statistics> {
    Ok(serde_json::from_str(json)?)
}
