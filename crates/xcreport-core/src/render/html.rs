//! HTML rendering of a [`Report`].
//!
//! The standalone document embeds two fragments that are also written on
//! their own for check-run consumers:
//! - summary: overall statistics, per-chapter summary and environment
//!   tables, skipped tests
//! - detail: per-section class tables with failure rows, coverage

use crate::coverage::CoverageNode;
use crate::report::{Chapter, Report, Section};
use crate::text::{anchor_id, escape_html, format_seconds, truncate_with_ellipsis};
use xcreport_proto::{Statistics, TestStatus};

/// Character limit check-run summaries and texts accept.
pub const FRAGMENT_CHAR_LIMIT: usize = 65_535;

/// Width of a coverage bar in pixels.
const COVERAGE_BAR_WIDTH: u32 = 200;

const STYLE: &str = r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Helvetica, Arial, sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 1200px;
            margin: 0 auto;
            padding: 20px;
        }
        h1, h2, h3, h4 { margin-top: 1.5em; margin-bottom: 0.5em; }
        .success { color: #28a745; }
        .failure { color: #dc3545; }
        table { border-collapse: collapse; width: 100%; margin-bottom: 20px; }
        th, td { text-align: left; padding: 8px; border-bottom: 1px solid #ddd; }
        th { background-color: #f5f5f5; }
        tr:hover { background-color: #f5f5f5; }
        code {
            background-color: #f5f5f5;
            padding: 2px 4px;
            border-radius: 3px;
            font-family: SFMono-Regular, Consolas, "Liberation Mono", Menlo, monospace;
        }
"#;

/// Renders reports as HTML.
#[derive(Debug, Default)]
pub struct HtmlRenderer;

impl HtmlRenderer {
    pub fn new() -> Self {
        Self
    }

    /// The complete standalone document.
    pub fn document(&self, report: &Report) -> String {
        let title = escape_html(&report.title);
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("    <meta charset=\"UTF-8\">\n");
        html.push_str(
            "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );
        html.push_str(&format!("    <title>{}</title>\n", title));
        html.push_str(&format!("    <style>{}    </style>\n", STYLE));
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!("<h1>{}</h1>\n", title));
        html.push_str(&format!(
            "<p>Results from {}</p>\n",
            escape_html(&report.source_label)
        ));
        html.push_str(&self.summary(report));
        html.push('\n');
        html.push_str(&self.detail(report));
        html.push_str("\n</body>\n</html>\n");
        html
    }

    /// Summary fragment, capped at [`FRAGMENT_CHAR_LIMIT`].
    pub fn summary_fragment(&self, report: &Report) -> String {
        truncate_with_ellipsis(&self.summary(report), FRAGMENT_CHAR_LIMIT)
    }

    /// Detail fragment, capped at [`FRAGMENT_CHAR_LIMIT`].
    pub fn detail_fragment(&self, report: &Report) -> String {
        truncate_with_ellipsis(&self.detail(report), FRAGMENT_CHAR_LIMIT)
    }

    fn summary(&self, report: &Report) -> String {
        let mut html = String::new();
        if let Some(error) = &report.error {
            html.push_str("<h1>Error Formatting Test Results</h1>\n");
            html.push_str(&format!("<p>{}</p>\n", escape_html(error)));
            return html;
        }

        html.push_str("<h2>Summary</h2>\n");
        write_overall_table(&mut html, &report.statistics);

        for chapter in &report.chapters {
            html.push_str(&format!("<h2>{}</h2>\n", escape_html(&chapter.title)));
            write_chapter_table(&mut html, &chapter.statistics);
            write_environment(&mut html, chapter);
        }

        if !report.skipped_tests.is_empty() {
            write_skipped_tests(&mut html, &report.skipped_tests);
        }
        html
    }

    fn detail(&self, report: &Report) -> String {
        let mut html = String::new();
        if report.is_degraded() {
            return html;
        }
        for chapter in &report.chapters {
            html.push_str("<h2>Test Details</h2>\n");
            for section in &chapter.sections {
                write_section(&mut html, section, report.show_passed_tests);
            }
        }
        if let Some(coverage) = &report.code_coverage {
            write_coverage(&mut html, coverage);
        }
        html
    }
}

fn write_overall_table(html: &mut String, stats: &Statistics) {
    html.push_str("<table>\n<tr>");
    for header in [
        "Total",
        "Passed",
        "Failed",
        "Skipped",
        "Expected Failures",
        "Success Rate",
        "Duration",
    ] {
        html.push_str(&format!("<th>{}</th>", header));
    }
    html.push_str("</tr>\n<tr>");
    html.push_str(&format!(
        "<td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.1}%</td><td>{}</td>",
        stats.total,
        stats.passed,
        stats.failed,
        stats.skipped,
        stats.expected_failures,
        stats.success_rate_percent,
        format_seconds(stats.duration_seconds)
    ));
    html.push_str("</tr>\n</table>\n");
}

fn write_chapter_table(html: &mut String, stats: &Statistics) {
    html.push_str("<table>\n<tr>");
    for header in ["Total", "Passed", "Failed", "Skipped", "Expected Failures", "Duration"] {
        html.push_str(&format!("<th>{}</th>", header));
    }
    html.push_str("</tr>\n<tr>");
    html.push_str(&format!(
        "<td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>",
        stats.total,
        stats.passed,
        stats.failed,
        stats.skipped,
        stats.expected_failures,
        format_seconds(stats.duration_seconds)
    ));
    html.push_str("</tr>\n</table>\n");
}

fn write_environment(html: &mut String, chapter: &Chapter) {
    let destination = &chapter.run_destination;
    let Some(architecture) = destination.target_architecture.as_deref() else {
        return;
    };
    html.push_str("<h3>Test Environment</h3>\n<table>\n");
    if let Some(device) = &destination.target_device_record {
        if let Some(model) = device.model_name.as_deref() {
            write_row(html, "Device", model);
        }
        if let Some(os) = device.operating_system_version.as_deref() {
            write_row(html, "OS Version", os);
        }
    }
    write_row(html, "Architecture", architecture);
    html.push_str("</table>\n");
}

fn write_row(html: &mut String, header: &str, value: &str) {
    html.push_str(&format!(
        "<tr><th>{}</th><td>{}</td></tr>\n",
        header,
        escape_html(value)
    ));
}

fn write_skipped_tests(html: &mut String, skipped: &[String]) {
    html.push_str("<h2>Skipped Tests</h2>\n<table>\n");
    for name in skipped {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            TestStatus::Skipped.icon(),
            escape_html(name),
            format_seconds(0.0)
        ));
    }
    html.push_str("</table>\n");
}

fn write_section(html: &mut String, section: &Section, show_passed_tests: bool) {
    html.push_str(&format!("<h3>{}</h3>\n", escape_html(&section.name)));
    for group in section.class_groups(show_passed_tests) {
        let class_id = anchor_id(&format!("{}-{}", section.name, group.name));
        html.push_str(&format!(
            "<h4 id=\"{}\">{}</h4>\n<table>\n",
            class_id,
            escape_html(group.name)
        ));
        for case in group.cases {
            html.push_str(&format!(
                "<tr id=\"{}\"><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                anchor_id(&format!("{}-{}", class_id, case.display_name())),
                case.test_status.icon(),
                escape_html(case.display_name()),
                format_seconds(case.duration)
            ));
            if case.test_status != TestStatus::Failure {
                continue;
            }
            for failure in &case.failure_summaries {
                html.push_str("<tr><td></td><td colspan=\"2\"><div class=\"failure\">");
                html.push_str(&format!(
                    "<strong>Failure:</strong> {}<br><code>{}</code>",
                    escape_html(failure.message()),
                    escape_html(&failure.location())
                ));
                html.push_str("</div></td></tr>\n");
            }
        }
        html.push_str("</table>\n");
    }
}

fn write_coverage(html: &mut String, root: &CoverageNode) {
    if !root.is_renderable() {
        return;
    }
    html.push_str("<h2>Code Coverage</h2>\n<table>\n<tr>");
    html.push_str("<th>Target</th><th colspan=\"2\">Coverage</th><th>Covered</th><th>Executable</th>");
    html.push_str("</tr>\n");
    write_coverage_row(html, root, "Total".to_string());
    for target in root.renderable_children() {
        write_coverage_row(html, target, escape_html(&target.name));
        for file in target.renderable_children() {
            let label = match file.href() {
                Some(href) => format!(
                    "&nbsp;&nbsp;<a href=\"{}\">{}</a>",
                    escape_html(href),
                    escape_html(&file.name)
                ),
                None => format!("&nbsp;&nbsp;{}", escape_html(&file.name)),
            };
            write_coverage_row(html, file, label);
        }
    }
    html.push_str("</table>\n");
}

fn write_coverage_row(html: &mut String, node: &CoverageNode, label: String) {
    let percent = node.line_coverage_percent.clamp(0.0, 100.0);
    let covered_width = (f64::from(COVERAGE_BAR_WIDTH) * percent / 100.0) as u32;
    let uncovered_width = COVERAGE_BAR_WIDTH - covered_width;
    html.push_str(&format!("<tr><td>{}</td><td>", label));
    html.push_str(&format!(
        "<span style=\"display:inline-block;width:{}px;height:12px;background-color:#28a745\"></span>",
        covered_width
    ));
    html.push_str(&format!(
        "<span style=\"display:inline-block;width:{}px;height:12px;background-color:#dc3545\"></span>",
        uncovered_width
    ));
    html.push_str(&format!(
        "</td><td>{:.2}%</td><td>{}</td><td>{}</td></tr>\n",
        node.line_coverage_percent, node.covered_lines, node.executable_lines
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use crate::report::Synthesizer;
    use crate::skip_list::SkippedTestSet;
    use crate::testing::fixtures::SampleBundle;

    fn sample_report(config: &ReportConfig) -> Report {
        let source = SampleBundle::new().source();
        Synthesizer::new(&source, config)
            .with_commit(Some("abc123".to_string()))
            .synthesize(&SkippedTestSet::default())
    }

    #[test]
    fn test_document_contains_summary_and_details() {
        let html = HtmlRenderer::new().document(&sample_report(&ReportConfig::default()));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Xcode Test Results</title>"));
        assert!(html.contains("<h2>Test swift-sdk</h2>"));
        assert!(html.contains("<th>Device</th><td>iPhone 15</td>"));
        assert!(html.contains("<th>Architecture</th><td>arm64</td>"));
        assert!(html.contains("<h3>UnitTests</h3>"));
    }

    #[test]
    fn test_failure_rows_show_location() {
        let detail = HtmlRenderer::new().detail_fragment(&sample_report(&ReportConfig::default()));
        assert!(detail.contains("<strong>Failure:</strong> assert false<br><code>A.swift:12</code>"));
        assert!(detail.contains(
            "<strong>Failure:</strong> timed out waiting for response<br><code>Unknown location</code>"
        ));
    }

    #[test]
    fn test_detail_order_is_sorted_and_deterministic() {
        let config = ReportConfig::default();
        let first = HtmlRenderer::new().detail_fragment(&sample_report(&config));
        let second = HtmlRenderer::new().detail_fragment(&sample_report(&config));
        assert_eq!(first, second);

        let api = first.find(">ApiTests</h4>").unwrap();
        let auth = first.find(">AuthTests</h4>").unwrap();
        assert!(api < auth);

        let fetch = first.find(">testFetch()<").unwrap();
        let legacy = first.find(">testLegacy()<").unwrap();
        let retry = first.find(">testRetry()<").unwrap();
        assert!(fetch < legacy && legacy < retry);
    }

    #[test]
    fn test_hidden_passed_tests_keep_statistics() {
        let config = ReportConfig {
            show_passed_tests: false,
            ..ReportConfig::default()
        };
        let report = sample_report(&config);
        let renderer = HtmlRenderer::new();
        let detail = renderer.detail_fragment(&report);
        assert!(!detail.contains(">testLogin()<"));
        assert!(!detail.contains(">testFetch()<"));
        assert!(detail.contains(">testLogout()<"));
        assert!(renderer.summary_fragment(&report).contains("<td>5</td><td>2</td><td>2</td>"));
    }

    #[test]
    fn test_zero_executable_coverage_nodes_not_rendered() {
        let detail = HtmlRenderer::new().detail_fragment(&sample_report(&ReportConfig::default()));
        assert!(detail.contains("<h2>Code Coverage</h2>"));
        assert!(detail.contains("IterableAPI.swift"));
        assert!(detail.contains(
            "https://github.com/Iterable/swift-sdk/blob/abc123/swift-sdk/SDK/IterableAPI.swift"
        ));
        assert!(!detail.contains("Constants.swift"));
        assert!(!detail.contains("EmptyHeaders.framework"));
    }

    #[test]
    fn test_zero_executable_coverage_root_not_rendered() {
        let mut report = sample_report(&ReportConfig::default());
        let root = report.code_coverage.as_mut().unwrap();
        root.covered_lines = 0;
        root.executable_lines = 0;
        assert!(root.children.iter().any(CoverageNode::is_renderable));

        let renderer = HtmlRenderer::new();
        assert!(!renderer.detail_fragment(&report).contains("<h2>Code Coverage</h2>"));
        let document = renderer.document(&report);
        assert!(!document.contains("<h2>Code Coverage</h2>"));
        assert!(!document.contains("IterableAPI.swift"));
        assert!(document.contains("<h2>Test Details</h2>"));
    }

    #[test]
    fn test_skipped_tests_table() {
        let mut report = sample_report(&ReportConfig::default());
        report.skipped_tests = vec!["ATests/testOld".to_string(), "BTests/testOlder".to_string()];
        let summary = HtmlRenderer::new().summary_fragment(&report);
        assert!(summary.contains("<h2>Skipped Tests</h2>"));
        assert!(summary.contains("<td>⏩</td><td>ATests/testOld</td><td>0.00s</td>"));
    }

    #[test]
    fn test_degraded_report_renders_error_only() {
        let report = Report::degraded("Xcode Test Results", "bundle", "root record <broken>");
        let renderer = HtmlRenderer::new();
        let summary = renderer.summary_fragment(&report);
        assert!(summary.contains("<h1>Error Formatting Test Results</h1>"));
        assert!(summary.contains("root record &lt;broken&gt;"));
        assert!(renderer.detail_fragment(&report).is_empty());
        assert!(renderer.document(&report).contains("Error Formatting Test Results"));
    }

    #[test]
    fn test_fragments_are_capped() {
        let mut report = sample_report(&ReportConfig::default());
        report.skipped_tests = (0..5_000).map(|i| format!("Suite/testNumber{i}")).collect();
        let summary = HtmlRenderer::new().summary_fragment(&report);
        assert_eq!(summary.chars().count(), FRAGMENT_CHAR_LIMIT);
        assert!(summary.ends_with("..."));
    }
}
