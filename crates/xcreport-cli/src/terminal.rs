//! Coloured terminal summary of a synthesized report.

use colored::Colorize;
use std::fmt::Write as _;
use std::path::PathBuf;
use xcreport_core::{Report, format_seconds, truncate_with_ellipsis};
use xcreport_proto::OverallStatus;

/// Failure messages longer than this are shortened in the terminal.
const MESSAGE_WIDTH: usize = 120;

/// Prints the outcome of a run to stdout.
pub fn print_summary(report: &Report, artifacts: &[PathBuf]) {
    print!("{}", render_summary(report, artifacts));
}

/// The terminal summary: verdict, counts, failing tests and written files.
pub fn render_summary(report: &Report, artifacts: &[PathBuf]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "━".repeat(40).dimmed());

    if let Some(error) = &report.error {
        let _ = writeln!(
            out,
            "{} {}",
            "Error formatting test results:".red().bold(),
            error
        );
    } else {
        render_statistics(&mut out, report);
        render_failures(&mut out, report);
    }

    if !artifacts.is_empty() {
        let _ = writeln!(out);
        for path in artifacts {
            let _ = writeln!(
                out,
                "{}",
                format!("Report written: {}", path.display()).dimmed()
            );
        }
    }
    out
}

fn render_statistics(out: &mut String, report: &Report) {
    let stats = &report.statistics;
    let (emoji, verdict, color) = match report.overall_status {
        OverallStatus::Success => ("🟢", "PASSED", colored::Color::Green),
        OverallStatus::Failure => ("🔴", "FAILED", colored::Color::Red),
        OverallStatus::Neutral => ("⚪", "NO TESTS", colored::Color::White),
    };

    let headline = format!("{verdict}: {} of {} tests", stats.passed, stats.total);
    let _ = writeln!(out, "{emoji} {}", headline.color(color).bold());

    let mut parts = vec![];
    if stats.passed > 0 {
        parts.push(format!("{} passed", stats.passed).green().to_string());
    }
    if stats.failed > 0 {
        parts.push(format!("{} failed", stats.failed).red().to_string());
    }
    if stats.skipped > 0 {
        parts.push(format!("{} skipped", stats.skipped).dimmed().to_string());
    }
    if !parts.is_empty() {
        let _ = writeln!(out, "   {}", parts.join(", "));
    }

    let _ = writeln!(
        out,
        "   {}",
        format!(
            "Success rate {:.1}% in {}",
            stats.success_rate_percent,
            format_seconds(stats.duration_seconds)
        )
        .dimmed()
    );
}

fn render_failures(out: &mut String, report: &Report) {
    let failures: Vec<_> = report.failed_cases().collect();
    if failures.is_empty() {
        return;
    }

    let _ = writeln!(out, "\n{}", "Failed Tests:".red().bold());
    for (_, section, case) in &failures {
        let _ = writeln!(
            out,
            "  ❌ {}/{}/{}",
            section.name,
            case.class_name(),
            case.display_name()
        );
        for failure in &case.failure_summaries {
            let _ = writeln!(
                out,
                "     {} {}",
                truncate_with_ellipsis(failure.message(), MESSAGE_WIDTH),
                format!("({})", failure.location()).dimmed()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xcreport_core::testing::SampleBundle;
    use xcreport_core::{ReportConfig, SkippedTestSet, Synthesizer};

    fn sample_report() -> Report {
        let source = SampleBundle::new().source();
        Synthesizer::new(&source, &ReportConfig::default()).synthesize(&SkippedTestSet::default())
    }

    #[test]
    fn test_render_lists_failures_with_locations() {
        let text = render_summary(&sample_report(), &[]);

        assert!(text.contains("FAILED"));
        assert!(text.contains("2 failed"));
        assert!(text.contains("UnitTests/AuthTests/testLogout"));
        assert!(text.contains("assert false"));
        assert!(text.contains("A.swift:12"));
        assert!(text.contains("Unknown location"));
    }

    #[test]
    fn test_render_lists_failures_in_tree_order() {
        let text = render_summary(&sample_report(), &[]);
        let logout = text.find("AuthTests/testLogout").unwrap();
        let retry = text.find("ApiTests/testRetry").unwrap();
        assert!(logout < retry);
        assert!(text.contains("timed out waiting for response"));
    }

    #[test]
    fn test_render_degraded_report() {
        let report = Report::degraded("Xcode Test Results", "bundle", "tests record malformed");
        let text = render_summary(&report, &[PathBuf::from("out/report.html")]);

        assert!(text.contains("Error formatting test results:"));
        assert!(text.contains("tests record malformed"));
        assert!(text.contains("Report written: out/report.html"));
        assert!(!text.contains("Failed Tests:"));
    }
}
