//! # xcreport-cli
//!
//! Binary entry point for xcreport.
//!
//! This crate provides:
//! - CLI argument parsing using `clap`
//! - Configuration loading with flag overrides
//! - Preflight checks for the bundle and the Xcode toolchain
//! - Report synthesis and artifact writing
//! - A coloured terminal summary

mod preflight;
mod terminal;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{IsTerminal, stdout};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use xcreport_core::{
    DirectorySource, Report, ReportConfig, ReportWriter, ResultSource, SkippedTestSet,
    Synthesizer, XcrunSource,
};
use xcreport_proto::OverallStatus;

/// Color output mode for terminal display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
    /// Automatically detect if stdout is a TTY
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl ColorMode {
    /// Returns true if colors should be used based on mode and terminal detection.
    fn should_use_colors(self) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => stdout().is_terminal(),
        }
    }
}

/// xcreport - HTML and JSON reports from Xcode result bundles
#[derive(Parser, Debug)]
#[command(name = "xcreport", version, about)]
struct Cli {
    /// Path to the .xcresult bundle
    #[arg(long, value_name = "BUNDLE", required_unless_present = "from_dir")]
    path: Option<PathBuf>,

    /// Where to write the HTML report
    #[arg(short, long, default_value = "report.html")]
    output: PathBuf,

    /// Write the statistics record to this file
    #[arg(long, value_name = "FILE")]
    summary_json: Option<PathBuf>,

    /// Write the full report document to this file
    #[arg(long, value_name = "FILE")]
    report_json: Option<PathBuf>,

    /// Write the summary and detail fragments into this directory
    #[arg(long, value_name = "DIR")]
    fragments_dir: Option<PathBuf>,

    /// Read previously exported JSON records from a directory instead of running xcrun
    #[arg(long, value_name = "DIR", conflicts_with = "path")]
    from_dir: Option<PathBuf>,

    /// Test plan listing skipped tests
    #[arg(long, value_name = "FILE")]
    test_plan: Option<PathBuf>,

    /// Commit used for coverage source links
    #[arg(long, value_name = "SHA")]
    commit: Option<String>,

    /// Leave passing tests out of the detail tables
    #[arg(long)]
    hide_passed_tests: bool,

    /// Leave code coverage out of the report
    #[arg(long)]
    hide_code_coverage: bool,

    /// Exit with status 1 when any test failed
    #[arg(long)]
    fail_on_test_failures: bool,

    /// Skip the bundle and Xcode checks
    #[arg(long)]
    skip_preflight: bool,

    /// Open the HTML report in the default browser
    #[arg(long)]
    open: bool,

    /// Path to configuration file (defaults to xcreport.yml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Color output mode (auto, always, never)
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    color: ColorMode,
}

impl Cli {
    fn apply_overrides(&self, config: &mut ReportConfig) {
        if self.hide_passed_tests {
            config.show_passed_tests = false;
        }
        if self.hide_code_coverage {
            config.show_code_coverage = false;
        }
        if self.fail_on_test_failures {
            config.fail_on_test_failures = true;
        }
        if let Some(plan) = &self.test_plan {
            config.test_plan = Some(plan.clone());
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so the terminal summary owns stdout
    let default_filter = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    colored::control::set_override(cli.color.should_use_colors());

    let exit_code = run(&cli)?;
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<i32> {
    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    let mut config =
        ReportConfig::load(&cwd, cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);

    let source: Box<dyn ResultSource> = match (&cli.from_dir, &cli.path) {
        (Some(dir), _) => Box::new(DirectorySource::new(dir)),
        (None, Some(bundle)) => {
            if cli.skip_preflight {
                debug!("Preflight checks skipped");
            } else {
                let checks = preflight::run(bundle);
                if !checks.iter().all(preflight::Check::passed) {
                    preflight::print_checks(&checks);
                    return Ok(1);
                }
            }
            Box::new(XcrunSource::new(bundle))
        }
        (None, None) => anyhow::bail!("either --path or --from-dir is required"),
    };

    info!("Reading test results from {}", source.label());
    let skip_set = SkippedTestSet::load(config.test_plan.as_deref());
    let report = Synthesizer::new(source.as_ref(), &config)
        .with_commit(cli.commit.clone())
        .synthesize(&skip_set);

    let artifacts = write_artifacts(cli, &report)?;
    terminal::print_summary(&report, &artifacts);

    if cli.open {
        open_report(&cli.output);
    }

    Ok(exit_code(&report, config.fail_on_test_failures))
}

fn write_artifacts(cli: &Cli, report: &Report) -> Result<Vec<PathBuf>> {
    let writer = ReportWriter::new();
    let mut written = vec![
        writer
            .write_html(report, &cli.output)
            .with_context(|| format!("Failed to write {}", cli.output.display()))?,
    ];

    if let Some(path) = &cli.summary_json {
        written.push(
            writer
                .write_statistics(report, path)
                .with_context(|| format!("Failed to write {}", path.display()))?,
        );
    }
    if let Some(path) = &cli.report_json {
        written.push(
            writer
                .write_report_json(report, path)
                .with_context(|| format!("Failed to write {}", path.display()))?,
        );
    }
    if let Some(dir) = &cli.fragments_dir {
        written.extend(
            writer
                .write_fragments(report, dir)
                .with_context(|| format!("Failed to write fragments to {}", dir.display()))?,
        );
    }
    Ok(written)
}

fn open_report(path: &Path) {
    if let Err(err) = open::that(path) {
        warn!("Could not open {}: {}", path.display(), err);
    }
}

fn exit_code(report: &Report, fail_on_test_failures: bool) -> i32 {
    if report.is_degraded() {
        return 1;
    }
    let failed =
        report.overall_status == OverallStatus::Failure || report.statistics.has_failures();
    i32::from(fail_on_test_failures && failed)
}
