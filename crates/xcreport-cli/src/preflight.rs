//! Checks run before reading a result bundle through `xcrun`.

use colored::Colorize;
use regex::Regex;
use std::path::Path;
use std::process::Command;

/// Oldest Xcode whose `xcresulttool` understands the commands we issue.
pub const MIN_XCODE_MAJOR: u32 = 16;

/// Outcome of one check. `problem` is set when it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: &'static str,
    pub subject: String,
    pub problem: Option<String>,
}

impl Check {
    fn ok(name: &'static str, subject: impl Into<String>) -> Self {
        Self {
            name,
            subject: subject.into(),
            problem: None,
        }
    }

    fn failed(name: &'static str, subject: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            name,
            subject: subject.into(),
            problem: Some(problem.into()),
        }
    }

    pub fn passed(&self) -> bool {
        self.problem.is_none()
    }
}

/// Runs every check against `bundle`.
pub fn run(bundle: &Path) -> Vec<Check> {
    vec![check_bundle(bundle), check_xcode()]
}

/// The bundle must be an existing `.xcresult` directory.
pub fn check_bundle(bundle: &Path) -> Check {
    let subject = bundle.display().to_string();
    if !bundle.exists() {
        return Check::failed("bundle", subject, "Result bundle does not exist");
    }
    if !bundle.is_dir() {
        return Check::failed("bundle", subject, "Result bundle is not a directory");
    }
    let has_extension = bundle
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xcresult"));
    if !has_extension {
        return Check::failed("bundle", subject, "Expected a path ending in .xcresult");
    }
    Check::ok("bundle", subject)
}

fn check_xcode() -> Check {
    match Command::new("xcodebuild").arg("-version").output() {
        Ok(output) if output.status.success() => {
            evaluate_xcode_version(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => Check::failed(
            "xcode",
            "xcodebuild -version",
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ),
        Err(err) => Check::failed(
            "xcode",
            "xcodebuild -version",
            format!("Could not run xcodebuild: {err}"),
        ),
    }
}

/// Judges `xcodebuild -version` output. Unparseable output fails the check.
pub fn evaluate_xcode_version(output: &str) -> Check {
    match parse_xcode_version(output) {
        Some((major, minor)) if major >= MIN_XCODE_MAJOR => {
            Check::ok("xcode", format!("Xcode {major}.{minor}"))
        }
        Some((major, minor)) => Check::failed(
            "xcode",
            format!("Xcode {major}.{minor}"),
            format!("Xcode {MIN_XCODE_MAJOR} or newer is required"),
        ),
        None => Check::failed(
            "xcode",
            "xcodebuild -version",
            "Could not determine Xcode version from output",
        ),
    }
}

/// Extracts `(major, minor)` from text like `Xcode 16.2\nBuild version 16C5032a`.
pub fn parse_xcode_version(output: &str) -> Option<(u32, u32)> {
    let re = Regex::new(r"Xcode (\d+)\.(\d+)").ok()?;
    let caps = re.captures(output)?;
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2)?.as_str().parse().ok()?;
    Some((major, minor))
}

/// One line per check, with the problem indented under failures.
pub fn print_checks(checks: &[Check]) {
    println!("Preflight checks");
    for check in checks {
        let status = if check.passed() {
            "OK  ".green()
        } else {
            "FAIL".red()
        };
        println!("  {status} {:<6} {}", check.name, check.subject);
        if let Some(problem) = &check.problem {
            println!("       {problem}");
        }
    }
}
