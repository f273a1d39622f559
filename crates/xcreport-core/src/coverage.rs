//! Code coverage export → coverage tree with repository links.
//!
//! The export (`xccov view --report --json`) is a three-level document:
//! totals, `targets[]`, and `targets[].files[]`. File paths in it are absolute
//! and machine-specific; [`rewrite_path`] turns them into repository-relative
//! paths so they can be linked.

use crate::config::CoverageLinkConfig;
use crate::model::count_value;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use tracing::debug;
use xcreport_proto::{Error, Result};

/// One node of the coverage tree: the total, a target, or a file.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CoverageNode {
    pub name: String,
    /// Absolute path as exported (files only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Repository-relative path (files only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<String>,
    /// Browsable source link, when a commit was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub covered_lines: u64,
    pub executable_lines: u64,
    pub line_coverage_percent: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CoverageNode>,
}

impl CoverageNode {
    fn new(name: impl Into<String>, covered_lines: u64, executable_lines: u64) -> Self {
        Self {
            name: name.into(),
            covered_lines,
            executable_lines,
            line_coverage_percent: line_coverage_percent(covered_lines, executable_lines),
            ..Self::default()
        }
    }

    /// Nodes without executable lines stay in the tree but are never
    /// rendered.
    pub fn is_renderable(&self) -> bool {
        self.executable_lines > 0
    }

    /// Renderable children ordered by name, case-insensitively.
    pub fn renderable_children(&self) -> Vec<&CoverageNode> {
        let mut children: Vec<&CoverageNode> =
            self.children.iter().filter(|c| c.is_renderable()).collect();
        children.sort_by(|a, b| compare_names(&a.name, &b.name));
        children
    }

    /// Where a file row points: the link when known, else the raw path.
    pub fn href(&self) -> Option<&str> {
        self.link.as_deref().or(self.path.as_deref())
    }
}

/// `covered / executable * 100`, or 0 without executable lines.
pub fn line_coverage_percent(covered: u64, executable: u64) -> f64 {
    if executable == 0 {
        return 0.0;
    }
    covered as f64 / executable as f64 * 100.0
}

/// Case-insensitive ascending order, ties broken by the exact name so the
/// order is total.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Parses a raw coverage export into a tree.
pub fn transform(
    raw: &str,
    links: &CoverageLinkConfig,
    commit: Option<&str>,
) -> Result<CoverageNode> {
    let export: Value = serde_json::from_str(raw)?;
    if !export.is_object() {
        return Err(Error::Shape("coverage export is not an object".to_string()));
    }
    Ok(transform_value(&export, links, commit))
}

/// Builds the tree from an already parsed export.
pub fn transform_value(
    export: &Value,
    links: &CoverageLinkConfig,
    commit: Option<&str>,
) -> CoverageNode {
    let commit = commit.map(str::trim).filter(|c| !c.is_empty());
    let mut root = counted_node("Total", export);
    root.children = children_of(export, "targets")
        .map(|target| {
            let mut node = counted_node(name_of(target), target);
            node.children = children_of(target, "files")
                .map(|file| file_node(file, links, commit))
                .collect();
            node
        })
        .collect();
    debug!(
        "Coverage: {}/{} lines across {} targets",
        root.covered_lines,
        root.executable_lines,
        root.children.len()
    );
    root
}

fn file_node(file: &Value, links: &CoverageLinkConfig, commit: Option<&str>) -> CoverageNode {
    let mut node = counted_node(name_of(file), file);
    if let Some(path) = file.get("path").and_then(Value::as_str) {
        let relative = rewrite_path(path, links);
        node.link = commit.map(|commit| source_link(&links.repository_url, commit, &relative));
        node.path = Some(path.to_string());
        node.relative_path = Some(relative);
    }
    node
}

fn counted_node(name: &str, value: &Value) -> CoverageNode {
    let lines = |key: &str| value.get(key).and_then(count_value).unwrap_or(0);
    CoverageNode::new(name, lines("coveredLines"), lines("executableLines"))
}

fn name_of(value: &Value) -> &str {
    value
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
}

fn children_of<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|child| child.is_object())
}

/// Rewrites an absolute file path into a repository-relative one.
///
/// A configured CI prefix is stripped when present. Otherwise everything up
/// to and including the first segment matching the root marker
/// (case-insensitively) is dropped. Known segments are then restored to
/// their canonical casing and spaces are percent-encoded.
pub fn rewrite_path(path: &str, links: &CoverageLinkConfig) -> String {
    let stripped = links
        .ci_prefixes
        .iter()
        .filter(|prefix| !prefix.is_empty())
        .find_map(|prefix| path.strip_prefix(prefix.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| after_marker(path, &links.repo_root_marker));

    stripped
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| canonical_segment(segment, &links.canonical_segments))
        .collect::<Vec<_>>()
        .join("/")
        .replace(' ', "%20")
}

fn after_marker(path: &str, marker: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    match segments
        .iter()
        .position(|segment| !marker.is_empty() && segment.eq_ignore_ascii_case(marker))
    {
        Some(index) => segments[index + 1..].join("/"),
        None => path.to_string(),
    }
}

fn canonical_segment<'a>(segment: &'a str, canonical: &'a [String]) -> &'a str {
    canonical
        .iter()
        .find(|known| known.eq_ignore_ascii_case(segment))
        .map_or(segment, String::as_str)
}

/// `{repository_url}/blob/{commit}/{relative_path}`.
pub fn source_link(repository_url: &str, commit: &str, relative_path: &str) -> String {
    format!(
        "{}/blob/{}/{}",
        repository_url.trim_end_matches('/'),
        commit,
        relative_path
    )
}
