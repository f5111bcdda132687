//! Location-bound findings parsed from check tool output

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Severity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// A structured finding bound to a source location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// File the finding is in
    pub path: String,

    /// 1-indexed line
    pub line: u32,

    /// 1-indexed column, when the tool reports one
    pub column: Option<u32>,

    /// Severity derived from the finding code
    pub severity: Severity,

    /// Tool finding code (e.g. E501)
    pub code: String,

    /// Human-readable message
    pub message: String,
}

impl Annotation {
    /// Render the finding as a workflow command the hosting review
    /// surface binds to the offending location
    pub fn workflow_command(&self) -> String {
        let location = match self.column {
            Some(col) => format!("file={},line={},col={}", self.path, self.line, col),
            None => format!("file={},line={}", self.path, self.line),
        };
        format!("::{} {}::{} {}", self.severity, location, self.code, self.message)
    }
}

/// Lines of the linter's machine-readable mode:
/// `path:line:col: CODE message` (the column is optional).
fn finding_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^([^:\s][^:\n]*):(\d+):(?:(\d+):)?\s+([A-Z]{1,3}\d{1,4})\s+(.+)$")
            .expect("finding pattern is a valid literal")
    })
}

/// Parse every structured finding out of a tool's output
///
/// Lines that do not look like findings are ignored; a tool with no
/// machine-readable mode simply yields no annotations.
pub fn parse_findings(output: &str) -> Vec<Annotation> {
    finding_re()
        .captures_iter(output)
        .filter_map(|caps| {
            let line = caps.get(2)?.as_str().parse().ok()?;
            let column = caps.get(3).and_then(|m| m.as_str().parse().ok());
            let code = caps.get(4)?.as_str().to_string();
            let severity = if code.starts_with('W') {
                Severity::Warning
            } else {
                Severity::Error
            };

            Some(Annotation {
                path: caps.get(1)?.as_str().to_string(),
                line,
                column,
                severity,
                code,
                message: caps.get(5)?.as_str().trim().to_string(),
            })
        })
        .collect()
}
