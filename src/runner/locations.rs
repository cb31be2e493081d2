//! Source location extraction from mix output
//!
//! Compiler warnings, errors and test failures reference Elixir sources as
//! `lib/app/thing.ex:42` or `test/app_test.exs:10:5`. These are turned into
//! [`SourceLocation`]s so a display surface can link them.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// File extensions recognized as Elixir sources and templates
pub const SOURCE_EXTENSIONS: &[&str] = &["ex", "exs", "eex", "leex", "heex"];

/// Matches `<path>.<ext>:<line>` with an optional `:<column>`
static LOCATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([^\s:()\[\]{}'`]+\.(?:exs|ex|heex|leex|eex)):(\d+)(?::(\d+))?").unwrap()
});

/// A reference to a line in a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    /// Path as printed by the tool
    pub file: String,
    /// 1-based line number
    pub line: u32,
    /// 1-based column, when printed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(column) => write!(f, "{}:{}:{}", self.file, self.line, column),
            None => write!(f, "{}:{}", self.file, self.line),
        }
    }
}

/// Extract all source locations from a line of output, in order
pub fn extract_locations(line: &str) -> Vec<SourceLocation> {
    LOCATION_RE
        .captures_iter(line)
        .filter_map(|caps| {
            let line_no = caps[2].parse().ok()?;
            let column = caps.get(3).and_then(|m| m.as_str().parse().ok());
            Some(SourceLocation {
                file: caps[1].to_string(),
                line: line_no,
                column,
            })
        })
        .collect()
}
