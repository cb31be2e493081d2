//! Parsing of `mix help` output into task entries
//!
//! `mix help` prints one task per line:
//!
//! ```text
//! mix                   # Runs the default task (current: "mix run")
//! mix compile           # Compiles source files
//! mix deps.get          # Gets all out of date dependencies
//! iex -S mix            # Starts IEx and runs the default task
//! ```
//!
//! Only lines starting with the `mix` prefix word are tasks. The bare `mix`
//! line is an alias for the default task and is dropped. The remainder of
//! each kept line (task name plus optional `# description`) is a descriptor.

use serde::Serialize;

/// Prefix word that starts every task line
pub const TASK_PREFIX: &str = "mix";

/// Substring identifying the default-task alias line
pub const DEFAULT_TASK_MARKER: &str = "Runs the default task";

/// A task offered by `mix help`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaskEntry {
    /// Task name as passed to `mix <name>`
    pub name: String,
    /// Description from the trailing comment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TaskEntry {
    /// Create a new task with just a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    /// Add a description to the task
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Build an entry from a raw descriptor such as `compile # Compiles`
    pub fn from_descriptor(descriptor: &str) -> Self {
        let description = descriptor
            .split_once('#')
            .map(|(_, comment)| comment.trim())
            .filter(|comment| !comment.is_empty())
            .map(str::to_string);

        Self {
            name: strip_comment(descriptor).to_string(),
            description,
        }
    }
}

/// Return the part of a descriptor before the first `#`, trimmed
pub fn strip_comment(descriptor: &str) -> &str {
    match descriptor.split_once('#') {
        Some((name, _)) => name.trim(),
        None => descriptor.trim(),
    }
}

/// Strip the prefix word and one blank from a task line
fn strip_task_prefix(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(TASK_PREFIX)?;
    rest.strip_prefix(' ').or_else(|| rest.strip_prefix('\t'))
}

/// Extract task descriptors from `mix help` output, preserving order
///
/// Duplicates are kept as the tool emitted them.
pub fn parse_help_output(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.contains(DEFAULT_TASK_MARKER))
        .filter_map(strip_task_prefix)
        .map(str::to_string)
        .collect()
}

/// Parse `mix help` output into task entries
pub fn parse_task_entries(output: &str) -> Vec<TaskEntry> {
    parse_help_output(output)
        .iter()
        .map(|descriptor| TaskEntry::from_descriptor(descriptor))
        .collect()
}
