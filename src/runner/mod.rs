//! Runner module for the mix build tool
//!
//! - `help` - parsing of `mix help` into task entries
//! - `locations` - source locations in task output
//! - `mix` - invoking mix to list and run tasks

pub mod help;
pub mod locations;
pub mod mix;

pub use help::{parse_help_output, parse_task_entries, strip_comment, TaskEntry};
pub use locations::{extract_locations, SourceLocation};
pub use mix::{MixRunner, RunOptions, RunResult};
