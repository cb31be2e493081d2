//! mixhub - Mix project helper and MCP server
//!
//! Locates Elixir Mix projects on disk and drives the `mix` build tool:
//! - **Project roots** - nearest `mix.exs` or the enclosing umbrella root
//! - **Task listing** - task descriptors parsed from `mix help`
//! - **Task runs** - `mix <task>` at the root with streamed output
//! - **Shell** - an interactive shell opened at the project root
//!
//! ## Features
//!
//! - Bounded upward search, nearest or umbrella policy
//! - Source locations (`lib/app.ex:12`) collected from task output
//! - XDG-compliant layered configuration
//! - Environment variable and shell command interpolation
//!
//! ## MCP Tools
//!
//! - `find_project_root` - Find the nearest and umbrella roots
//! - `list_tasks` - List available mix tasks
//! - `run_task` - Run a mix task at the project root
//! - `compile` - Compile the project

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod mcp;
pub mod project;
pub mod runner;
pub mod shell;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::{ErrorInfo, MixError};
pub use executor::{exec_command, exec_streaming, ExecOptions, ExecResult, OutputSink, StreamKind};
pub use mcp::MixhubServer;
pub use project::{
    discover_roots, find_nearest_root, find_project_root, resolve_project_root, ProjectRoots,
};
pub use runner::{MixRunner, RunOptions, RunResult, TaskEntry};
pub use shell::launch_shell;
