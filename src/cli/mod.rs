//! CLI module for mixhub
//!
//! Provides command-line interface with the following subcommands:
//! - `root` - Print the project root
//! - `list` - List available mix tasks
//! - `run` - Run a mix task at the project root
//! - `compile` - Compile at the project root
//! - `shell` - Open a shell at the project root
//! - `config` - Show configuration
//! - `mcp` - Start MCP server over stdio

pub mod commands;
pub mod mcp;

pub use commands::{Cli, Commands};
pub use mcp::run_mcp_server;
