//! MCP Server module
//!
//! Provides MCP tools for Mix projects:
//! - `find_project_root` - Find the nearest and umbrella project roots
//! - `list_tasks` - List available mix tasks
//! - `run_task` - Run a mix task at the project root
//! - `compile` - Compile the project

pub mod server;

pub use server::MixhubServer;
