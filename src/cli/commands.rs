//! CLI command definitions using clap
//!
//! Defines all CLI subcommands and their arguments.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::path::PathBuf;

/// Mix project helper and MCP server.
///
/// Finds Mix project roots, lists mix tasks, runs tasks and compiles with
/// source locations, and opens a shell at the project root.
#[derive(Parser, Debug)]
#[command(name = "mixhub")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (overrides default XDG paths)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Use the nearest project root instead of the umbrella root
    #[arg(long, global = true)]
    pub nearest: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the project root for a directory
    Root(RootArgs),

    /// List available mix tasks
    List(ListArgs),

    /// Run a mix task at the project root
    Run(RunArgs),

    /// Run the compile task at the project root
    Compile(CompileArgs),

    /// Open an interactive shell at the project root
    Shell(ShellArgs),

    /// Show the resolved configuration
    Config(ConfigArgs),

    /// Start MCP server over stdio
    Mcp,
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON output
    Json,
    /// Plain text (one item per line)
    Plain,
}

/// Arguments for the `root` subcommand
#[derive(Parser, Debug)]
pub struct RootArgs {
    /// Directory to search from (defaults to current directory)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Arguments for the `list` subcommand
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Directory inside the project (defaults to current directory)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Print descriptors exactly as listed by mix, without the prefix
    #[arg(long)]
    pub raw: bool,
}

/// Options shared by `run` and `compile`
#[derive(Args, Debug, Clone)]
pub struct ExecArgs {
    /// Directory inside the project (defaults to current directory)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Timeout in seconds (0 for no timeout, default from config)
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Environment variables in KEY=VALUE format
    #[arg(short = 'e', long = "env", value_parser = parse_key_value)]
    pub env: Vec<(String, String)>,

    /// Set MIX_ENV for the run
    #[arg(long)]
    pub mix_env: Option<String>,

    /// Print source locations found in the output after the run
    #[arg(long)]
    pub locations: bool,
}

impl ExecArgs {
    /// Collect environment overrides, with --mix-env applied last
    pub fn env_map(&self) -> HashMap<String, String> {
        let mut env: HashMap<String, String> = self.env.iter().cloned().collect();
        if let Some(ref mix_env) = self.mix_env {
            env.insert("MIX_ENV".to_string(), mix_env.clone());
        }
        env
    }
}

/// Arguments for the `run` subcommand
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Task name to run (e.g., test, deps.get, phx.server)
    #[arg(required = true)]
    pub task: String,

    #[command(flatten)]
    pub exec: ExecArgs,

    /// Arguments passed to the task
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Arguments for the `compile` subcommand
#[derive(Parser, Debug)]
pub struct CompileArgs {
    #[command(flatten)]
    pub exec: ExecArgs,

    /// Arguments passed to the compile task
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Arguments for the `shell` subcommand
#[derive(Parser, Debug)]
pub struct ShellArgs {
    /// Directory to start from (defaults to current directory)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,
}

/// Arguments for the `config` subcommand
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Show raw config without interpolation
    #[arg(long)]
    pub raw: bool,
}

/// Parse KEY=VALUE argument
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid argument '{}': expected KEY=VALUE format", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}
