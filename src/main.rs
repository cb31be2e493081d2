//! mixhub CLI entry point
//!
//! Usage:
//!   mixhub root                Print the project root
//!   mixhub list                List available mix tasks
//!   mixhub run <task> [args]   Run a mix task at the project root
//!   mixhub compile [args]      Compile at the project root
//!   mixhub shell               Open a shell at the project root
//!   mixhub config              Show configuration
//!   mixhub mcp                 Start MCP server over stdio

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mixhub::cli::{
    commands::{
        CompileArgs, ConfigArgs, ExecArgs, ListArgs, OutputFormat, RootArgs, RunArgs, ShellArgs,
    },
    run_mcp_server, Cli, Commands,
};
use mixhub::config::{find_config_files, load_config, load_raw_config, Config};
use mixhub::error::MixError;
use mixhub::executor::StreamKind;
use mixhub::project::{discover_roots, resolve_project_root, shell_directory};
use mixhub::runner::{extract_locations, MixRunner, RunOptions, RunResult, TaskEntry};
use mixhub::shell::launch_shell;

/// Environment variable holding the log filter
const LOG_ENV: &str = "MIXHUB_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            if let Some(suggestion) = e.downcast_ref::<MixError>().and_then(MixError::suggestion) {
                eprintln!("{}: {}", "hint".cyan().bold(), suggestion);
            }
            ExitCode::FAILURE
        }
    }
}

/// Install the stderr log subscriber
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Mcp => {
            run_mcp_server(config_path).await?;
        }
        Commands::Root(args) => {
            let config = load_config(config_path)?;
            show_root(args, &config, cli.nearest)?;
        }
        Commands::List(args) => {
            let config = load_config(config_path)?;
            list_tasks(args, &config, cli.nearest).await?;
        }
        Commands::Run(args) => {
            let config = load_config(config_path)?;
            return run_task(args, &config, cli.nearest, cli.verbose).await;
        }
        Commands::Compile(args) => {
            let config = load_config(config_path)?;
            return compile(args, &config, cli.nearest, cli.verbose).await;
        }
        Commands::Shell(args) => {
            let config = load_config(config_path)?;
            return open_shell(args, &config, cli.nearest).await;
        }
        Commands::Config(args) => {
            show_config(args, config_path)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Directory a command starts from
fn start_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().context("Failed to read current directory"),
    }
}

/// Print the project root for a directory
fn show_root(args: RootArgs, config: &Config, nearest: bool) -> Result<()> {
    let start = start_dir(args.dir)?;
    let roots = discover_roots(&start).ok_or_else(|| MixError::NoProjectRootFound {
        start: start.display().to_string(),
    })?;
    let root = roots.select(config.prefer_umbrella(nearest));

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&serde_json::json!({
                "root": root,
                "nearest": roots.nearest,
                "umbrella": roots.umbrella,
                "nested": roots.is_nested(),
            }))?;
            println!("{}", json);
        }
        OutputFormat::Plain => {
            println!("{}", root.display());
        }
        OutputFormat::Table => {
            println!("{}: {}", "Root".cyan(), root.display());
            println!("{}: {}", "Nearest".cyan(), roots.nearest.display());
            println!("{}: {}", "Umbrella".cyan(), roots.umbrella.display());
        }
    }

    Ok(())
}

/// List available tasks in a project
async fn list_tasks(args: ListArgs, config: &Config, nearest: bool) -> Result<()> {
    let start = start_dir(args.dir)?;
    let root = resolve_project_root(&start, config.prefer_umbrella(nearest))?;
    let runner = MixRunner::from_config(&config.mix);

    let descriptors = runner.list_descriptors(&root).await?;

    if args.raw {
        for descriptor in &descriptors {
            println!("{}", descriptor);
        }
        return Ok(());
    }

    let tasks: Vec<TaskEntry> = descriptors
        .iter()
        .map(|descriptor| TaskEntry::from_descriptor(descriptor))
        .collect();

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&serde_json::json!({
                "root": root,
                "tasks": tasks,
            }))?;
            println!("{}", json);
        }
        OutputFormat::Plain => {
            for task in &tasks {
                println!("{}", task.name);
            }
        }
        OutputFormat::Table => {
            println!("{}: {}", "Project".cyan(), root.display());
            println!();
            if tasks.is_empty() {
                println!("No tasks found.");
            } else {
                let max_name_width = tasks.iter().map(|t| t.name.len()).max().unwrap_or(10);

                for task in &tasks {
                    let desc = task
                        .description
                        .as_ref()
                        .map(|d| format!("# {}", d))
                        .unwrap_or_default();
                    println!(
                        "  {}  {}",
                        format!("{:width$}", task.name, width = max_name_width).green(),
                        desc.dimmed()
                    );
                }
            }
        }
    }

    Ok(())
}

/// Run options from config with the command-line overrides applied
fn run_options(exec: &ExecArgs, args: Vec<String>, config: &Config) -> RunOptions {
    let mut options = RunOptions::from_config(&config.mix).with_args(args);
    if let Some(secs) = exec.timeout {
        options.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    options.env.extend(exec.env_map());
    options
}

/// Print a line of task output, highlighting lines that point at source
fn print_line(stream: StreamKind, line: &str) {
    let has_location = !extract_locations(line).is_empty();
    match (stream, has_location) {
        (StreamKind::Stdout, false) => println!("{}", line),
        (StreamKind::Stdout, true) => println!("{}", line.yellow()),
        (StreamKind::Stderr, false) => eprintln!("{}", line),
        (StreamKind::Stderr, true) => eprintln!("{}", line.yellow()),
    }
}

/// Report a finished run and map it to the process exit code
fn finish_run(
    label: &str,
    result: &RunResult,
    show_locations: bool,
    verbose: bool,
) -> Result<ExitCode> {
    if show_locations && !result.locations.is_empty() {
        eprintln!();
        eprintln!("{}:", "Locations".cyan());
        for location in &result.locations {
            eprintln!("  {}", location);
        }
    }

    if result.success {
        if verbose {
            eprintln!(
                "{}: {} completed in {}ms",
                "success".green(),
                label,
                result.duration_ms
            );
        }
        Ok(ExitCode::SUCCESS)
    } else {
        anyhow::bail!("Task '{}' failed with exit code {:?}", label, result.exit_code);
    }
}

/// Run a mix task at the project root
async fn run_task(
    args: RunArgs,
    config: &Config,
    nearest: bool,
    verbose: bool,
) -> Result<ExitCode> {
    let start = start_dir(args.exec.dir.clone())?;
    let root = resolve_project_root(&start, config.prefer_umbrella(nearest))?;
    let runner = MixRunner::from_config(&config.mix);
    let options = run_options(&args.exec, args.args, config);

    if verbose {
        eprintln!(
            "{}: {} in {}",
            "running".cyan(),
            runner.build_command(&args.task, &options),
            root.display()
        );
    }

    let mut sink = print_line;
    let result = runner.run_task(&root, &args.task, &options, &mut sink).await?;

    finish_run(&args.task, &result, args.exec.locations, verbose)
}

/// Run the compile task at the project root
async fn compile(
    args: CompileArgs,
    config: &Config,
    nearest: bool,
    verbose: bool,
) -> Result<ExitCode> {
    let start = start_dir(args.exec.dir.clone())?;
    let root = resolve_project_root(&start, config.prefer_umbrella(nearest))?;
    let runner = MixRunner::from_config(&config.mix);
    let options = run_options(&args.exec, args.args, config);

    if verbose {
        eprintln!(
            "{}: {} in {}",
            "running".cyan(),
            runner.build_command(&config.mix.compile_task, &options),
            root.display()
        );
    }

    let mut sink = print_line;
    let result = runner.compile(&root, &options, &mut sink).await?;

    finish_run(&config.mix.compile_task, &result, args.exec.locations, verbose)
}

/// Open an interactive shell at the project root
async fn open_shell(args: ShellArgs, config: &Config, nearest: bool) -> Result<ExitCode> {
    let start = start_dir(args.dir)?;
    let dir = shell_directory(&start, config.prefer_umbrella(nearest));

    let status = launch_shell(&dir, &config.shell).await?;

    Ok(match status.code() {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    })
}

/// Show the resolved configuration
fn show_config(args: ConfigArgs, config_path: Option<&str>) -> Result<()> {
    let config = if args.raw {
        load_raw_config(config_path)?
    } else {
        load_config(config_path)?
    };

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        OutputFormat::Plain => {
            for path in find_config_files() {
                println!("{}", path.display());
            }
        }
        OutputFormat::Table => {
            let files = find_config_files();
            if files.is_empty() {
                println!("{}: {}", "Files".cyan(), "none (defaults)");
            } else {
                println!("{}:", "Files".cyan());
                for path in &files {
                    println!("  - {}", display_path(path));
                }
            }
            if let Some(path) = config_path {
                println!("{}: {}", "Override".cyan(), path);
            }
            println!();
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn display_path(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
