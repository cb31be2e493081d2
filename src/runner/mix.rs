//! mix runner implementation
//!
//! Lists tasks via `mix help` and runs `mix <task>` in a project root.
//!
//! Listing captures output and fails loudly: a missing executable or a
//! non-zero exit from `mix help` is a [`MixError::ToolInvocation`]. Running a
//! task streams output to an [`OutputSink`]; a non-zero exit there is the
//! build failing and is reported through [`RunResult::success`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use super::help::{parse_help_output, TaskEntry};
use super::locations::{extract_locations, SourceLocation};
use crate::config::MixConfig;
use crate::error::{suggest_fix, MixError};
use crate::executor::{
    command_line, exec_command, exec_streaming, ExecOptions, OutputSink, StreamKind,
    MAX_OUTPUT_SIZE,
};

/// Result type for runner operations
pub type RunnerResult<T> = Result<T, MixError>;

/// Subcommand that prints the task listing
const HELP_TASK: &str = "help";

/// Options for running a task
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Extra arguments passed after the task name
    pub args: Vec<String>,
    /// Environment variables to set
    pub env: HashMap<String, String>,
    /// Timeout for the command (None = wait indefinitely)
    pub timeout: Option<Duration>,
    /// Bytes of combined output kept in the result
    pub max_output_size: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            env: HashMap::new(),
            timeout: None,
            max_output_size: MAX_OUTPUT_SIZE,
        }
    }
}

impl RunOptions {
    /// Options seeded from the `[mix]` config section
    pub fn from_config(config: &MixConfig) -> Self {
        Self {
            env: config.env.clone(),
            timeout: (config.timeout > 0).then(|| Duration::from_secs(config.timeout)),
            max_output_size: config.max_output_size,
            ..Default::default()
        }
    }

    /// Add several arguments after the task name
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn exec_options(&self, dir: &Path) -> ExecOptions {
        let mut options = ExecOptions::in_dir(dir)
            .with_envs(self.env.clone())
            .with_max_output(self.max_output_size);
        options.timeout = self.timeout;
        options
    }
}

/// Result of running a task
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// Whether the task succeeded (exit code 0)
    pub success: bool,
    /// Exit code if available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Combined stdout and stderr (may be truncated)
    pub output: String,
    /// Whether `output` was truncated
    pub output_truncated: bool,
    /// Command that was executed
    pub command: String,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// Source locations referenced by the output, in order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<SourceLocation>,
}

/// Sink wrapper that records source locations before forwarding lines
struct LocatingSink<'a> {
    inner: &'a mut dyn OutputSink,
    locations: Vec<SourceLocation>,
}

impl OutputSink for LocatingSink<'_> {
    fn line(&mut self, stream: StreamKind, line: &str) {
        self.locations.extend(extract_locations(line));
        self.inner.line(stream, line);
    }
}

/// Runner for the mix build tool
#[derive(Debug, Clone)]
pub struct MixRunner {
    /// Path or name of the mix command
    mix_command: String,
    /// Task run by [`MixRunner::compile`]
    compile_task: String,
}

impl Default for MixRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MixRunner {
    /// Create a runner using `mix` from PATH
    pub fn new() -> Self {
        Self::with_command("mix")
    }

    /// Create a runner with a custom mix command path
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            mix_command: command.into(),
            compile_task: "compile".to_string(),
        }
    }

    /// Create a runner from the `[mix]` config section
    pub fn from_config(config: &MixConfig) -> Self {
        Self {
            mix_command: config.command.clone(),
            compile_task: config.compile_task.clone(),
        }
    }

    /// The configured mix command
    pub fn command(&self) -> &str {
        &self.mix_command
    }

    /// Locate the mix executable
    ///
    /// # Errors
    /// * `MixError::ToolInvocation` - If the command is not an executable on PATH
    pub fn resolve_program(&self) -> RunnerResult<PathBuf> {
        which::which(&self.mix_command).map_err(|e| MixError::ToolInvocation {
            command: self.mix_command.clone(),
            exit_code: None,
            message: e.to_string(),
            suggestion: suggest_fix(&self.mix_command, "command not found"),
        })
    }

    /// Build the command line for a task (for display/logging)
    pub fn build_command(&self, task: &str, options: &RunOptions) -> String {
        let mut parts = vec![task];
        parts.extend(options.args.iter().map(String::as_str));
        command_line(&self.mix_command, &parts)
    }

    /// Run `mix help` in `dir` and return its stdout
    async fn help_output(&self, dir: &Path) -> RunnerResult<String> {
        let program = self.resolve_program()?;
        let program = program.to_string_lossy();
        let command_str = command_line(&self.mix_command, &[HELP_TASK]);

        // The listing is parsed line by line, so it is captured in full
        let options = ExecOptions::in_dir(dir).with_max_output(usize::MAX);
        let result = exec_command(&program, &[HELP_TASK], &options).await?;

        if !result.success {
            // Some failures only print to stdout
            let detail = if result.stderr.trim().is_empty() {
                &result.stdout
            } else {
                &result.stderr
            };
            return Err(MixError::command_failed(command_str, result.exit_code, detail));
        }

        Ok(result.stdout)
    }

    /// Raw task descriptors (`name # description`) in listing order
    pub async fn list_descriptors(&self, dir: &Path) -> RunnerResult<Vec<String>> {
        let output = self.help_output(dir).await?;
        Ok(parse_help_output(&output))
    }

    /// List available tasks in the given project root
    ///
    /// An empty listing is returned as an empty vector.
    ///
    /// # Errors
    /// * `MixError::ToolInvocation` - If mix is missing or `mix help` fails
    pub async fn list_tasks(&self, dir: &Path) -> RunnerResult<Vec<TaskEntry>> {
        let descriptors = self.list_descriptors(dir).await?;
        tracing::debug!("Parsed {} tasks from {}", descriptors.len(), dir.display());

        Ok(descriptors
            .iter()
            .map(|descriptor| TaskEntry::from_descriptor(descriptor))
            .collect())
    }

    /// Run `mix <task> [args...]` in `dir`, streaming output to `sink`
    ///
    /// # Errors
    /// * `MixError::InvalidTask` - If the task name is empty or looks like a flag
    /// * `MixError::ToolInvocation` - If mix cannot be started
    /// * `MixError::Timeout` - If a timeout was set and exceeded
    pub async fn run_task(
        &self,
        dir: &Path,
        task: &str,
        options: &RunOptions,
        sink: &mut dyn OutputSink,
    ) -> RunnerResult<RunResult> {
        validate_task_name(task)?;

        let program = self.resolve_program()?;
        let program = program.to_string_lossy();
        let command_str = self.build_command(task, options);

        let mut args: Vec<&str> = vec![task];
        args.extend(options.args.iter().map(String::as_str));

        tracing::debug!("Running {} in {}", command_str, dir.display());

        let mut locating = LocatingSink {
            inner: sink,
            locations: Vec::new(),
        };
        let result =
            exec_streaming(&program, &args, &options.exec_options(dir), &mut locating).await?;

        Ok(RunResult {
            success: result.success,
            exit_code: result.exit_code,
            output: result.output,
            output_truncated: result.output_truncated,
            command: command_str,
            duration_ms: result.duration.as_millis() as u64,
            locations: locating.locations,
        })
    }

    /// Run the configured compile task (default `mix compile`)
    pub async fn compile(
        &self,
        dir: &Path,
        options: &RunOptions,
        sink: &mut dyn OutputSink,
    ) -> RunnerResult<RunResult> {
        self.run_task(dir, &self.compile_task, options, sink).await
    }
}

/// Reject task names mix would misread
fn validate_task_name(task: &str) -> RunnerResult<()> {
    if task.is_empty() || task.starts_with('-') || task.chars().any(char::is_whitespace) {
        return Err(MixError::InvalidTask(task.to_string()));
    }
    Ok(())
}
