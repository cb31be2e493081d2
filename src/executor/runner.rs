//! Async command execution with timeout support
//!
//! Two execution modes are provided:
//! - **captured** ([`exec_command`]) - stdout and stderr are collected and
//!   returned once the process exits
//! - **streaming** ([`exec_streaming`]) - stdout and stderr lines are handed
//!   to an [`OutputSink`] as they arrive, interleaved in arrival order
//!
//! Neither mode imposes a timeout unless one is set in [`ExecOptions`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::error::MixError;

/// Maximum output size before truncation (in bytes)
pub const MAX_OUTPUT_SIZE: usize = 100_000; // 100KB

/// Truncation marker for large outputs
const TRUNCATION_MARKER: &str = "\n... [output truncated] ...\n";

/// Which stream a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Receiver of streamed process output
///
/// Lines are delivered without their trailing newline.
pub trait OutputSink: Send {
    fn line(&mut self, stream: StreamKind, line: &str);
}

impl<F> OutputSink for F
where
    F: FnMut(StreamKind, &str) + Send,
{
    fn line(&mut self, stream: StreamKind, line: &str) {
        self(stream, line)
    }
}

/// Sink that discards everything
pub struct NullSink;

impl OutputSink for NullSink {
    fn line(&mut self, _stream: StreamKind, _line: &str) {}
}

/// Options for async command execution
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Working directory for the command
    pub working_dir: Option<PathBuf>,
    /// Environment variables to set
    pub env: HashMap<String, String>,
    /// Timeout duration (None = no timeout)
    pub timeout: Option<Duration>,
    /// Maximum output size before truncation
    pub max_output_size: usize,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            working_dir: None,
            env: HashMap::new(),
            timeout: None,
            max_output_size: MAX_OUTPUT_SIZE,
        }
    }
}

impl ExecOptions {
    /// Create options with a working directory
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(dir.into()),
            ..Default::default()
        }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set timeout in seconds, where 0 means no timeout
    pub fn with_timeout_secs(self, secs: u64) -> Self {
        if secs == 0 {
            self
        } else {
            self.with_timeout(Duration::from_secs(secs))
        }
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Add several environment variables
    pub fn with_envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set maximum output size
    pub fn with_max_output(mut self, size: usize) -> Self {
        self.max_output_size = size;
        self
    }
}

/// Result of a captured command execution
#[derive(Debug)]
pub struct ExecResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// Exit code if available
    pub exit_code: Option<i32>,
    /// Standard output (may be truncated)
    pub stdout: String,
    /// Whether stdout was truncated
    pub stdout_truncated: bool,
    /// Standard error
    pub stderr: String,
    /// Whether stderr was truncated
    pub stderr_truncated: bool,
    /// Duration of execution
    pub duration: Duration,
}

/// Result of a streaming command execution
#[derive(Debug)]
pub struct StreamResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// Exit code if available
    pub exit_code: Option<i32>,
    /// Combined output transcript (may be truncated)
    pub output: String,
    /// Whether the transcript was truncated
    pub output_truncated: bool,
    /// Duration of execution
    pub duration: Duration,
}

/// Render a program and its arguments for display
pub fn command_line(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Build a piped, kill-on-drop command from options
fn build_command(program: &str, args: &[&str], options: &ExecOptions) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true); // Kill process if future is dropped

    if let Some(ref dir) = options.working_dir {
        cmd.current_dir(dir);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    cmd
}

/// Execute a command and capture its output
///
/// # Errors
/// * `MixError::ToolInvocation` - If the command couldn't be spawned
/// * `MixError::Timeout` - If the command timed out (when timeout is set)
pub async fn exec_command(
    program: &str,
    args: &[&str],
    options: &ExecOptions,
) -> Result<ExecResult, MixError> {
    let start = Instant::now();
    let command_str = command_line(program, args);

    tracing::debug!("Executing: {}", command_str);

    let child = build_command(program, args, options)
        .spawn()
        .map_err(|e| MixError::spawn_failed(&command_str, &e))?;

    let result = with_timeout(
        &command_str,
        options.timeout,
        wait_for_output(child, options.max_output_size),
    )
    .await??;

    Ok(ExecResult {
        success: result.exit_code == Some(0),
        exit_code: result.exit_code,
        stdout: result.stdout,
        stdout_truncated: result.stdout_truncated,
        stderr: result.stderr,
        stderr_truncated: result.stderr_truncated,
        duration: start.elapsed(),
    })
}

/// Execute a command, streaming each output line to `sink`
///
/// stdout and stderr are read concurrently and forwarded in arrival order.
/// A combined transcript, capped at `max_output_size`, is also returned.
///
/// # Errors
/// * `MixError::ToolInvocation` - If the command couldn't be spawned
/// * `MixError::Timeout` - If the command timed out (when timeout is set)
pub async fn exec_streaming(
    program: &str,
    args: &[&str],
    options: &ExecOptions,
    sink: &mut dyn OutputSink,
) -> Result<StreamResult, MixError> {
    let start = Instant::now();
    let command_str = command_line(program, args);

    tracing::debug!("Streaming: {}", command_str);

    let child = build_command(program, args, options)
        .spawn()
        .map_err(|e| MixError::spawn_failed(&command_str, &e))?;

    let pumped = with_timeout(
        &command_str,
        options.timeout,
        pump_output(child, options.max_output_size, sink),
    )
    .await??;

    Ok(StreamResult {
        success: pumped.exit_code == Some(0),
        exit_code: pumped.exit_code,
        output: pumped.output,
        output_truncated: pumped.truncated,
        duration: start.elapsed(),
    })
}

/// Await `fut`, mapping an elapsed deadline to `MixError::Timeout`
async fn with_timeout<F, T>(
    command: &str,
    limit: Option<Duration>,
    fut: F,
) -> Result<T, MixError>
where
    F: std::future::Future<Output = T>,
{
    match limit {
        Some(limit) => timeout(limit, fut).await.map_err(|_| MixError::Timeout {
            command: command.to_string(),
            timeout_secs: limit.as_secs(),
        }),
        None => Ok(fut.await),
    }
}

/// Internal result from waiting for process output
struct WaitResult {
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
    stdout_truncated: bool,
    stderr_truncated: bool,
}

/// Wait for a child process and capture its output
async fn wait_for_output(mut child: Child, max_output_size: usize) -> Result<WaitResult, MixError> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    // Read stdout and stderr concurrently
    let stdout_handle = tokio::spawn(async move {
        match stdout {
            Some(stdout) => read_and_truncate(stdout, max_output_size).await,
            None => (String::new(), false),
        }
    });

    let stderr_handle = tokio::spawn(async move {
        match stderr {
            Some(stderr) => read_and_truncate(stderr, max_output_size).await,
            None => (String::new(), false),
        }
    });

    let status = child.wait().await?;

    let (stdout, stdout_truncated) = stdout_handle
        .await
        .map_err(|e| MixError::Io(std::io::Error::other(format!("stdout task failed: {}", e))))?;

    let (stderr, stderr_truncated) = stderr_handle
        .await
        .map_err(|e| MixError::Io(std::io::Error::other(format!("stderr task failed: {}", e))))?;

    Ok(WaitResult {
        exit_code: status.code(),
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
    })
}

/// Read from an async reader and truncate if too large
async fn read_and_truncate<R: AsyncRead + Unpin>(reader: R, max_size: usize) -> (String, bool) {
    let mut buf_reader = BufReader::new(reader);
    let mut output = String::with_capacity(max_size.min(64 * 1024));
    let mut line = Vec::with_capacity(4096);
    let mut truncated = false;

    loop {
        line.clear();
        match buf_reader.read_until(b'\n', &mut line).await {
            Ok(0) => break, // EOF
            // Keep draining after truncation so the child never sees a closed pipe
            Ok(_) if truncated => {}
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                truncated = !append_capped(&mut output, &text, max_size);
            }
            Err(e) => {
                tracing::warn!("Error reading output: {}", e);
                break;
            }
        }
    }

    (output, truncated)
}

/// Append the line `text` to `output` unless that would exceed `max_size`
///
/// Lines are kept whole: on overflow only the truncation marker is appended
/// and `false` is returned.
fn append_capped(output: &mut String, text: &str, max_size: usize) -> bool {
    if output.len() + text.len() <= max_size {
        output.push_str(text);
        return true;
    }

    output.push_str(TRUNCATION_MARKER);
    false
}

/// Forward lines from one stream into the shared channel
async fn forward_lines<R: AsyncRead + Unpin>(
    reader: R,
    kind: StreamKind,
    tx: mpsc::UnboundedSender<(StreamKind, String)>,
) {
    let mut buf_reader = BufReader::new(reader);
    let mut line = Vec::with_capacity(4096);

    loop {
        line.clear();
        match buf_reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                let text = text.trim_end_matches(['\n', '\r']).to_string();
                if tx.send((kind, text)).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!("Error reading output: {}", e);
                break;
            }
        }
    }
}

struct PumpResult {
    exit_code: Option<i32>,
    output: String,
    truncated: bool,
}

/// Drive a child to completion, delivering its output to `sink`
async fn pump_output(
    mut child: Child,
    max_output_size: usize,
    sink: &mut dyn OutputSink,
) -> Result<PumpResult, MixError> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward_lines(stdout, StreamKind::Stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_lines(stderr, StreamKind::Stderr, tx.clone()));
    }
    drop(tx);

    let mut output = String::new();
    let mut truncated = false;

    // Ends once both readers hit EOF and drop their senders
    while let Some((kind, line)) = rx.recv().await {
        sink.line(kind, &line);
        if !truncated {
            let mut text = line;
            text.push('\n');
            truncated = !append_capped(&mut output, &text, max_output_size);
        }
    }

    let status = child.wait().await?;

    Ok(PumpResult {
        exit_code: status.code(),
        output,
        truncated,
    })
}
