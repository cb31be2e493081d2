//! Interactive shell launcher
//!
//! Opens the configured shell with inherited stdio in a project directory
//! and waits for it to exit.

use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;

use crate::config::ShellConfig;
use crate::error::MixError;
use crate::executor::command_line;

/// Launch the interactive shell in `dir` and wait for it to exit
///
/// # Errors
/// * `MixError::ToolInvocation` - If the shell cannot be started
pub async fn launch_shell(dir: &Path, shell: &ShellConfig) -> Result<ExitStatus, MixError> {
    let program = shell.effective_program();
    let args: Vec<&str> = shell.args.iter().map(String::as_str).collect();
    let command_str = command_line(program, &args);

    tracing::debug!("Launching shell {} in {}", command_str, dir.display());

    let mut child = Command::new(program)
        .args(&args)
        .current_dir(dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| MixError::spawn_failed(&command_str, &e))?;

    Ok(child.wait().await?)
}
