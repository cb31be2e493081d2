//! Error types for mixhub
//!
//! Provides structured error types with suggestions for common mix failures.

use serde::Serialize;
use thiserror::Error;

/// Main error type for project and task operations
#[derive(Error, Debug)]
pub enum MixError {
    /// Upward search reached the filesystem root without finding `mix.exs`
    #[error("No mix project root found from {start}")]
    NoProjectRootFound { start: String },

    /// The external tool failed to start or reported failure
    #[error("Failed to invoke `{command}`: {message}")]
    ToolInvocation {
        command: String,
        exit_code: Option<i32>,
        message: String,
        suggestion: Option<String>,
    },

    /// Command timed out
    #[error("Command timed out after {timeout_secs}s: {command}")]
    Timeout { command: String, timeout_secs: u64 },

    /// Task name that cannot be passed to mix
    #[error("Invalid task name: '{0}'")]
    InvalidTask(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MixError {
    /// Build a tool invocation error for a process that could not be spawned
    pub fn spawn_failed(command: impl Into<String>, error: &std::io::Error) -> Self {
        let command = command.into();
        let message = error.to_string();
        let suggestion = if error.kind() == std::io::ErrorKind::NotFound {
            suggest_fix(&command, "command not found")
        } else {
            suggest_fix(&command, &message)
        };

        MixError::ToolInvocation {
            command,
            exit_code: None,
            message,
            suggestion,
        }
    }

    /// Build a tool invocation error for a process that exited unsuccessfully
    pub fn command_failed(
        command: impl Into<String>,
        exit_code: Option<i32>,
        stderr: &str,
    ) -> Self {
        let command = command.into();
        MixError::ToolInvocation {
            suggestion: suggest_fix(&command, stderr),
            command,
            exit_code,
            message: stderr.trim_end().to_string(),
        }
    }

    /// Suggestion attached to the error, if any
    pub fn suggestion(&self) -> Option<String> {
        ErrorInfo::from(self).suggestion
    }
}

/// Serializable error info for MCP and JSON responses
#[derive(Debug, Serialize, Clone)]
pub struct ErrorInfo {
    pub message: String,
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl From<&MixError> for ErrorInfo {
    fn from(err: &MixError) -> Self {
        let message = err.to_string();
        match err {
            MixError::NoProjectRootFound { .. } => ErrorInfo {
                message,
                error_type: "no_project_root_found".to_string(),
                suggestion: Some(
                    "Run from inside a Mix project (a directory tree containing mix.exs)"
                        .to_string(),
                ),
                exit_code: None,
            },
            MixError::ToolInvocation {
                exit_code,
                suggestion,
                ..
            } => ErrorInfo {
                message,
                error_type: "tool_invocation".to_string(),
                suggestion: suggestion.clone(),
                exit_code: *exit_code,
            },
            MixError::Timeout { .. } => ErrorInfo {
                message,
                error_type: "timeout".to_string(),
                suggestion: Some(
                    "Increase [mix].timeout or set it to 0 to wait indefinitely".to_string(),
                ),
                exit_code: None,
            },
            MixError::InvalidTask(_) => ErrorInfo {
                message,
                error_type: "invalid_task".to_string(),
                suggestion: Some("Run 'mixhub list' to see available tasks".to_string()),
                exit_code: None,
            },
            MixError::Config(_) => ErrorInfo {
                message,
                error_type: "config_error".to_string(),
                suggestion: Some("Check your mixhub configuration file".to_string()),
                exit_code: None,
            },
            MixError::Io(_) => ErrorInfo {
                message,
                error_type: "io_error".to_string(),
                suggestion: None,
                exit_code: None,
            },
        }
    }
}

/// Suggest fixes for common mix error patterns
pub fn suggest_fix(command: &str, stderr: &str) -> Option<String> {
    if stderr.contains("could not be found") && stderr.contains("The task") {
        return Some("Unknown mix task. Run 'mixhub list' to see available tasks.".to_string());
    }

    if stderr.contains("Could not find a Mix.Project") {
        return Some(
            "No mix.exs in the working directory. Check the project root or use --nearest."
                .to_string(),
        );
    }

    if stderr.contains("Unchecked dependencies") || stderr.contains("mix deps.get") {
        return Some("Dependencies are missing. Run 'mixhub run deps.get' first.".to_string());
    }

    if stderr.contains("Permission denied") {
        return Some(
            "Permission denied. Check file permissions or run with appropriate access.".to_string(),
        );
    }

    if stderr.contains("command not found") || stderr.contains("No such file") {
        if command.contains("mix") {
            return Some(
                "'mix' not found. Install Elixir or set [mix].command in your config.".to_string(),
            );
        }
        return Some("Required command not found. Check PATH and dependencies.".to_string());
    }

    None
}
