//! Configuration model for mixhub
//!
//! Defines the structure for XDG-compliant layered configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::executor::MAX_OUTPUT_SIZE;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Project root discovery
    #[serde(default)]
    pub project: ProjectConfig,

    /// How mix is invoked
    #[serde(default)]
    pub mix: MixConfig,

    /// Interactive shell launched by `mixhub shell`
    #[serde(default)]
    pub shell: ShellConfig,
}

/// Project root discovery settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectConfig {
    /// Prefer the umbrella root over the nearest project root
    #[serde(default = "default_prefer_umbrella")]
    pub prefer_umbrella: bool,
}

fn default_prefer_umbrella() -> bool {
    true
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            prefer_umbrella: default_prefer_umbrella(),
        }
    }
}

/// mix invocation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MixConfig {
    /// Command to execute mix
    #[serde(default = "default_mix_command")]
    pub command: String,

    /// Task run by `mixhub compile`
    #[serde(default = "default_compile_task")]
    pub compile_task: String,

    /// Timeout in seconds for task runs (0 = wait indefinitely)
    #[serde(default)]
    pub timeout: u64,

    /// Bytes of combined output kept in run results
    #[serde(default = "default_max_output_size")]
    pub max_output_size: usize,

    /// Extra environment for task runs
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_mix_command() -> String {
    "mix".to_string()
}

fn default_compile_task() -> String {
    "compile".to_string()
}

fn default_max_output_size() -> usize {
    MAX_OUTPUT_SIZE
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            command: default_mix_command(),
            compile_task: default_compile_task(),
            timeout: 0,
            max_output_size: default_max_output_size(),
            env: HashMap::new(),
        }
    }
}

/// Interactive shell settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShellConfig {
    /// Shell program, interpolated before use
    #[serde(default = "default_shell_program")]
    pub program: String,

    /// Arguments passed to the shell
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_shell_program() -> String {
    "${SHELL}".to_string()
}

/// Shell used when the configured program is empty
pub const FALLBACK_SHELL: &str = "/bin/sh";

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: default_shell_program(),
            args: Vec::new(),
        }
    }
}

impl ShellConfig {
    /// Program to launch, falling back to `/bin/sh`
    pub fn effective_program(&self) -> &str {
        let program = self.program.trim();
        if program.is_empty() || program.contains('$') {
            FALLBACK_SHELL
        } else {
            program
        }
    }
}

impl Config {
    /// Umbrella preference, optionally forced to nearest for one call
    pub fn prefer_umbrella(&self, force_nearest: bool) -> bool {
        self.project.prefer_umbrella && !force_nearest
    }
}
