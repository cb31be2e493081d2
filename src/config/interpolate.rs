//! Configuration value interpolation
//!
//! Config values that name programs or environment entries may reference:
//! - `$VAR` or `${VAR}` - Environment variable substitution
//! - `$(command)` - Output of a shell command, trimmed
//!
//! Commands run first so their output is never re-expanded. Unset variables
//! expand to the empty string. Commands run with the current user's
//! permissions, so config files should not be world-writable.

use std::process::Command;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Matches `$(command)`
static COMMAND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\(([^)]+)\)").unwrap());

/// Matches `${VAR}` or `$VAR`; names cannot start with a digit
static ENV_VAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").unwrap()
});

/// Interpolate a string with environment variables and shell commands
///
/// # Examples
///
/// ```
/// use mixhub::config::interpolate::interpolate_string;
///
/// std::env::set_var("MY_VAR", "hello");
/// let result = interpolate_string("Value: $MY_VAR");
/// assert_eq!(result, "Value: hello");
/// std::env::remove_var("MY_VAR");
/// ```
pub fn interpolate_string(s: &str) -> String {
    if !s.contains('$') {
        return s.to_string();
    }

    let with_commands = COMMAND_RE.replace_all(s, |caps: &Captures| {
        let cmd = &caps[1];
        match run_shell(cmd) {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Failed to execute config command '{}': {}", cmd, e);
                // Leave a visible marker instead of silently dropping the value
                format!("$({})_ERROR", cmd)
            }
        }
    });

    ENV_VAR_RE
        .replace_all(&with_commands, |caps: &Captures| {
            let var = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            std::env::var(var).unwrap_or_else(|_| {
                tracing::debug!("Environment variable '{}' not set", var);
                String::new()
            })
        })
        .into_owned()
}

/// Run `cmd` through `sh -c` and return its trimmed stdout
fn run_shell(cmd: &str) -> Result<String, std::io::Error> {
    let output = Command::new("sh").arg("-c").arg(cmd).output()?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(std::io::Error::other(format!("Command failed: {}", stderr.trim())))
    }
}

/// Interpolate the string values of a Config that name programs or env values
pub fn interpolate_config(config: &mut super::model::Config) {
    config.mix.command = interpolate_string(&config.mix.command);
    for value in config.mix.env.values_mut() {
        *value = interpolate_string(value);
    }

    config.shell.program = interpolate_string(&config.shell.program);
    for arg in &mut config.shell.args {
        *arg = interpolate_string(arg);
    }
}
