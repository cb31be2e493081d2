//! Configuration loader with XDG-compliant path resolution
//!
//! Loads configuration from multiple locations with layered priority:
//! 1. `/etc/mixhub/config.toml` (lowest priority)
//! 2. `~/.config/mixhub/config.toml`
//! 3. `~/.mixhub.toml`
//! 4. `./.mixhub.toml`
//! 5. `--config <file>`
//! 6. `MIXHUB_*` environment variables (highest priority)

use std::path::PathBuf;

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use super::interpolate::interpolate_config;
use super::model::Config;
use crate::error::MixError;

/// Application name used for XDG directories
const APP_NAME: &str = "mixhub";

/// Prefix for environment overrides
const ENV_PREFIX: &str = "MIXHUB_";

/// Get XDG config search paths in priority order (lowest to highest)
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from(format!("/etc/{}/config.toml", APP_NAME)));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join(APP_NAME).join("config.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(format!(".{}.toml", APP_NAME)));
    }

    paths.push(PathBuf::from(format!(".{}.toml", APP_NAME)));

    paths
}

/// Build the layered figment without extracting it
fn figment(override_path: Option<&str>) -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

    for path in config_paths() {
        if path.exists() {
            tracing::debug!("Loading config from: {}", path.display());
            figment = figment.merge(Toml::file(&path));
        }
    }

    if let Some(path) = override_path {
        let path = PathBuf::from(path);
        if path.exists() {
            tracing::debug!("Loading override config from: {}", path.display());
            figment = figment.merge(Toml::file(&path));
        } else {
            tracing::warn!("Override config not found: {}", path.display());
        }
    }

    // Format: MIXHUB_PROJECT__PREFER_UMBRELLA=false
    // Maps to: project.prefer_umbrella = false
    figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load configuration without interpolating values
///
/// Invalid values in any layer surface as [`MixError::Config`].
pub fn load_raw_config(override_path: Option<&str>) -> Result<Config> {
    let config = figment(override_path)
        .extract()
        .map_err(|e| MixError::Config(e.to_string()))?;
    Ok(config)
}

/// Load configuration with XDG layering and value interpolation
///
/// # Arguments
/// * `override_path` - Optional path to a config file that takes priority over files
pub fn load_config(override_path: Option<&str>) -> Result<Config> {
    let mut config = load_raw_config(override_path)?;
    interpolate_config(&mut config);
    Ok(config)
}

/// Find all existing config files (for debugging/introspection)
pub fn find_config_files() -> Vec<PathBuf> {
    config_paths().into_iter().filter(|p| p.exists()).collect()
}
