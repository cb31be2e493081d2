//! Common test utilities for mixhub tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Minimal mix.exs content
pub const SAMPLE_MIX_EXS: &str = r#"defmodule App.MixProject do
  use Mix.Project

  def project do
    [app: :app, version: "0.1.0"]
  end
end
"#;

/// Stand-in for the mix executable
///
/// `help` prints a realistic task listing, `compile` reports the working
/// directory and a source location, `echo` prints its env and arguments,
/// anything else fails like an unknown task.
pub const FAKE_MIX: &str = r#"#!/bin/sh
case "$1" in
    help)
        echo 'mix                   # Runs the default task (current: "mix run")'
        echo 'mix compile           # Compiles source files'
        echo 'mix deps.get          # Gets all out of date dependencies'
        echo 'mix test              # Runs a project'"'"'s tests'
        echo 'iex -S mix            # Starts IEx and runs the default task'
        ;;
    compile)
        echo "Compiling in $(pwd)"
        echo "warning: variable \"x\" is unused" >&2
        echo "  lib/app.ex:7: App.run/0" >&2
        ;;
    echo)
        shift
        echo "MIX_ENV=$MIX_ENV args=$*"
        ;;
    *)
        echo "** (Mix) The task \"$1\" could not be found" >&2
        exit 1
        ;;
esac
"#;

/// Write `mix.exs` into `dir`, creating it if needed
pub fn write_marker(dir: &Path) {
    std::fs::create_dir_all(dir).expect("Failed to create project dir");
    std::fs::write(dir.join("mix.exs"), SAMPLE_MIX_EXS).expect("Failed to write mix.exs");
}

/// Creates a temporary single Mix project
pub fn create_mix_project() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_marker(dir.path());
    let path = dir.path().to_path_buf();
    (dir, path)
}

/// Creates an umbrella project with one app under `apps/web`
///
/// Returns the temp dir, the umbrella root, and the app root.
pub fn create_umbrella_project() -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let umbrella = dir.path().to_path_buf();
    let app = umbrella.join("apps").join("web");
    write_marker(&umbrella);
    write_marker(&app);
    std::fs::create_dir_all(app.join("lib").join("web")).expect("Failed to create lib dir");
    (dir, umbrella, app)
}

/// Creates a temporary directory with no mix.exs
pub fn create_empty_dir() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().to_path_buf();
    (dir, path)
}

/// Write an executable script into `dir`
pub fn write_script(dir: &Path, name: &str, content: &str) -> PathBuf {
    let script_path = dir.join(name);
    std::fs::write(&script_path, content).expect("Failed to write script");

    // Make script executable on Unix
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&script_path)
            .expect("Failed to get metadata")
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script_path, perms).expect("Failed to set permissions");
    }

    script_path
}

/// Creates a directory holding the fake `mix` executable
pub fn create_fake_mix() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_script(dir.path(), "mix", FAKE_MIX);
    (dir, path)
}

/// Whether some ancestor of `dir` already contains mix.exs
pub fn marker_above(dir: &Path) -> bool {
    dir.ancestors().skip(1).any(|d| d.join("mix.exs").is_file())
}

/// Canonical form of a path for comparing printed roots
pub fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().expect("Failed to canonicalize path")
}
