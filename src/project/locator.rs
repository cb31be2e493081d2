//! Mix project root discovery
//!
//! Walks the filesystem upward from a starting directory looking for the
//! `mix.exs` marker. Two policies are supported:
//! - **nearest** - the closest ancestor (including the start) with a marker
//! - **umbrella** - the outermost ancestor reachable by repeating the nearest
//!   search from the parent of each match
//!
//! The search only performs existence checks and never caches results. Each
//! step moves to a strictly shorter path, so a walk ends at the filesystem
//! root however deep the start is.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::MixError;

/// File whose presence marks a directory as a Mix project root
pub const MARKER_FILE: &str = "mix.exs";

/// Both roots found by a single discovery pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRoots {
    /// Closest directory containing `mix.exs`
    pub nearest: PathBuf,
    /// Outermost directory containing `mix.exs`
    pub umbrella: PathBuf,
}

impl ProjectRoots {
    /// Select the root according to the umbrella preference
    pub fn select(&self, prefer_umbrella: bool) -> &Path {
        if prefer_umbrella {
            &self.umbrella
        } else {
            &self.nearest
        }
    }

    /// Whether the nearest root is nested inside an umbrella
    pub fn is_nested(&self) -> bool {
        self.nearest != self.umbrella
    }
}

/// Whether `dir` contains the marker file
pub fn is_project_root(dir: &Path) -> bool {
    dir.join(MARKER_FILE).is_file()
}

/// Make a start path absolute, resolving symlinks when the path exists
fn absolutize(start: &Path) -> PathBuf {
    if let Ok(canonical) = start.canonicalize() {
        return canonical;
    }

    if start.is_absolute() {
        start.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(start))
            .unwrap_or_else(|_| start.to_path_buf())
    }
}

/// Nearest search from an already absolute start
fn nearest_from(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if is_project_root(&current) {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Find the closest ancestor of `start` (inclusive) that contains `mix.exs`
///
/// Returns `None` when the filesystem root is reached without a match.
pub fn find_nearest_root(start: &Path) -> Option<PathBuf> {
    nearest_from(&absolutize(start))
}

/// Find both the nearest and the umbrella root for `start`
///
/// The umbrella root is found by restarting the nearest search from the
/// parent of each match until a search fails. Marker-less directories in
/// between two matches are skipped over.
pub fn discover_roots(start: &Path) -> Option<ProjectRoots> {
    let nearest = nearest_from(&absolutize(start))?;
    let mut umbrella = nearest.clone();

    while let Some(outer) = umbrella.parent().and_then(nearest_from) {
        umbrella = outer;
    }

    tracing::debug!(
        "Discovered roots: nearest={} umbrella={}",
        nearest.display(),
        umbrella.display()
    );

    Some(ProjectRoots { nearest, umbrella })
}

/// Find the project root for `start`
///
/// With `prefer_umbrella` the outermost root is returned, otherwise the
/// nearest one. A non-nested project yields the same directory either way.
pub fn find_project_root(start: &Path, prefer_umbrella: bool) -> Option<PathBuf> {
    if prefer_umbrella {
        discover_roots(start).map(|roots| roots.umbrella)
    } else {
        find_nearest_root(start)
    }
}

/// Like [`find_project_root`] but reports absence as an error
pub fn resolve_project_root(start: &Path, prefer_umbrella: bool) -> Result<PathBuf, MixError> {
    find_project_root(start, prefer_umbrella).ok_or_else(|| MixError::NoProjectRootFound {
        start: start.display().to_string(),
    })
}

/// Directory to open a shell in: the project root, or `start` itself
pub fn shell_directory(start: &Path, prefer_umbrella: bool) -> PathBuf {
    match find_project_root(start, prefer_umbrella) {
        Some(root) => root,
        None => {
            tracing::warn!(
                "No {} found above {}, using it as the shell directory",
                MARKER_FILE,
                start.display()
            );
            absolutize(start)
        }
    }
}
