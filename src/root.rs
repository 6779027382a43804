//! Project root discovery.
//!
//! The project root is the closest directory, starting at the working
//! directory and walking up through its ancestors, that contains one of the
//! [`PROJECT_ROOT_MARKERS`]. Discovery never fails: when no ancestor carries
//! a marker the resolved starting directory is used.

use std::path::{Path, PathBuf};

/// Entries whose presence marks a directory as the project root.
pub const PROJECT_ROOT_MARKERS: &[&str] = &[".git", CONFIG_DIR];

/// Directory (under the project root) holding the settings snapshot.
pub const CONFIG_DIR: &str = ".config";

/// Finds the project root for `start`, or the current working directory when
/// `start` is `None`.
///
/// # Example
///
/// ```rust,no_run
/// use strata_config::find_project_root;
///
/// let root = find_project_root(None);
/// println!("project root: {}", root.display());
/// ```
pub fn find_project_root(start: Option<&Path>) -> PathBuf {
    let current = resolve_start(start);

    for candidate in current.ancestors() {
        if PROJECT_ROOT_MARKERS
            .iter()
            .any(|marker| candidate.join(marker).exists())
        {
            tracing::debug!(root = %candidate.display(), "Found project root");
            return candidate.to_path_buf();
        }
    }

    tracing::debug!(
        start = %current.display(),
        "No project root marker found, using start directory"
    );
    current
}

/// Makes `start` absolute, following symlinks when the path exists.
fn resolve_start(start: Option<&Path>) -> PathBuf {
    let start = match start {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    dunce::canonicalize(&start)
        .or_else(|_| std::path::absolute(&start))
        .unwrap_or(start)
}
