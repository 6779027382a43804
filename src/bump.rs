//! Version bumping across the project manifest and the package entry point.
//!
//! The current version is read from `pyproject.toml` (`[project]` first,
//! `[tool.poetry]` second), bumped, and written back to the manifest and to
//! `src/<root-dir-name>/__init__.py`. Each file is replaced atomically, but
//! the two writes are independent: a failure on the entry point after the
//! manifest was written leaves them out of sync.
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::{NoExpand, Regex};

use crate::{
    atomic::AtomicFile,
    error::{Error, Result},
    version::{Part, Version, validate_prerelease},
};

/// Manifest file expected directly under the project root.
pub const MANIFEST_FILE_NAME: &str = "pyproject.toml";

/// Directory holding the package, relative to the project root.
pub const SOURCE_DIR: &str = "src";

/// File carrying the `__version__` assignment inside the package directory.
pub const ENTRY_POINT_FILE_NAME: &str = "__init__.py";

static MANIFEST_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^version\s*=\s*"(.*?)""#).expect("manifest pattern is valid")
});

static ENTRY_POINT_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^__version__\s*=\s*"(.*?)""#).expect("entry point pattern is valid")
});

/// Path of the package entry point for `root`.
pub fn entry_point_path(root: &Path) -> PathBuf {
    let package = root.file_name().unwrap_or(root.as_os_str());
    root.join(SOURCE_DIR).join(package).join(ENTRY_POINT_FILE_NAME)
}

/// Bumps the project version at `root` and returns the new version.
///
/// With `dry_run` nothing is written.
///
/// # Errors
///
/// - [`Error::ManifestMissing`] / [`Error::EntryPointMissing`] before anything
///   is read.
/// - [`Error::VersionKeyMissing`] or [`Error::VersionParse`] when the manifest
///   has no usable version.
/// - [`Error::VersionOverflow`] when the bumped component is already at
///   `u64::MAX`.
/// - [`Error::SubstitutionFailed`] when the manifest has no
///   `version = "..."` line to rewrite; the entry point is left untouched.
///
/// # Example
///
/// ```rust,no_run
/// use strata_config::{Part, bump_at_project_root, find_project_root};
///
/// let root = find_project_root(None);
/// let next = bump_at_project_root(&root, Part::Minor, Some("rc.1"), true)?;
/// println!("would set version to {next}");
/// # Ok::<(), strata_config::Error>(())
/// ```
pub fn bump_at_project_root(
    root: &Path,
    part: Part,
    prerelease: Option<&str>,
    dry_run: bool,
) -> Result<Version> {
    let manifest = root.join(MANIFEST_FILE_NAME);
    if !manifest.exists() {
        return Err(Error::ManifestMissing(root.to_path_buf()));
    }

    let entry_point = entry_point_path(root);
    if !entry_point.exists() {
        return Err(Error::EntryPointMissing(entry_point));
    }

    if let Some(pre) = prerelease.filter(|p| !p.is_empty()) {
        validate_prerelease(pre)?;
    }

    let manifest = AtomicFile::new(manifest);
    let current = read_version(&manifest)?;
    let bumped = current.bump(part, prerelease)?;
    tracing::debug!(%current, %bumped, %part, dry_run, "Computed version bump");

    if !dry_run {
        write_manifest(&manifest, &bumped)?;
        write_entry_point(&AtomicFile::new(entry_point), &bumped)?;
        tracing::info!(version = %bumped, "Bumped project version");
    }

    Ok(bumped)
}

/// Looks up `key` under `[project]`, falling back to `[tool.poetry]`.
///
/// An empty string under `[project]` counts as absent.
pub(crate) fn manifest_value<'a>(table: &'a toml::Table, key: &str) -> Option<&'a toml::Value> {
    let project = table.get("project").and_then(|p| p.get(key));
    let poetry = table
        .get("tool")
        .and_then(|t| t.get("poetry"))
        .and_then(|p| p.get(key));

    project
        .filter(|value| value.as_str() != Some(""))
        .or(poetry)
}

fn read_version(manifest: &AtomicFile) -> Result<Version> {
    let table: toml::Table = toml::from_str(&manifest.read()?)?;
    let version = manifest_value(&table, "version")
        .and_then(|value| value.as_str())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::VersionKeyMissing(manifest.path().to_path_buf()))?;
    Version::parse(version)
}

fn write_manifest(manifest: &AtomicFile, version: &Version) -> Result<()> {
    let text = manifest.read()?;
    let updated = replace_manifest_version(&text, version)
        .ok_or_else(|| Error::SubstitutionFailed(manifest.path().to_path_buf()))?;
    manifest.write(&updated)
}

fn write_entry_point(entry_point: &AtomicFile, version: &Version) -> Result<()> {
    let text = entry_point.read()?;
    entry_point.write(&replace_entry_point_version(&text, version))
}

/// Replaces the first `version = "..."` line, or `None` if there is none.
fn replace_manifest_version(text: &str, version: &Version) -> Option<String> {
    if !MANIFEST_VERSION.is_match(text) {
        return None;
    }
    let line = format!(r#"version = "{version}""#);
    Some(MANIFEST_VERSION.replace(text, NoExpand(&line)).into_owned())
}

/// Replaces the first `__version__ = "..."` line, prepending one when absent.
fn replace_entry_point_version(text: &str, version: &Version) -> String {
    let line = format!(r#"__version__ = "{version}""#);
    if ENTRY_POINT_VERSION.is_match(text) {
        ENTRY_POINT_VERSION
            .replace(text, NoExpand(&line))
            .into_owned()
    } else {
        format!("{line}\n{text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_substitution_touches_first_line_only() {
        let text = "[project]\nname = \"demo\"\nversion = \"1.0.0\"\n\n[tool.other]\nversion = \"9.9.9\"\n";
        let updated =
            replace_manifest_version(text, &Version::new(1, 0, 1)).expect("pattern present");
        assert_eq!(
            updated,
            "[project]\nname = \"demo\"\nversion = \"1.0.1\"\n\n[tool.other]\nversion = \"9.9.9\"\n"
        );
    }

    #[test]
    fn manifest_substitution_requires_line_start() {
        let text = "[project]\nmy_version = \"1.0.0\"\n";
        assert_eq!(replace_manifest_version(text, &Version::new(2, 0, 0)), None);
    }

    #[test]
    fn entry_point_assignment_is_prepended_when_missing() {
        let updated = replace_entry_point_version("import os\n", &Version::new(0, 2, 0));
        assert_eq!(updated, "__version__ = \"0.2.0\"\nimport os\n");
    }

    #[test]
    fn entry_point_assignment_is_rewritten() {
        let updated = replace_entry_point_version(
            "\"\"\"Docs.\"\"\"\n__version__ = \"0.1.0\"\n",
            &Version::new(0, 2, 0)
                .with_prerelease(Some("rc.1"))
                .expect("valid prerelease"),
        );
        assert_eq!(updated, "\"\"\"Docs.\"\"\"\n__version__ = \"0.2.0-rc.1\"\n");
    }

    #[test]
    fn poetry_table_is_the_fallback() {
        let table: toml::Table =
            toml::from_str("[tool.poetry]\nversion = \"3.1.4\"\n").expect("valid toml");
        assert_eq!(
            manifest_value(&table, "version").and_then(|v| v.as_str()),
            Some("3.1.4")
        );
    }
}
