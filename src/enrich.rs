//! Best-effort metadata enrichment.
//!
//! After the record is built, the commit/branch and package version fields
//! are filled from a [`VcsProvider`] and a [`PackageProvider`]. Expected
//! failures (not a repository, detached head, unknown package) leave the
//! fields untouched; unexpected package lookup failures propagate.
use std::path::{Path, PathBuf};

use git2::Repository;
use thiserror::Error;

use crate::{Settings, error::Result};

/// Length of the abbreviated commit id.
pub const SHORT_COMMIT_LEN: usize = 8;

/// Commit and branch of the checked out head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsInfo {
    pub commit: String,
    pub branch: String,
}

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("{} is not a repository", .0.display())]
    NotARepository(PathBuf),

    #[error("HEAD is detached")]
    Detached,

    #[error("git: {0}")]
    Git(#[from] git2::Error),
}

#[derive(Debug, Error)]
pub enum PackageLookupError {
    #[error("package `{0}` not found")]
    NotFound(String),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid manifest: {0}")]
    Manifest(#[from] toml::de::Error),
}

/// Source of version-control metadata.
pub trait VcsProvider: Send + Sync {
    fn describe(&self, root: &Path) -> Result<VcsInfo, VcsError>;
}

/// Source of installed package versions.
pub trait PackageProvider: Send + Sync {
    /// Looks up the version of the package called `name` for the project at
    /// `root`. Unknown packages are [`PackageLookupError::NotFound`].
    fn version(&self, root: &Path, name: &str) -> Result<String, PackageLookupError>;
}

/// Reads commit and branch with `git2`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitProvider;

impl VcsProvider for GitProvider {
    fn describe(&self, root: &Path) -> Result<VcsInfo, VcsError> {
        let repo = Repository::open(root).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound => VcsError::NotARepository(root.to_path_buf()),
            _ => VcsError::Git(e),
        })?;

        let head = repo.head()?;
        if !head.is_branch() {
            return Err(VcsError::Detached);
        }
        let branch = head.shorthand().ok_or(VcsError::Detached)?.to_string();

        let mut commit = head.peel_to_commit()?.id().to_string();
        commit.truncate(SHORT_COMMIT_LEN);

        Ok(VcsInfo { commit, branch })
    }
}

/// Resolves the package version from the project's own `pyproject.toml`.
///
/// The manifest answers for the distribution it declares (`project.name` or
/// `tool.poetry.name`); names are compared after PEP 503 normalization.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManifestPackageProvider;

impl PackageProvider for ManifestPackageProvider {
    fn version(&self, root: &Path, name: &str) -> Result<String, PackageLookupError> {
        let not_found = || PackageLookupError::NotFound(name.to_string());

        let manifest = root.join(crate::bump::MANIFEST_FILE_NAME);
        if !manifest.is_file() {
            return Err(not_found());
        }

        let table: toml::Table = toml::from_str(&std::fs::read_to_string(&manifest)?)?;
        let section = |key: &str| {
            crate::bump::manifest_value(&table, key).and_then(|value| value.as_str())
        };

        match (section("name"), section("version")) {
            (Some(declared), Some(version))
                if normalize_package_name(declared) == normalize_package_name(name) =>
            {
                Ok(version.to_string())
            }
            _ => Err(not_found()),
        }
    }
}

/// PEP 503 name normalization: lowercase, runs of `-`, `_` and `.` become `-`.
fn normalize_package_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                normalized.push('-');
            }
            in_separator = true;
        } else {
            normalized.push(c.to_ascii_lowercase());
            in_separator = false;
        }
    }
    normalized
}

/// Fills repository and package metadata on a freshly built record.
pub fn enrich(
    settings: &mut Settings,
    vcs: &dyn VcsProvider,
    packages: &dyn PackageProvider,
) -> Result<()> {
    match vcs.describe(&settings.project_root) {
        Ok(info) => {
            settings.git_commit = Some(info.commit);
            settings.git_branch = Some(info.branch);
        }
        Err(e) => {
            tracing::debug!(error = %e, "Skipping VCS metadata");
        }
    }

    let Some(name) = settings
        .project_root
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
    else {
        return Ok(());
    };

    match packages.version(&settings.project_root, &name) {
        Ok(version) => settings.package_version = Some(version),
        Err(PackageLookupError::NotFound(name)) => {
            tracing::debug!(package = %name, "Package metadata not found");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_package_names() {
        assert_eq!(normalize_package_name("My_Package"), "my-package");
        assert_eq!(normalize_package_name("a.-_b"), "a-b");
        assert_eq!(normalize_package_name("plain"), "plain");
    }
}
