//! Environment-file cascade.
//!
//! Every file under the project root whose name ends in `.env` takes part in
//! the cascade. Files are ordered deepest first; merging walks that order in
//! reverse so a deeper file overrides a shallower one on key conflict. The
//! live process environment is layered on top, and explicit overrides on top
//! of that.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Suffix identifying environment-definition files.
pub const ENV_FILE_SUFFIX: &str = ".env";

/// Flat variable name to value mapping produced by the cascade.
pub type EnvMap = BTreeMap<String, String>;

/// A discovered environment file and its depth below the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvFile {
    pub path: PathBuf,
    /// Number of path segments relative to the root (`root/.env` is 1).
    pub depth: usize,
}

impl EnvFile {
    fn new(root: &Path, path: PathBuf) -> Self {
        let depth = path
            .strip_prefix(root)
            .map(|rel| rel.components().count())
            .unwrap_or_else(|_| path.components().count());
        Self { path, depth }
    }
}

fn is_env_file(name: &str) -> bool {
    name.ends_with(ENV_FILE_SUFFIX)
}

/// Recursively collects the env files under `root`, deepest first.
///
/// The directory walk is sorted by file name and the depth sort is stable, so
/// files at equal depth keep a deterministic order for a given tree.
pub fn gather_env_files(root: &Path) -> Vec<EnvFile> {
    let mut files: Vec<EnvFile> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unreadable entry during env discovery");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_str().is_some_and(is_env_file))
        .map(|entry| EnvFile::new(root, entry.into_path()))
        .collect();

    files.sort_by(|a, b| b.depth.cmp(&a.depth));
    files
}

/// Merges `files` (deepest first) into one mapping where the deepest file
/// wins on key conflict.
pub fn load_env_files(files: &[EnvFile]) -> Result<EnvMap> {
    let mut merged = EnvMap::new();
    for file in files.iter().rev() {
        let values = read_env_file(&file.path)?;
        tracing::debug!(
            path = %file.path.display(),
            depth = file.depth,
            keys = values.len(),
            "Merging env file"
        );
        merged.extend(values);
    }
    Ok(merged)
}

/// Parses a single dotenv file.
///
/// Lines without an assignment (a bare `KEY`) carry no value and are dropped
/// instead of erasing an earlier definition.
fn read_env_file(path: &Path) -> Result<EnvMap> {
    let env_error = |source| Error::EnvFile {
        path: path.to_path_buf(),
        source,
    };

    let mut values = EnvMap::new();
    for item in dotenvy::from_path_iter(path).map_err(env_error)? {
        match item {
            Ok((key, value)) if !key.is_empty() => {
                values.insert(key, value);
            }
            Ok(_) => {}
            Err(dotenvy::Error::LineParse(line, index)) => {
                tracing::warn!(
                    path = %path.display(),
                    line = %line,
                    index,
                    "Ignoring env line without a value"
                );
            }
            Err(e) => return Err(env_error(e)),
        }
    }
    Ok(values)
}

/// Layers the env-file values, the process environment and explicit
/// overrides, in increasing order of precedence.
pub fn merge_layers(
    files: EnvMap,
    process: impl IntoIterator<Item = (String, String)>,
    overrides: &Overrides,
) -> EnvMap {
    let mut merged = files;
    merged.extend(process.into_iter().filter(|(key, _)| !key.is_empty()));
    merged.extend(
        overrides
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string())),
    );
    merged
}

/// Reads the live process environment, skipping entries that are not UTF-8.
pub fn process_env() -> EnvMap {
    std::env::vars_os()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                tracing::debug!(key = ?key, "Skipping non UTF-8 environment variable");
                None
            }
        })
        .collect()
}

/// Caller-supplied values that take precedence over every other source.
///
/// # Example
///
/// ```rust
/// use strata_config::Overrides;
///
/// let overrides = Overrides::new()
///     .set("log_level", "debug")
///     .set("port", "9000");
/// assert_eq!(overrides.get("port"), Some("9000"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    values: EnvMap,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if !key.is_empty() {
            self.values.insert(key, value.into());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Overrides
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |overrides, (k, v)| overrides.set(k, v))
    }
}
