//! The resolved settings record.
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use serde_value::Value;

use crate::{
    Extension,
    env::EnvMap,
    error::{Error, Result},
    registry::Schema,
    root::CONFIG_DIR,
};

/// File name of the snapshot written under [`CONFIG_DIR`].
pub const SNAPSHOT_FILE_NAME: &str = "strata.toml";

/// Project settings resolved from the env-file cascade, the process
/// environment, explicit overrides and repository metadata.
///
/// Besides the built-in fields, the record keeps every extension field
/// (coerced to its declared kind) and every undeclared variable (as a string)
/// in an auxiliary map. Extension values are read back with
/// [`extension`](Settings::extension) or [`get`](Settings::get).
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub project_root: PathBuf,
    /// Env files selected for merging, deepest first.
    pub env_files: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,

    #[serde(flatten)]
    extra: BTreeMap<String, Value>,

    #[serde(skip)]
    schema: Arc<Schema>,
}

impl Settings {
    /// Validates `merged` against `schema` and builds the record.
    ///
    /// `default_root` is only consulted when the merged environment does not
    /// define `project_root` itself.
    pub fn from_env(
        merged: EnvMap,
        schema: Arc<Schema>,
        default_root: impl FnOnce() -> PathBuf,
    ) -> Result<Self> {
        let mut project_root = None;
        let mut package_version = None;
        let mut git_commit = None;
        let mut git_branch = None;
        let mut extra = BTreeMap::new();

        for (key, raw) in merged {
            match key.as_str() {
                "project_root" => project_root = Some(PathBuf::from(raw)),
                "package_version" => package_version = Some(raw),
                "git_commit" => git_commit = Some(raw),
                "git_branch" => git_branch = Some(raw),
                // Always replaced by the discovered cascade.
                "env_files" => {}
                _ => match schema.field_for_key(&key) {
                    Some(field) => {
                        let value = field.parse(&raw).map_err(|reason| Error::Validation {
                            field: field.name().to_string(),
                            reason,
                        })?;
                        extra.insert(field.name().to_string(), value);
                    }
                    // A field read from another key owns its name.
                    None if schema.field(&key).is_some() => {
                        tracing::debug!(key = %key, "Ignoring variable shadowing an extension field");
                    }
                    None => {
                        extra.insert(key, Value::String(raw));
                    }
                },
            }
        }

        for field in schema.fields() {
            if extra.contains_key(field.name()) {
                continue;
            }
            if let Some(raw) = field.default_raw() {
                let value = field.parse(raw).map_err(|reason| Error::Validation {
                    field: field.name().to_string(),
                    reason: format!("invalid default: {reason}"),
                })?;
                extra.insert(field.name().to_string(), value);
            } else if field.is_required() {
                return Err(Error::Validation {
                    field: field.name().to_string(),
                    reason: format!("missing required value (set `{}`)", field.key()),
                });
            }
        }

        Ok(Self {
            project_root: project_root.unwrap_or_else(default_root),
            env_files: Vec::new(),
            package_version,
            git_commit,
            git_branch,
            extra,
            schema,
        })
    }

    /// Returns the typed view of a registered extension.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// #[derive(Debug, Deserialize, Extension)]
    /// struct Server {
    ///     #[extension(default = "8080")]
    ///     port: u16,
    /// }
    ///
    /// let server = settings.extension::<Server>()?;
    /// println!("listening on {}", server.port);
    /// ```
    pub fn extension<E: Extension>(&self) -> Result<E> {
        if !self.schema.contains_extension(E::NAME) {
            return Err(Error::UnregisteredExtension(E::NAME.to_string()));
        }

        let map = E::fields()
            .iter()
            .filter_map(|field| {
                self.extra
                    .get(field.name())
                    .map(|value| (Value::String(field.name().to_string()), value.clone()))
            })
            .collect();

        Ok(E::deserialize(Value::Map(map))?)
    }

    /// Returns an extension field or undeclared variable by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Returns the value under `key` when it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.extra.get(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Flattens the record into `(name, display value)` pairs. Unset optional
    /// fields are omitted and path lists are joined with `:`.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries = vec![
            (
                "project_root".to_string(),
                self.project_root.display().to_string(),
            ),
            (
                "env_files".to_string(),
                self.env_files
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(":"),
            ),
        ];

        for (name, value) in [
            ("package_version", &self.package_version),
            ("git_commit", &self.git_commit),
            ("git_branch", &self.git_branch),
        ] {
            if let Some(value) = value {
                entries.push((name.to_string(), value.clone()));
            }
        }

        entries.extend(
            self.extra
                .iter()
                .map(|(key, value)| (key.clone(), display_value(value))),
        );
        entries
    }

    /// Pretty TOML rendering, the same text written to the snapshot.
    pub fn to_toml_pretty(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Location of the snapshot for this record.
    pub fn snapshot_path(&self) -> PathBuf {
        snapshot_path(&self.project_root)
    }
}

pub(crate) fn snapshot_path(root: &Path) -> PathBuf {
    root.join(CONFIG_DIR).join(SNAPSHOT_FILE_NAME)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::I64(n) => n.to_string(),
        Value::U64(n) => n.to_string(),
        Value::F64(n) => n.to_string(),
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExtensionDescriptor, ExtensionRegistry, FieldKind, FieldSpec};

    fn schema() -> Arc<Schema> {
        let mut registry = ExtensionRegistry::new();
        registry
            .register_descriptor(ExtensionDescriptor::new(
                "server",
                vec![
                    FieldSpec::new("port", FieldKind::INTEGER).default_value("8080"),
                    FieldSpec::new("host", FieldKind::String).env_key("SERVER_HOST"),
                    FieldSpec::new("debug", FieldKind::Bool).optional(),
                ],
            ))
            .expect("register");
        registry.freeze()
    }

    fn env(pairs: &[(&str, &str)]) -> EnvMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn builds_typed_and_extra_fields() {
        let settings = Settings::from_env(
            env(&[("SERVER_HOST", "localhost"), ("EDITOR", "vim")]),
            schema(),
            || PathBuf::from("/project"),
        )
        .expect("valid settings");

        assert_eq!(settings.project_root, PathBuf::from("/project"));
        assert_eq!(settings.get("port"), Some(&Value::I64(8080)));
        assert_eq!(settings.get_str("host"), Some("localhost"));
        assert_eq!(settings.get_str("EDITOR"), Some("vim"));
        assert_eq!(settings.get("debug"), None);
    }

    #[test]
    fn missing_required_field_fails() {
        let err = Settings::from_env(EnvMap::new(), schema(), || PathBuf::from("/p"))
            .expect_err("host is required");
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "host"));
    }

    #[test]
    fn incompatible_value_fails() {
        let err = Settings::from_env(
            env(&[("SERVER_HOST", "h"), ("port", "eighty")]),
            schema(),
            || PathBuf::from("/p"),
        )
        .expect_err("port is not an integer");
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "port"));
    }

    #[test]
    fn merged_project_root_wins_over_default() {
        let settings = Settings::from_env(
            env(&[("SERVER_HOST", "h"), ("project_root", "/elsewhere")]),
            schema(),
            || PathBuf::from("/p"),
        )
        .expect("valid settings");
        assert_eq!(settings.project_root, PathBuf::from("/elsewhere"));
    }
}
