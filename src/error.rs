use std::path::PathBuf;

use thiserror::Error;

use crate::enrich::PackageLookupError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization: {0}")]
    Serialization(#[from] serde_value::SerializerError),

    #[error("Deserialization: {0}")]
    Deserialization(#[from] serde_value::DeserializerError),

    #[error("TOML Serialization: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    #[error("TOML Deserialization: {0}")]
    TomlDeserialization(#[from] toml::de::Error),

    #[error("Persist: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Failed to read env file {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    /// The merged environment does not satisfy the settings schema.
    ///
    /// Raised for missing required extension fields, values that cannot be
    /// coerced to the declared [`FieldKind`](crate::FieldKind), and values
    /// rejected by a field validator.
    #[error("Invalid setting `{field}`: {reason}")]
    Validation { field: String, reason: String },

    /// An extension declared a field that already exists in the schema.
    ///
    /// Base fields (`project_root`, `env_files`, ...) can never be redefined,
    /// and two extensions cannot declare the same field or lookup key.
    #[error("Extension `{extension}` redefines field `{field}`")]
    FieldConflict { extension: String, field: String },

    #[error("Extension `{0}` is already registered")]
    DuplicateExtension(String),

    /// The registry was asked to accept an extension after settings were
    /// resolved. The schema is frozen at that point.
    #[error("Cannot register extension `{0}`: settings are already resolved")]
    RegistryFrozen(String),

    /// Typed access to an extension that is not part of the resolved schema.
    ///
    /// The contained string is the extension's `NAME`.
    #[error("Extension not registered: {0}")]
    UnregisteredExtension(String),

    #[error("Package lookup failed: {0}")]
    PackageLookup(#[from] PackageLookupError),

    #[error("'{0}' is not valid SemVer.")]
    VersionParse(String),

    #[error("Unknown version part '{0}', expected one of: major, minor, patch")]
    InvalidPart(String),

    #[error("Invalid prerelease identifier '{0}'")]
    InvalidPrerelease(String),

    #[error("Cannot bump {part} of {version}: component is at its maximum")]
    VersionOverflow {
        version: String,
        part: crate::version::Part,
    },

    #[error("pyproject.toml not found at project root {}", .0.display())]
    ManifestMissing(PathBuf),

    #[error("Package __init__ not found at {}", .0.display())]
    EntryPointMissing(PathBuf),

    #[error("Could not find 'version' key in {}", .0.display())]
    VersionKeyMissing(PathBuf),

    #[error("Failed to update version in {}", .0.display())]
    SubstitutionFailed(PathBuf),

    #[error("Invalid resolver options: {0}")]
    Options(#[from] crate::resolver::ResolverBuilderError),
}
