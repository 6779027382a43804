//! Extension registry and the composed settings schema.
//!
//! Extensions are registered in order and folded into a single [`Schema`]
//! the first time settings are resolved. From then on the registry is frozen
//! and further registrations fail with [`Error::RegistryFrozen`].
//!
//! # Example
//!
//! ```rust
//! use strata_config::{ExtensionDescriptor, ExtensionRegistry, FieldKind, FieldSpec};
//!
//! let mut registry = ExtensionRegistry::new();
//! registry.register_descriptor(ExtensionDescriptor::new(
//!     "server",
//!     vec![FieldSpec::new("port", FieldKind::INTEGER).default_value("8080")],
//! ))?;
//!
//! let schema = registry.freeze();
//! assert!(schema.field("port").is_some());
//! assert!(registry.register_descriptor(ExtensionDescriptor::new("late", vec![])).is_err());
//! # Ok::<(), strata_config::Error>(())
//! ```
use std::sync::Arc;

use crate::{
    Extension, ExtensionDescriptor, FieldSpec, RegisteredExtension,
    error::{Error, Result},
};

/// Names of the fields every settings record carries.
pub const BASE_FIELDS: &[&str] = &[
    "project_root",
    "env_files",
    "package_version",
    "git_commit",
    "git_branch",
];

/// The composed set of extension fields, in registration order.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    extensions: Vec<String>,
    fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Finds the field read from the merged-environment `key`.
    pub fn field_for_key(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key() == key)
    }

    pub fn contains_extension(&self, name: &str) -> bool {
        self.extensions.iter().any(|e| e == name)
    }
}

/// Collects extensions before the first resolution.
#[derive(Debug, Default, Clone)]
pub struct ExtensionRegistry {
    extensions: Vec<ExtensionDescriptor>,
    frozen: Option<Arc<Schema>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every extension submitted with
    /// [`submit_extension!`](crate::submit_extension).
    ///
    /// Link-time submissions have no meaningful order, so they are sorted by
    /// name to keep the composed schema deterministic.
    pub fn from_submitted() -> Result<Self> {
        let mut descriptors: Vec<ExtensionDescriptor> = inventory::iter::<RegisteredExtension>
            .into_iter()
            .map(|registration| (registration.descriptor)())
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));

        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.register_descriptor(descriptor)?;
        }
        Ok(registry)
    }

    pub fn register<E: Extension>(&mut self) -> Result<&mut Self> {
        self.register_descriptor(E::descriptor())
    }

    /// Appends an extension, rejecting it when the schema is frozen, when an
    /// extension of the same name exists, or when any of its fields collides
    /// with a base field or a previously registered field.
    pub fn register_descriptor(&mut self, descriptor: ExtensionDescriptor) -> Result<&mut Self> {
        if self.frozen.is_some() {
            return Err(Error::RegistryFrozen(descriptor.name));
        }
        if self.extensions.iter().any(|e| e.name == descriptor.name) {
            return Err(Error::DuplicateExtension(descriptor.name));
        }

        for (i, field) in descriptor.fields.iter().enumerate() {
            let conflict = |name: &str| Error::FieldConflict {
                extension: descriptor.name.clone(),
                field: name.to_string(),
            };

            for name in [field.name(), field.key()] {
                if BASE_FIELDS.contains(&name) {
                    return Err(conflict(name));
                }
            }

            let earlier = self
                .extensions
                .iter()
                .flat_map(|e| e.fields.iter())
                .chain(descriptor.fields[..i].iter());
            for other in earlier {
                if other.name() == field.name() || other.key() == field.key() {
                    return Err(conflict(field.name()));
                }
            }
        }

        tracing::debug!(extension = %descriptor.name, fields = descriptor.fields.len(), "Registered extension");
        self.extensions.push(descriptor);
        Ok(self)
    }

    /// Folds the registered extensions into a schema without freezing.
    pub fn build_schema(&self) -> Schema {
        Schema {
            extensions: self.extensions.iter().map(|e| e.name.clone()).collect(),
            fields: self
                .extensions
                .iter()
                .flat_map(|e| e.fields.iter().cloned())
                .collect(),
        }
    }

    /// Freezes the registry and returns the composed schema.
    ///
    /// Repeated calls return the same `Arc`.
    pub fn freeze(&mut self) -> Arc<Schema> {
        if let Some(schema) = &self.frozen {
            return Arc::clone(schema);
        }

        let schema = Arc::new(self.build_schema());
        tracing::debug!(extensions = ?schema.extensions(), "Froze settings schema");
        self.frozen = Some(Arc::clone(&schema));
        schema
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }
}
