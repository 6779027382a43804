//! One-time settings resolution.
//!
//! A [`Resolver`] owns the extension registry and the enrichment providers
//! and produces exactly one [`Settings`] record. The first call to
//! [`Resolver::init`] runs the whole pipeline:
//!
//! 1. freeze the registry into a schema,
//! 2. find the project root,
//! 3. gather and merge the env-file cascade,
//! 4. layer the process environment and the overrides on top,
//! 5. validate and build the record, recording the env files used,
//! 6. enrich it with repository and package metadata,
//! 7. write the snapshot to `<root>/.config/strata.toml`.
//!
//! Every later call returns the same record and ignores its arguments.
//!
//! # Example
//!
//! ```rust,no_run
//! use strata_config::{Overrides, Resolver};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut resolver = Resolver::builder().build()?;
//! let settings = resolver.init(Overrides::new().set("log_level", "debug"))?;
//! println!("root: {}", settings.project_root.display());
//! # Ok(())
//! # }
//! ```
use std::path::PathBuf;

use derive_builder::Builder;

use crate::{
    Extension, ExtensionDescriptor, ExtensionRegistry, Settings,
    atomic::AtomicFile,
    enrich::{GitProvider, ManifestPackageProvider, PackageProvider, VcsProvider, enrich},
    env::{self, EnvMap, Overrides},
    error::Result,
    root::find_project_root,
};

#[derive(Builder)]
#[builder(pattern = "owned")]
pub struct Resolver {
    /// Extensions composed into the schema on first resolution.
    #[builder(default)]
    registry: ExtensionRegistry,

    /// Directory the root search starts from; the working directory if unset.
    #[builder(default, setter(into, strip_option))]
    start_dir: Option<PathBuf>,

    /// Replaces the live process environment.
    #[builder(default, setter(custom))]
    process_env: Option<EnvMap>,

    #[builder(default = "Box::new(GitProvider)")]
    vcs: Box<dyn VcsProvider>,

    #[builder(default = "Box::new(ManifestPackageProvider)")]
    packages: Box<dyn PackageProvider>,

    /// Whether the resolved record is persisted under the project root.
    #[builder(default = "true")]
    write_snapshot: bool,

    #[builder(setter(skip))]
    resolved: Option<Settings>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("registry", &self.registry)
            .field("start_dir", &self.start_dir)
            .field("process_env", &self.process_env)
            .field("write_snapshot", &self.write_snapshot)
            .field("resolved", &self.resolved)
            .finish_non_exhaustive()
    }
}

impl ResolverBuilder {
    /// Uses `vars` instead of the live process environment.
    pub fn process_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.process_env = Some(Some(vars));
        self
    }
}

impl Resolver {
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::default()
    }

    /// Adds an extension to the schema. Fails once settings are resolved.
    pub fn register<E: Extension>(&mut self) -> Result<&mut Self> {
        self.registry.register::<E>()?;
        Ok(self)
    }

    pub fn register_descriptor(&mut self, descriptor: ExtensionDescriptor) -> Result<&mut Self> {
        self.registry.register_descriptor(descriptor)?;
        Ok(self)
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// The resolved record, if [`init`](Resolver::init) has succeeded.
    pub fn get(&self) -> Option<&Settings> {
        self.resolved.as_ref()
    }

    /// Resolves the settings on the first call and returns the cached record
    /// on every later call, whatever `overrides` are passed.
    ///
    /// A failed resolution caches nothing, so a later call retries.
    pub fn init(&mut self, overrides: Overrides) -> Result<&Settings> {
        let settings = match self.resolved.take() {
            Some(settings) => {
                if !overrides.is_empty() {
                    tracing::debug!("Settings already resolved, ignoring overrides");
                }
                settings
            }
            None => self.resolve(&overrides)?,
        };

        Ok(self.resolved.insert(settings))
    }

    /// Runs the full pipeline without caching. Used by [`init`](Resolver::init)
    /// and by the process-wide singleton.
    pub(crate) fn resolve(&mut self, overrides: &Overrides) -> Result<Settings> {
        let schema = self.registry.freeze();

        let root = find_project_root(self.start_dir.as_deref());
        let files = env::gather_env_files(&root);
        let file_values = env::load_env_files(&files)?;

        let process = match &self.process_env {
            Some(vars) => vars.clone(),
            None => env::process_env(),
        };
        let merged = env::merge_layers(file_values, process, overrides);

        let mut settings = Settings::from_env(merged, schema, || root.clone())?;
        settings.env_files = files.into_iter().map(|file| file.path).collect();

        enrich(&mut settings, self.vcs.as_ref(), self.packages.as_ref())?;

        if self.write_snapshot {
            write_snapshot(&settings)?;
        }

        tracing::info!(
            root = %settings.project_root.display(),
            env_files = settings.env_files.len(),
            "Resolved settings"
        );
        Ok(settings)
    }
}

fn write_snapshot(settings: &Settings) -> Result<()> {
    let path = settings.snapshot_path();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    AtomicFile::new(&path).write(&settings.to_toml_pretty()?)?;
    tracing::debug!(path = %path.display(), "Wrote settings snapshot");
    Ok(())
}
