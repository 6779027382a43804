//! Process-wide settings.
//!
//! [`init_settings`] resolves the settings once per process using the global
//! extension registry, which starts out with every extension submitted via
//! [`submit_extension!`](crate::submit_extension). Concurrent first calls
//! block until the single resolution finishes, so the snapshot is written
//! exactly once.
use std::sync::{Mutex, PoisonError};

use once_cell::sync::OnceCell;

use crate::{
    Extension, ExtensionRegistry, Overrides, Resolver, Settings,
    error::Result,
};

static SETTINGS: OnceCell<Settings> = OnceCell::new();

static REGISTRY: Mutex<Option<ExtensionRegistry>> = Mutex::new(None);

fn with_registry<T>(f: impl FnOnce(&mut ExtensionRegistry) -> Result<T>) -> Result<T> {
    let mut guard = REGISTRY.lock().unwrap_or_else(PoisonError::into_inner);
    let registry = match guard.take() {
        Some(registry) => registry,
        None => ExtensionRegistry::from_submitted()?,
    };
    f(guard.insert(registry))
}

/// Adds an extension to the global registry.
///
/// Fails with [`Error::RegistryFrozen`](crate::Error::RegistryFrozen) once
/// [`init_settings`] has succeeded.
pub fn register_extension<E: Extension>() -> Result<()> {
    with_registry(|registry| registry.register::<E>().map(|_| ()))
}

/// Resolves the process-wide settings on first use and returns them.
///
/// Later calls return the same record; their `overrides` are ignored.
///
/// # Example
///
/// ```rust,no_run
/// use strata_config::{Overrides, init_settings};
///
/// let settings = init_settings(Overrides::new())?;
/// if let Some(branch) = &settings.git_branch {
///     println!("on branch {branch}");
/// }
/// # Ok::<(), strata_config::Error>(())
/// ```
pub fn init_settings(overrides: Overrides) -> Result<&'static Settings> {
    SETTINGS.get_or_try_init(|| {
        with_registry(|registry| {
            let mut resolver = Resolver::builder().registry(registry.clone()).build()?;
            let settings = resolver.resolve(&overrides)?;
            registry.freeze();
            Ok(settings)
        })
    })
}

/// The process-wide settings, if [`init_settings`] has succeeded.
pub fn settings() -> Option<&'static Settings> {
    SETTINGS.get()
}
