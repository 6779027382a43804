//! Layered project settings and SemVer bumping.
//!
//! Settings are resolved once per process from the `.env` files under the
//! project root (deepest file wins), the process environment, explicit
//! overrides, and repository metadata. Extensions add typed fields to the
//! record before the first resolution.
//!
//! ```rust,ignore
//! use serde::Deserialize;
//! use strata_config::{Extension, Overrides, Resolver};
//!
//! #[derive(Debug, Deserialize, Extension)]
//! #[extension(name = "database")]
//! struct Database {
//!     #[extension(env = "DATABASE_URL")]
//!     url: String,
//!     #[extension(default = "5")]
//!     pool_size: u32,
//! }
//!
//! let mut resolver = Resolver::builder().build()?;
//! resolver.register::<Database>()?;
//! let settings = resolver.init(Overrides::new())?;
//! let database = settings.extension::<Database>()?;
//! ```
pub mod atomic;
pub mod bump;
pub mod enrich;
pub mod env;
pub mod error;
pub mod extension;
pub mod global;
pub mod registry;
pub mod resolver;
pub mod root;
pub mod settings;
pub mod version;

pub use bump::bump_at_project_root;
pub use enrich::{GitProvider, ManifestPackageProvider, PackageProvider, VcsInfo, VcsProvider};
pub use env::{EnvFile, Overrides, gather_env_files, load_env_files};
pub use error::{Error, Result};
pub use extension::{
    Extension, ExtensionDescriptor, FieldKind, FieldSpec, RegisteredExtension, Validator,
};
pub use global::{init_settings, register_extension, settings};
pub use registry::{ExtensionRegistry, Schema};
pub use resolver::{Resolver, ResolverBuilder};
pub use root::find_project_root;
pub use settings::Settings;
pub use version::{Part, Version};

// re-export macro
pub use strata_config_macros::Extension;

#[doc(hidden)]
pub use inventory;
