//! Configuration library for Annals.
//!
//! Loads configuration from defaults, an optional `annals.toml` and the
//! environment (after reading `.env`), installs the tracing subscriber and
//! builds the [`RepositoryFactory`](annals_core::application::RepositoryFactory)
//! the request handlers draw their units of work from.

#![allow(missing_docs)]

pub mod bootstrap;
pub mod error;
pub mod loader;
pub mod models;
pub mod sources;
pub mod telemetry;
pub mod util;
pub mod validation;

pub use bootstrap::{Bootstrap, CacheBackend, StoreBackend, build_factory};
pub use error::ConfigLoadError;
pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions};
pub use models::{CacheConfig, Config, ConfigMetadata, DatabaseConfig, RedisConfig};
pub use telemetry::init_tracing;
pub use validation::{ConfigWarning, ConfigWarnings};
