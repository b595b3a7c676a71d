use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid database URL")]
    InvalidDatabaseUrl {
        #[source]
        source: url::ParseError,
    },
    #[error("invalid redis URL")]
    InvalidRedisUrl {
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported database scheme '{scheme}' (expected postgres or postgresql)")]
    UnsupportedDatabaseScheme { scheme: String },
    #[error("invalid duration for {key}: '{value}'")]
    InvalidDuration {
        key: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("database max_connections must be at least 1")]
    ZeroMaxConnections,
    #[error("specification cache is enabled with a zero TTL")]
    ZeroCacheTtl,
    #[error("specification cache TTL {ttl:?} exceeds the maximum of {max:?}")]
    CacheTtlTooLong { ttl: Duration, max: Duration },
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
