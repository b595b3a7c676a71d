use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::util::{non_empty, parse_bool};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub database: FileDatabaseConfig,
    pub redis: Option<FileRedisConfig>,
    #[serde(default)]
    pub cache: FileCacheConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileRedisConfig {
    pub url: String,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCacheConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Humantime duration, e.g. `"5m"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
}

/// Environment-derived configuration values.
///
/// Values are kept raw where parsing can fail so the loader can report the
/// offending key.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub database_url: Option<String>,
    pub database_max_connections: Option<String>,
    pub redis_url: Option<String>,
    pub cache_enabled: Option<bool>,
    pub cache_ttl: Option<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            config_path: non_empty(lookup("ANNALS_CONFIG")).map(PathBuf::from),
            database_url: non_empty(lookup("DATABASE_URL")),
            database_max_connections: non_empty(lookup("DATABASE_MAX_CONNECTIONS")),
            redis_url: non_empty(lookup("REDIS_URL")),
            cache_enabled: lookup("SPEC_CACHE_ENABLED").and_then(|raw| parse_bool(&raw)),
            cache_ttl: non_empty(lookup("SPEC_CACHE_TTL")),
        }
    }
}
