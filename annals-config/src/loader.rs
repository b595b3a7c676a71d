use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::ConfigLoadError;
use crate::models::{
    CacheConfig, Config, ConfigMetadata, DEFAULT_MAX_CONNECTIONS, DatabaseConfig, RedisConfig,
};
use crate::sources::{EnvConfig, FileConfig};
use crate::util::{non_empty, parse_duration};
use crate::validation::ConfigWarnings;

const DEFAULT_CONFIG_LOCATIONS: [&str; 2] = ["annals.toml", "config/annals.toml"];

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

/// A loaded configuration together with the warnings raised while composing it.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

/// Composes defaults, an optional TOML file and the environment, in that order of precedence.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    /// Load `.env` (if present), then read the process environment.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = self.load_env_file()?;
        self.compose(EnvConfig::gather(), env_file_loaded)
    }

    /// Load against an explicit environment snapshot. No `.env` file is
    /// read and the process environment is left alone.
    pub fn load_with_env(&self, env: EnvConfig) -> Result<ConfigLoad, ConfigLoadError> {
        self.compose(env, false)
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        let loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true),
            None => dotenvy::dotenv().map(|_| true),
        };
        match loaded {
            Ok(loaded) => Ok(loaded),
            Err(dotenvy::Error::Io(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn resolve_config_path(&self, env: &EnvConfig) -> Result<Option<PathBuf>, ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        match explicit {
            Some(path) if path.exists() => Ok(Some(path)),
            Some(path) => Err(ConfigLoadError::MissingConfig { path }),
            None => Ok(DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())),
        }
    }

    fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn compose(
        &self,
        env: EnvConfig,
        env_file_loaded: bool,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let mut warnings = ConfigWarnings::default();

        let config_path = self.resolve_config_path(&env)?;
        let file = match &config_path {
            Some(path) => Self::read_file_config(path)?,
            None => {
                warnings.push_with_hint(
                    "No annals.toml detected; falling back to environment variables",
                    "Set ANNALS_CONFIG to point at a configuration file",
                );
                FileConfig::default()
            }
        };
        let FileConfig {
            database: file_database,
            redis: file_redis,
            cache: file_cache,
        } = file;

        let max_connections = match env.database_max_connections {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigLoadError::InvalidValue {
                key: "DATABASE_MAX_CONNECTIONS",
                value: raw.clone(),
            })?,
            None => file_database.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS),
        };
        let database = DatabaseConfig {
            url: env.database_url.or(non_empty(file_database.url)),
            max_connections,
        };

        let redis = env.redis_url.map(|url| RedisConfig { url }).or_else(|| {
            file_redis
                .filter(|r| !r.url.trim().is_empty())
                .map(|r| RedisConfig { url: r.url })
        });

        let defaults = CacheConfig::default();
        let ttl = match (env.cache_ttl, file_cache.ttl) {
            (Some(raw), _) => parse_duration("SPEC_CACHE_TTL", &raw)?,
            (None, Some(raw)) => parse_duration("cache.ttl", &raw)?,
            (None, None) => defaults.ttl,
        };
        let cache = CacheConfig {
            enabled: env
                .cache_enabled
                .or(file_cache.enabled)
                .unwrap_or(defaults.enabled),
            ttl,
        };

        let config = Config {
            database,
            redis,
            cache,
            metadata: ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        };
        warnings.extend(config.validate()?);

        Ok(ConfigLoad { config, warnings })
    }
}
