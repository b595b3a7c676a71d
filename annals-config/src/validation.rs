use url::Url;

use crate::error::ConfigLoadError;
use crate::models::{Config, MAX_CACHE_TTL};

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(&mut self, message: S, hint: H) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

impl Config {
    /// Reject configurations that cannot be bootstrapped and collect
    /// warnings for ones that run in a degraded mode.
    pub fn validate(&self) -> Result<ConfigWarnings, ConfigLoadError> {
        let mut warnings = ConfigWarnings::default();

        if self.database.max_connections == 0 {
            return Err(ConfigLoadError::ZeroMaxConnections);
        }

        match self.database.url.as_deref() {
            Some(raw) => {
                let url = Url::parse(raw)
                    .map_err(|source| ConfigLoadError::InvalidDatabaseUrl { source })?;
                if !matches!(url.scheme(), "postgres" | "postgresql") {
                    return Err(ConfigLoadError::UnsupportedDatabaseScheme {
                        scheme: url.scheme().to_string(),
                    });
                }
            }
            None => warnings.push_with_hint(
                "No database configured; documents are kept in memory",
                "Set DATABASE_URL or [database].url to use PostgreSQL",
            ),
        }

        if let Some(redis) = &self.redis {
            Url::parse(&redis.url).map_err(|source| ConfigLoadError::InvalidRedisUrl { source })?;
        }

        if self.cache.enabled {
            if self.cache.ttl.is_zero() {
                return Err(ConfigLoadError::ZeroCacheTtl);
            }
            if self.cache.ttl > MAX_CACHE_TTL {
                return Err(ConfigLoadError::CacheTtlTooLong {
                    ttl: self.cache.ttl,
                    max: MAX_CACHE_TTL,
                });
            }
            if self.redis.is_none() {
                warnings.push_with_hint(
                    "Specification cache is process-local",
                    "Set REDIS_URL to share cached results between instances",
                );
            }
        }

        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::RedisConfig;

    #[test]
    fn default_config_is_valid_with_warnings() {
        let warnings = Config::default().validate().unwrap();
        assert_eq!(warnings.items.len(), 2);
    }

    #[test]
    fn zero_ttl_is_rejected_only_when_caching() {
        let mut config = Config::default();
        config.cache.ttl = Duration::ZERO;
        assert!(matches!(config.validate(), Err(ConfigLoadError::ZeroCacheTtl)));

        config.cache.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn oversized_ttl_is_rejected() {
        let mut config = Config::default();
        config.cache.ttl = MAX_CACHE_TTL;
        assert!(config.validate().is_ok());

        config.cache.ttl = Duration::from_secs(u64::MAX / 2);
        assert!(matches!(
            config.validate(),
            Err(ConfigLoadError::CacheTtlTooLong { .. })
        ));
    }

    #[test]
    fn urls_must_parse() {
        let mut config = Config::default();
        config.database.url = Some("not a url".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigLoadError::InvalidDatabaseUrl { .. })
        ));

        config.database.url = Some("mysql://localhost/annals".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigLoadError::UnsupportedDatabaseScheme { .. })
        ));

        config.database.url = Some("postgres://localhost/annals".into());
        config.redis = Some(RedisConfig {
            url: "::nope".into(),
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigLoadError::InvalidRedisUrl { .. })
        ));
    }
}
