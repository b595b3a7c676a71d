//! Turns a loaded [`Config`] into a ready [`RepositoryFactory`].

use std::sync::Arc;

use annals_core::application::RepositoryFactory;
use annals_core::database::{
    DocumentStore, MemoryDocumentStore, MemoryQueryCache, PostgresDocumentStore, QueryCache,
    RedisCache,
};
use tracing::{info, warn};

use crate::models::Config;

/// Which adapters a factory was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory,
    Disabled,
}

#[derive(Debug, Clone)]
pub struct Bootstrap {
    pub factory: RepositoryFactory,
    pub store: StoreBackend,
    pub cache: CacheBackend,
    /// Present when the store is PostgreSQL, for schema bootstrap.
    pub postgres: Option<Arc<PostgresDocumentStore>>,
}

/// Connect the configured store and cache.
///
/// Without a database URL the in-memory store is used. With caching enabled
/// the Redis cache is used when configured, an in-process cache otherwise.
pub async fn build_factory(config: &Config) -> annals_core::Result<Bootstrap> {
    let (store, backend, postgres) = match config.database.url.as_deref() {
        Some(url) => {
            let connected =
                PostgresDocumentStore::connect(url, config.database.max_connections).await?;
            let postgres = Arc::new(connected);
            info!(
                max_connections = config.database.max_connections,
                "connected document store to PostgreSQL"
            );
            let store: Arc<dyn DocumentStore> = postgres.clone();
            (store, StoreBackend::Postgres, Some(postgres))
        }
        None => {
            warn!("no database configured; using the in-memory document store");
            let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
            (store, StoreBackend::Memory, None)
        }
    };

    let mut factory = RepositoryFactory::new(store);
    let cache = if !config.cache.enabled {
        info!("specification cache disabled");
        CacheBackend::Disabled
    } else {
        let (cache, backend) = match &config.redis {
            Some(redis) => {
                let cache: Arc<dyn QueryCache> = Arc::new(RedisCache::new(&redis.url).await?);
                (cache, CacheBackend::Redis)
            }
            None => {
                let cache: Arc<dyn QueryCache> = Arc::new(MemoryQueryCache::new());
                (cache, CacheBackend::Memory)
            }
        };
        info!(
            backend = ?backend,
            ttl = %humantime::format_duration(config.cache.ttl),
            "specification cache enabled"
        );
        factory = factory.with_cache(cache, config.cache.ttl);
        backend
    };

    Ok(Bootstrap {
        factory,
        store: backend,
        cache,
        postgres,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn defaults_build_an_in_memory_factory() {
        let bootstrap = build_factory(&Config::default()).await.unwrap();
        assert_eq!(bootstrap.store, StoreBackend::Memory);
        assert_eq!(bootstrap.cache, CacheBackend::Memory);
        assert!(bootstrap.postgres.is_none());
        assert_eq!(
            bootstrap.factory.cache().map(|policy| policy.ttl),
            Some(Duration::from_secs(300))
        );
    }

    #[tokio::test]
    async fn disabled_cache_builds_without_one() {
        let mut config = Config::default();
        config.cache.enabled = false;
        let bootstrap = build_factory(&config).await.unwrap();
        assert_eq!(bootstrap.cache, CacheBackend::Disabled);
        assert!(bootstrap.factory.cache().is_none());
    }
}
