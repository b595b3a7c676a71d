use std::any::type_name_of_val;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::session::{CachePolicy, Session};
use super::transaction::TransactionScope;
use crate::database::ports::{DocumentStore, QueryCache};
use crate::database::repository::EntityRepository;
use crate::domain::{Article, Category, Entity, RelatedTerm, Term};
use crate::error::{AnnalsError, Result};

/// TTL applied to cached specification results unless configured otherwise.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Result of a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveOutcome {
    /// Documents inserted, updated or deleted by the store
    pub affected: u64,
}

impl SaveOutcome {
    /// Nothing was staged, so nothing was written.
    pub fn is_noop(&self) -> bool {
        self.affected == 0
    }
}

/// Aggregates the per-entity repositories of one logical request.
///
/// Every repository shares the same session, so a single
/// [`save_changes`](Self::save_changes) persists everything staged through
/// any of them as one atomic change set.
#[derive(Clone)]
pub struct RepositoryWrapper {
    session: Arc<Session>,

    pub terms: EntityRepository<Term>,
    pub related_terms: EntityRepository<RelatedTerm>,
    pub articles: EntityRepository<Article>,
    pub categories: EntityRepository<Category>,
}

impl fmt::Debug for RepositoryWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryWrapper")
            .field("store", &type_name_of_val(self.session.store().as_ref()))
            .field(
                "cache",
                &self
                    .session
                    .cache()
                    .map(|policy| type_name_of_val(policy.cache.as_ref())),
            )
            .finish()
    }
}

impl RepositoryWrapper {
    pub fn builder() -> RepositoryWrapperBuilder {
        RepositoryWrapperBuilder::default()
    }

    fn from_session(session: Arc<Session>) -> Self {
        Self {
            terms: EntityRepository::new(Arc::clone(&session)),
            related_terms: EntityRepository::new(Arc::clone(&session)),
            articles: EntityRepository::new(Arc::clone(&session)),
            categories: EntityRepository::new(Arc::clone(&session)),
            session,
        }
    }

    /// Repository for any entity type, sharing this unit of work.
    pub fn repository<T: Entity>(&self) -> EntityRepository<T> {
        EntityRepository::new(Arc::clone(&self.session))
    }

    pub fn has_changes(&self) -> bool {
        self.session.tracker().has_changes()
    }

    /// Persist everything staged since the last save. Store failures are
    /// returned as errors and leave the staged changes in place.
    pub async fn save_changes(&self) -> Result<SaveOutcome> {
        let affected = self.session.flush().await?;
        Ok(SaveOutcome { affected })
    }

    pub async fn save_changes_async(&self) -> Result<SaveOutcome> {
        self.save_changes().await
    }

    /// Open a transaction for this unit of work. Saves and reads go through
    /// it until the returned scope completes, rolls back or is dropped.
    pub async fn begin_transaction(&self) -> Result<TransactionScope> {
        self.session.begin().await?;
        Ok(TransactionScope::new(Arc::clone(&self.session)))
    }
}

#[derive(Default)]
pub struct RepositoryWrapperBuilder {
    store: Option<Arc<dyn DocumentStore>>,
    cache: Option<Arc<dyn QueryCache>>,
    cache_ttl: Option<Duration>,
}

impl fmt::Debug for RepositoryWrapperBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryWrapperBuilder")
            .field("store", &self.store.as_ref().map(|s| type_name_of_val(s.as_ref())))
            .field("cache", &self.cache.as_ref().map(|c| type_name_of_val(c.as_ref())))
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

impl RepositoryWrapperBuilder {
    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn QueryCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn build(self) -> Result<RepositoryWrapper> {
        Ok(RepositoryWrapper::from_session(Arc::new(self.session()?)))
    }

    pub fn build_factory(self) -> Result<RepositoryFactory> {
        let store = self
            .store
            .ok_or_else(|| AnnalsError::Configuration("missing document store".into()))?;
        let cache = self.cache.map(|cache| CachePolicy {
            cache,
            ttl: self.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL),
        });
        Ok(RepositoryFactory { store, cache })
    }

    fn session(self) -> Result<Session> {
        let factory = self.build_factory()?;
        Ok(Session::new(factory.store, factory.cache))
    }
}

/// Hands out one [`RepositoryWrapper`] per logical request. The store and
/// cache are shared; tracked changes and transactions are not.
#[derive(Clone)]
pub struct RepositoryFactory {
    store: Arc<dyn DocumentStore>,
    cache: Option<CachePolicy>,
}

impl fmt::Debug for RepositoryFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryFactory")
            .field("store", &self.store)
            .field("cache", &self.cache)
            .finish()
    }
}

impl RepositoryFactory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store, cache: None }
    }

    pub fn with_cache(mut self, cache: Arc<dyn QueryCache>, ttl: Duration) -> Self {
        self.cache = Some(CachePolicy { cache, ttl });
        self
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn cache(&self) -> Option<&CachePolicy> {
        self.cache.as_ref()
    }

    pub fn wrapper(&self) -> RepositoryWrapper {
        debug!("opening unit of work");
        let session = Session::new(Arc::clone(&self.store), self.cache.clone());
        RepositoryWrapper::from_session(Arc::new(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryDocumentStore;

    #[test]
    fn builder_requires_a_store() {
        let err = RepositoryWrapper::builder().build().unwrap_err();
        assert!(matches!(err, AnnalsError::Configuration(_)));
    }

    #[test]
    fn cache_ttl_defaults_to_five_minutes() {
        let factory = RepositoryWrapper::builder()
            .with_store(Arc::new(MemoryDocumentStore::new()))
            .with_cache(Arc::new(crate::database::memory::MemoryQueryCache::new()))
            .build_factory()
            .unwrap();
        assert_eq!(factory.cache().map(|c| c.ttl), Some(DEFAULT_CACHE_TTL));
    }

    #[tokio::test]
    async fn saving_nothing_is_a_noop() {
        let uow = RepositoryFactory::new(Arc::new(MemoryDocumentStore::new())).wrapper();
        let outcome = uow.save_changes().await.unwrap();
        assert!(outcome.is_noop());
        assert!(!uow.has_changes());
    }
}
