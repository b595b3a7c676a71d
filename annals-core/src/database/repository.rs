//! Generic per-entity repository
//!
//! [`RepositoryBase`] is the contract every handler talks to. Reads run the
//! fixed pipeline (filter, includes, order/group, paging) and return detached
//! values. Writes are staged in the session's change tracker and reach the
//! store only when the unit of work saves.
//!
//! Specifications carrying a cache tag are served read-through: a hit returns
//! the cached list without touching the store, a miss runs the pipeline and
//! stores the result with the configured TTL. Entries are never invalidated
//! by writes; they expire.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::cache::CacheKeys;
use super::ports::{DocumentQuery, DocumentSource};
use crate::application::change_tracker::{Entry, EntryState};
use crate::application::session::Session;
use crate::domain::Entity;
use crate::error::{AnnalsError, Result};
use crate::query::include::Include;
use crate::query::query_set::QuerySet;
use crate::query::specification::{Predicate, Specification};

#[async_trait]
pub trait RepositoryBase<T: Entity>: Send + Sync {
    /// Lazy query over every row, optionally pre-filtered.
    fn find_all(&self, predicate: Option<Predicate<T>>) -> QuerySet<T>;

    async fn get_all(&self, predicate: Option<Predicate<T>>, include: &[&str]) -> Result<Vec<T>>;

    /// `None` when nothing matches; an error when more than one row does.
    async fn get_single_or_default(
        &self,
        predicate: Option<Predicate<T>>,
        include: &[&str],
    ) -> Result<Option<T>>;

    async fn get_first_or_default(
        &self,
        predicate: Option<Predicate<T>>,
        include: &[&str],
    ) -> Result<Option<T>>;

    async fn get_all_by_spec(&self, spec: Option<&Specification<T>>) -> Result<Vec<T>>;

    async fn get_first_or_default_by_spec(
        &self,
        spec: Option<&Specification<T>>,
    ) -> Result<Option<T>>;

    fn create(&self, entity: T) -> Result<Entry<T>>;

    async fn create_async(&self, entity: T) -> Result<Entry<T>>;

    async fn create_range_async(&self, entities: Vec<T>) -> Result<()>;

    fn update(&self, entity: &T) -> Result<Entry<T>>;

    fn update_range(&self, entities: &[T]) -> Result<()>;

    fn delete(&self, entity: &T) -> Result<()>;

    fn delete_range(&self, entities: &[T]) -> Result<()>;

    /// Track an entity known to exist in the store as unchanged.
    fn attach(&self, entity: &T) -> Result<Entry<T>>;

    /// Stop tracking; returns whether the entity was tracked.
    fn detach(&self, entity: &T) -> bool;

    fn entry(&self, entity: &T) -> Entry<T>;

    async fn execute_raw(&self, statement: &str) -> Result<u64>;
}

/// Projection reads, available on every [`RepositoryBase`] including trait
/// objects.
#[async_trait]
pub trait RepositorySelect<T: Entity>: RepositoryBase<T> {
    async fn get_all_select<U, F>(
        &self,
        predicate: Option<Predicate<T>>,
        selector: F,
    ) -> Result<Vec<U>>
    where
        F: Fn(&T) -> U + Send,
        U: Send,
    {
        let items = self.get_all(predicate, &[]).await?;
        Ok(items.iter().map(selector).collect())
    }

    async fn get_first_or_default_select<U, F>(
        &self,
        predicate: Option<Predicate<T>>,
        selector: F,
    ) -> Result<Option<U>>
    where
        F: Fn(&T) -> U + Send,
        U: Send,
    {
        let first = self.get_first_or_default(predicate, &[]).await?;
        Ok(first.as_ref().map(selector))
    }
}

impl<T: Entity, R: RepositoryBase<T> + ?Sized> RepositorySelect<T> for R {}

pub struct EntityRepository<T> {
    session: Arc<Session>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for EntityRepository<T> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            _entity: PhantomData,
        }
    }
}

impl<T> fmt::Debug for EntityRepository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRepository")
            .field("entity", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: Entity> EntityRepository<T> {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            _entity: PhantomData,
        }
    }

    fn resolve_includes(include: &[&str]) -> Result<Vec<Include<T>>> {
        include
            .iter()
            .map(|name| {
                T::navigation(name).ok_or_else(|| AnnalsError::UnknownInclude {
                    entity: T::KIND,
                    name: (*name).to_string(),
                })
            })
            .collect()
    }

    fn ad_hoc(predicate: Option<Predicate<T>>, include: &[&str]) -> Result<Specification<T>> {
        let mut builder = Specification::builder();
        if let Some(predicate) = predicate {
            builder = builder.filter(move |item: &T| predicate(item));
        }
        for navigation in Self::resolve_includes(include)? {
            builder = builder.include(navigation);
        }
        Ok(builder.build())
    }

    /// Run the pipeline against the store, bypassing the cache.
    #[instrument(skip(self, spec), fields(kind = T::KIND))]
    pub async fn execute(&self, spec: &Specification<T>) -> Result<Vec<T>> {
        let query = spec
            .includes()
            .iter()
            .fold(DocumentQuery::new(T::KIND), |query, include| {
                query.with_related(include.related_kind())
            });
        let batch = self.session.fetch(&query).await?;

        let items = batch
            .primary()
            .iter()
            .map(T::from_document)
            .collect::<Result<Vec<T>>>()?;
        let scanned = items.len();

        let mut items = spec.retain_matching(items);
        for include in spec.includes() {
            include.apply(&mut items, &batch)?;
        }
        let items = spec.arrange(items);

        debug!(scanned, returned = items.len(), "specification executed");
        Ok(items)
    }

    #[instrument(skip(self, spec), fields(kind = T::KIND, tag = spec.cache_tag()))]
    async fn execute_cached(&self, spec: &Specification<T>) -> Result<Vec<T>> {
        let (Some(tag), Some(policy)) = (spec.cache_tag(), self.session.cache()) else {
            return self.execute(spec).await;
        };
        // Reads inside a transaction may see uncommitted rows
        if self.session.in_transaction().await {
            debug!("open transaction; bypassing specification cache");
            return self.execute(spec).await;
        }

        let key = CacheKeys::specification(T::KIND, tag);
        if let Some(json) = policy.cache.get(&key).await? {
            debug!(key = %key, "serving specification from cache");
            return Ok(serde_json::from_str(&json)?);
        }

        let items = self.execute(spec).await?;
        policy
            .cache
            .set(&key, serde_json::to_string(&items)?, policy.ttl)
            .await?;
        Ok(items)
    }

    fn track_update(&self, entity: &T) -> Result<()> {
        let document = entity.to_document()?;
        self.session.tracker().update(T::KIND, entity.id(), document);
        Ok(())
    }

    fn track_delete(&self, entity: &T) -> Result<()> {
        let document = entity.to_document()?;
        self.session.tracker().delete(T::KIND, entity.id(), document);
        Ok(())
    }
}

#[async_trait]
impl<T: Entity> RepositoryBase<T> for EntityRepository<T> {
    fn find_all(&self, predicate: Option<Predicate<T>>) -> QuerySet<T> {
        let source: Arc<dyn DocumentSource> = self.session.clone();
        let query = QuerySet::new(source);
        match predicate {
            Some(predicate) => query.filter_by(predicate),
            None => query,
        }
    }

    async fn get_all(&self, predicate: Option<Predicate<T>>, include: &[&str]) -> Result<Vec<T>> {
        let spec = Self::ad_hoc(predicate, include)?;
        self.execute(&spec).await
    }

    async fn get_single_or_default(
        &self,
        predicate: Option<Predicate<T>>,
        include: &[&str],
    ) -> Result<Option<T>> {
        let mut items = self.get_all(predicate, include).await?;
        if items.len() > 1 {
            return Err(AnnalsError::MultipleMatches { entity: T::KIND });
        }
        Ok(items.pop())
    }

    async fn get_first_or_default(
        &self,
        predicate: Option<Predicate<T>>,
        include: &[&str],
    ) -> Result<Option<T>> {
        let items = self.get_all(predicate, include).await?;
        Ok(items.into_iter().next())
    }

    async fn get_all_by_spec(&self, spec: Option<&Specification<T>>) -> Result<Vec<T>> {
        match spec {
            Some(spec) => self.execute_cached(spec).await,
            None => self.execute(&Specification::all()).await,
        }
    }

    async fn get_first_or_default_by_spec(
        &self,
        spec: Option<&Specification<T>>,
    ) -> Result<Option<T>> {
        Ok(self.get_all_by_spec(spec).await?.into_iter().next())
    }

    fn create(&self, entity: T) -> Result<Entry<T>> {
        let document = entity.to_document()?;
        let id = entity.id();
        self.session.tracker().add(T::KIND, id, document)?;
        Ok(Entry::new(Arc::clone(&self.session), id))
    }

    async fn create_async(&self, entity: T) -> Result<Entry<T>> {
        self.create(entity)
    }

    async fn create_range_async(&self, entities: Vec<T>) -> Result<()> {
        for entity in entities {
            self.create(entity)?;
        }
        Ok(())
    }

    fn update(&self, entity: &T) -> Result<Entry<T>> {
        self.track_update(entity)?;
        Ok(Entry::new(Arc::clone(&self.session), entity.id()))
    }

    fn update_range(&self, entities: &[T]) -> Result<()> {
        entities.iter().try_for_each(|entity| self.track_update(entity))
    }

    fn delete(&self, entity: &T) -> Result<()> {
        self.track_delete(entity)
    }

    fn delete_range(&self, entities: &[T]) -> Result<()> {
        entities.iter().try_for_each(|entity| self.track_delete(entity))
    }

    fn attach(&self, entity: &T) -> Result<Entry<T>> {
        let document = entity.to_document()?;
        self.session
            .tracker()
            .attach(T::KIND, entity.id(), document)?;
        Ok(Entry::new(Arc::clone(&self.session), entity.id()))
    }

    fn detach(&self, entity: &T) -> bool {
        self.session.tracker().detach(T::KIND, entity.id())
    }

    fn entry(&self, entity: &T) -> Entry<T> {
        Entry::new(Arc::clone(&self.session), entity.id())
    }

    async fn execute_raw(&self, statement: &str) -> Result<u64> {
        self.session.store().execute_raw(statement).await
    }
}

impl<T: Entity> EntityRepository<T> {
    /// Tracking state of `entity` in this unit of work.
    pub fn state_of(&self, entity: &T) -> EntryState {
        self.session.tracker().state(T::KIND, entity.id())
    }
}
