//! Lazy, composable reads over one entity kind
//!
//! A [`QuerySet`] records stages and touches the store only when it is
//! materialised. Stages run in the order they were added, so a later
//! `order_by` re-sorts the current result and earlier orderings act as
//! tie-breakers.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use super::pagination::Pagination;
use super::sorting::{OrderClause, SortInstruction, SortValue, Sortable};
use super::specification::Predicate;
use crate::database::ports::{DocumentQuery, DocumentSource};
use crate::domain::Entity;
use crate::error::Result;

enum Stage<T> {
    Filter(Predicate<T>),
    Order(OrderClause<T>),
    Skip(usize),
    Take(usize),
}

impl<T> Clone for Stage<T> {
    fn clone(&self) -> Self {
        match self {
            Stage::Filter(p) => Stage::Filter(Arc::clone(p)),
            Stage::Order(o) => Stage::Order(o.clone()),
            Stage::Skip(n) => Stage::Skip(*n),
            Stage::Take(n) => Stage::Take(*n),
        }
    }
}

impl<T> fmt::Debug for Stage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Filter(_) => f.write_str("Filter"),
            Stage::Order(o) => write!(f, "Order({:?})", o.order()),
            Stage::Skip(n) => write!(f, "Skip({n})"),
            Stage::Take(n) => write!(f, "Take({n})"),
        }
    }
}

pub struct QuerySet<T> {
    source: Arc<dyn DocumentSource>,
    stages: Vec<Stage<T>>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> QuerySet<T> {
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        Self {
            source,
            stages: Vec::new(),
            _entity: PhantomData,
        }
    }

    pub fn filter<F>(self, f: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter_by(Arc::new(f))
    }

    pub fn filter_by(mut self, predicate: Predicate<T>) -> Self {
        self.stages.push(Stage::Filter(predicate));
        self
    }

    pub fn order_by<F>(self, key: F) -> Self
    where
        F: Fn(&T) -> SortValue + Send + Sync + 'static,
    {
        self.ordered(OrderClause::ascending(key))
    }

    pub fn order_by_desc<F>(self, key: F) -> Self
    where
        F: Fn(&T) -> SortValue + Send + Sync + 'static,
    {
        self.ordered(OrderClause::descending(key))
    }

    pub fn ordered(mut self, clause: OrderClause<T>) -> Self {
        self.stages.push(Stage::Order(clause));
        self
    }

    pub fn skip(mut self, n: usize) -> Self {
        self.stages.push(Stage::Skip(n));
        self
    }

    pub fn take(mut self, n: usize) -> Self {
        self.stages.push(Stage::Take(n));
        self
    }

    pub fn page(self, pagination: &Pagination) -> Self {
        self.skip(pagination.skip()).take(pagination.take())
    }

    pub async fn to_vec(&self) -> Result<Vec<T>> {
        let batch = self.source.fetch(&DocumentQuery::new(T::KIND)).await?;
        let mut items = batch
            .primary()
            .iter()
            .map(T::from_document)
            .collect::<Result<Vec<T>>>()?;

        for stage in &self.stages {
            items = match stage {
                Stage::Filter(predicate) => {
                    items.retain(|item| predicate(item));
                    items
                }
                Stage::Order(clause) => {
                    clause.sort(&mut items);
                    items
                }
                Stage::Skip(n) => items.into_iter().skip(*n).collect(),
                Stage::Take(n) => items.into_iter().take(*n).collect(),
            };
        }

        debug!(
            kind = T::KIND,
            stages = self.stages.len(),
            rows = items.len(),
            "query set materialised"
        );
        Ok(items)
    }

    pub async fn count(&self) -> Result<usize> {
        Ok(self.to_vec().await?.len())
    }

    pub async fn first(&self) -> Result<Option<T>> {
        Ok(self.to_vec().await?.into_iter().next())
    }

    pub async fn any(&self) -> Result<bool> {
        Ok(self.count().await? > 0)
    }

    /// Materialise and project each row.
    pub async fn select<U, F>(&self, f: F) -> Result<Vec<U>>
    where
        F: Fn(&T) -> U,
    {
        Ok(self.to_vec().await?.iter().map(f).collect())
    }
}

impl<T: Entity + Sortable> QuerySet<T> {
    /// Order by a runtime-chosen column from the entity's sort registry.
    pub fn order_by_instruction(self, instruction: &SortInstruction) -> Result<Self> {
        let clause = T::sort_registry().resolve(instruction)?;
        Ok(self.ordered(clause))
    }
}

impl<T> Clone for QuerySet<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            stages: self.stages.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T> fmt::Debug for QuerySet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySet")
            .field("entity", &std::any::type_name::<T>())
            .field("stages", &self.stages)
            .finish()
    }
}
