//! Reusable query shapes
//!
//! A [`Specification`] bundles everything a read needs: which rows match,
//! which navigations to eager load, how to order or group the result and which
//! window to return. The executor always applies the clauses in one fixed
//! order: filter, includes, order/group, paging.
//!
//! Specifications are built once through [`SpecificationBuilder`] (or a named
//! constructor in [`specs`](super::specs)) and are read-only afterwards.
//! An optional cache tag opts a shape into the read-through cache.

use std::fmt;
use std::sync::Arc;

use super::include::Include;
use super::sorting::{KeySelector, OrderClause, SortValue, cluster_by};

/// Row filter over an entity.
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Wrap a closure as a [`Predicate`].
pub fn predicate<T, F>(f: F) -> Predicate<T>
where
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub skip: usize,
    pub take: usize,
}

pub struct Specification<T> {
    predicate: Option<Predicate<T>>,
    includes: Vec<Include<T>>,
    ordering: Option<OrderClause<T>>,
    group_by: Option<KeySelector<T>>,
    paging: Option<Paging>,
    cache_tag: Option<String>,
}

impl<T> Specification<T> {
    /// Matches every row, loads nothing extra, keeps store order.
    pub fn all() -> Self {
        Self {
            predicate: None,
            includes: Vec::new(),
            ordering: None,
            group_by: None,
            paging: None,
            cache_tag: None,
        }
    }

    pub fn builder() -> SpecificationBuilder<T> {
        SpecificationBuilder {
            spec: Self::all(),
        }
    }

    pub fn predicate(&self) -> Option<&Predicate<T>> {
        self.predicate.as_ref()
    }

    /// A missing predicate matches every row.
    pub fn matches(&self, item: &T) -> bool {
        self.predicate.as_ref().is_none_or(|p| p(item))
    }

    pub fn includes(&self) -> &[Include<T>] {
        &self.includes
    }

    pub fn ordering(&self) -> Option<&OrderClause<T>> {
        self.ordering.as_ref()
    }

    pub fn order_by(&self) -> Option<&KeySelector<T>> {
        match &self.ordering {
            Some(OrderClause::Ascending(selector)) => Some(selector),
            _ => None,
        }
    }

    pub fn order_by_desc(&self) -> Option<&KeySelector<T>> {
        match &self.ordering {
            Some(OrderClause::Descending(selector)) => Some(selector),
            _ => None,
        }
    }

    pub fn group_by(&self) -> Option<&KeySelector<T>> {
        self.group_by.as_ref()
    }

    pub fn paging(&self) -> Option<Paging> {
        self.paging
    }

    pub fn is_paging_enabled(&self) -> bool {
        self.paging.is_some()
    }

    pub fn skip(&self) -> usize {
        self.paging.map(|p| p.skip).unwrap_or(0)
    }

    pub fn take(&self) -> Option<usize> {
        self.paging.map(|p| p.take)
    }

    pub fn cache_tag(&self) -> Option<&str> {
        self.cache_tag.as_deref()
    }

    /// Filter stage.
    pub fn retain_matching(&self, mut items: Vec<T>) -> Vec<T> {
        if let Some(predicate) = &self.predicate {
            items.retain(|item| predicate(item));
        }
        items
    }

    /// Order/group and paging stages, in that order.
    pub fn arrange(&self, mut items: Vec<T>) -> Vec<T> {
        if let Some(ordering) = &self.ordering {
            ordering.sort(&mut items);
        }
        if let Some(group_by) = &self.group_by {
            items = cluster_by(items, group_by);
        }
        if let Some(Paging { skip, take }) = self.paging {
            items = items.into_iter().skip(skip).take(take).collect();
        }
        items
    }
}

impl<T> Default for Specification<T> {
    fn default() -> Self {
        Self::all()
    }
}

impl<T> Clone for Specification<T> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
            includes: self.includes.clone(),
            ordering: self.ordering.clone(),
            group_by: self.group_by.clone(),
            paging: self.paging,
            cache_tag: self.cache_tag.clone(),
        }
    }
}

impl<T> fmt::Debug for Specification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("has_predicate", &self.predicate.is_some())
            .field(
                "includes",
                &self.includes.iter().map(Include::name).collect::<Vec<_>>(),
            )
            .field("ordering", &self.ordering.as_ref().map(OrderClause::order))
            .field("has_group_by", &self.group_by.is_some())
            .field("paging", &self.paging)
            .field("cache_tag", &self.cache_tag)
            .finish()
    }
}

/// Builder for [`Specification`]
#[derive(Debug)]
pub struct SpecificationBuilder<T> {
    spec: Specification<T>,
}

impl<T: 'static> SpecificationBuilder<T> {
    /// Restrict matching rows. Calling this again narrows the filter further.
    pub fn filter<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let combined: Predicate<T> = match self.spec.predicate.take() {
            Some(existing) => Arc::new(move |item: &T| existing(item) && f(item)),
            None => Arc::new(f),
        };
        self.spec.predicate = Some(combined);
        self
    }

    pub fn include(mut self, include: Include<T>) -> Self {
        self.spec.includes.push(include);
        self
    }

    /// Ascending order; replaces any ordering set earlier.
    pub fn order_by<F>(mut self, key: F) -> Self
    where
        F: Fn(&T) -> SortValue + Send + Sync + 'static,
    {
        self.spec.ordering = Some(OrderClause::ascending(key));
        self
    }

    /// Descending order; replaces any ordering set earlier.
    pub fn order_by_desc<F>(mut self, key: F) -> Self
    where
        F: Fn(&T) -> SortValue + Send + Sync + 'static,
    {
        self.spec.ordering = Some(OrderClause::descending(key));
        self
    }

    pub fn ordering(mut self, clause: OrderClause<T>) -> Self {
        self.spec.ordering = Some(clause);
        self
    }

    pub fn group_by<F>(mut self, key: F) -> Self
    where
        F: Fn(&T) -> SortValue + Send + Sync + 'static,
    {
        self.spec.group_by = Some(Arc::new(key));
        self
    }

    /// Enable paging. Skip and take are always set together.
    pub fn page(mut self, skip: usize, take: usize) -> Self {
        self.spec.paging = Some(Paging { skip, take });
        self
    }

    pub fn cache_tag(mut self, tag: impl Into<String>) -> Self {
        self.spec.cache_tag = Some(tag.into());
        self
    }

    pub fn build(self) -> Specification<T> {
        self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        group: &'static str,
        rank: i32,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { group: "b", rank: 3 },
            Row { group: "a", rank: 1 },
            Row { group: "b", rank: 2 },
            Row { group: "a", rank: 5 },
            Row { group: "c", rank: 4 },
        ]
    }

    fn run(spec: &Specification<Row>) -> Vec<Row> {
        spec.arrange(spec.retain_matching(rows()))
    }

    #[test]
    fn empty_specification_keeps_everything_in_order() {
        let spec = Specification::all();
        assert_eq!(run(&spec), rows());
        assert!(!spec.is_paging_enabled());
        assert_eq!(spec.cache_tag(), None);
    }

    #[test]
    fn ordering_variants_replace_each_other() {
        let spec = Specification::<Row>::builder()
            .order_by(|r| SortValue::from(r.rank))
            .order_by_desc(|r| SortValue::from(r.rank))
            .build();
        assert!(spec.order_by().is_none());
        assert!(spec.order_by_desc().is_some());

        let ranks: Vec<i32> = run(&spec).iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn filters_accumulate() {
        let spec = Specification::<Row>::builder()
            .filter(|r| r.rank > 1)
            .filter(|r| r.group != "c")
            .build();
        let ranks: Vec<i32> = run(&spec).iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![3, 2, 5]);
    }

    #[test]
    fn grouping_follows_ordering() {
        let spec = Specification::<Row>::builder()
            .order_by(|r| SortValue::from(r.rank))
            .group_by(|r| SortValue::from(r.group))
            .build();
        let ranks: Vec<i32> = run(&spec).iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 5, 2, 3, 4]);
    }

    #[test]
    fn paging_applies_last() {
        let spec = Specification::<Row>::builder()
            .filter(|r| r.group != "c")
            .order_by(|r| SortValue::from(r.rank))
            .page(1, 2)
            .build();
        assert_eq!(spec.skip(), 1);
        assert_eq!(spec.take(), Some(2));
        let ranks: Vec<i32> = run(&spec).iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![2, 3]);
    }

    #[test]
    fn debug_reports_clause_presence() {
        let spec = Specification::<Row>::builder()
            .filter(|_| true)
            .cache_tag("Rows")
            .build();
        let rendered = format!("{spec:?}");
        assert!(rendered.contains("has_predicate: true"));
        assert!(rendered.contains("Rows"));
    }
}
