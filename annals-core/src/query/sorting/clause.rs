use std::fmt;
use std::sync::Arc;

use super::{SortOrder, SortValue};

/// Extracts the value an entity is ordered or grouped by.
pub type KeySelector<T> = Arc<dyn Fn(&T) -> SortValue + Send + Sync>;

/// A single ordering clause: one key, one direction.
///
/// Ascending and descending are two variants of one clause, so a query shape
/// can never carry both at once.
pub enum OrderClause<T> {
    Ascending(KeySelector<T>),
    Descending(KeySelector<T>),
}

impl<T> OrderClause<T> {
    pub fn new(selector: KeySelector<T>, order: SortOrder) -> Self {
        match order {
            SortOrder::Ascending => OrderClause::Ascending(selector),
            SortOrder::Descending => OrderClause::Descending(selector),
        }
    }

    pub fn ascending<F>(key: F) -> Self
    where
        F: Fn(&T) -> SortValue + Send + Sync + 'static,
    {
        OrderClause::Ascending(Arc::new(key))
    }

    pub fn descending<F>(key: F) -> Self
    where
        F: Fn(&T) -> SortValue + Send + Sync + 'static,
    {
        OrderClause::Descending(Arc::new(key))
    }

    pub fn order(&self) -> SortOrder {
        match self {
            OrderClause::Ascending(_) => SortOrder::Ascending,
            OrderClause::Descending(_) => SortOrder::Descending,
        }
    }

    pub fn selector(&self) -> &KeySelector<T> {
        match self {
            OrderClause::Ascending(selector)
            | OrderClause::Descending(selector) => selector,
        }
    }

    /// Stable sort: items with equal keys keep their incoming relative order
    /// in both directions.
    pub fn sort(&self, items: &mut Vec<T>) {
        let selector = self.selector();
        let mut keyed: Vec<(SortValue, T)> =
            items.drain(..).map(|item| (selector(&item), item)).collect();

        match self.order() {
            SortOrder::Ascending => keyed.sort_by(|a, b| a.0.cmp(&b.0)),
            SortOrder::Descending => keyed.sort_by(|a, b| b.0.cmp(&a.0)),
        }

        items.extend(keyed.into_iter().map(|(_, item)| item));
    }
}

impl<T> Clone for OrderClause<T> {
    fn clone(&self) -> Self {
        match self {
            OrderClause::Ascending(selector) => {
                OrderClause::Ascending(Arc::clone(selector))
            }
            OrderClause::Descending(selector) => {
                OrderClause::Descending(Arc::clone(selector))
            }
        }
    }
}

impl<T> fmt::Debug for OrderClause<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OrderClause").field(&self.order()).finish()
    }
}

/// Makes rows with equal keys contiguous. Groups appear in order of first
/// appearance and rows keep their relative order inside a group.
pub fn cluster_by<T>(items: Vec<T>, selector: &KeySelector<T>) -> Vec<T> {
    let mut positions: std::collections::HashMap<SortValue, usize> =
        std::collections::HashMap::new();
    let mut groups: Vec<Vec<T>> = Vec::new();

    for item in items {
        let key = selector(&item);
        let slot = *positions.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(item);
    }

    groups.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descending_is_reverse_of_ascending_without_ties() {
        let mut asc = vec![5, 3, 9, 1, 7];
        let mut desc = asc.clone();

        OrderClause::ascending(|v: &i32| SortValue::from(*v)).sort(&mut asc);
        OrderClause::descending(|v: &i32| SortValue::from(*v)).sort(&mut desc);

        let mut reversed = asc.clone();
        reversed.reverse();
        assert_eq!(asc, vec![1, 3, 5, 7, 9]);
        assert_eq!(desc, reversed);
    }

    #[test]
    fn ties_keep_incoming_order() {
        let mut items = vec![("b", 1), ("a", 2), ("c", 1), ("d", 2)];
        OrderClause::descending(|v: &(&str, i32)| SortValue::from(v.1))
            .sort(&mut items);
        assert_eq!(items, vec![("a", 2), ("d", 2), ("b", 1), ("c", 1)]);
    }

    #[test]
    fn cluster_keeps_first_appearance_order() {
        let items = vec![("x", 2), ("y", 1), ("z", 2), ("w", 3), ("v", 1)];
        let selector: KeySelector<(&str, i32)> =
            Arc::new(|v: &(&str, i32)| SortValue::from(v.1));
        let clustered = cluster_by(items, &selector);
        assert_eq!(
            clustered,
            vec![("x", 2), ("z", 2), ("y", 1), ("v", 1), ("w", 3)]
        );
    }
}
