//! Allow-list of sortable columns per entity type
//!
//! Dynamic sorting takes a column name from the client. Instead of looking the
//! name up on the type at runtime, every entity declares the columns it can be
//! sorted by, each paired with a typed accessor. Names are matched exactly and
//! anything not declared is rejected with [`AnnalsError::InvalidSortKey`].

use std::fmt;
use std::sync::Arc;

use super::{KeySelector, OrderClause, SortInstruction, SortValue};
use crate::error::{AnnalsError, Result};

/// Typed accessor for one sortable column.
pub type ColumnAccessor<T> = fn(&T) -> SortValue;

/// Entities whose listing can be sorted by a runtime-chosen column.
pub trait Sortable: Sized + Send + Sync + 'static {
    /// The registry is built once per type and shared for the process lifetime.
    fn sort_registry() -> &'static SortRegistry<Self>;
}

pub struct SortRegistry<T> {
    columns: Vec<(&'static str, ColumnAccessor<T>)>,
}

impl<T: 'static> SortRegistry<T> {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Declare a sortable column. Declaring the same name twice replaces the
    /// earlier accessor.
    pub fn column(mut self, name: &'static str, accessor: ColumnAccessor<T>) -> Self {
        if let Some(slot) = self.columns.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = accessor;
        } else {
            self.columns.push((name, accessor));
        }
        self
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|(name, _)| *name)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|(name, _)| *name == column)
    }

    pub fn accessor(&self, column: &str) -> Result<ColumnAccessor<T>> {
        self.columns
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, accessor)| *accessor)
            .ok_or_else(|| AnnalsError::InvalidSortKey {
                column: column.to_string(),
            })
    }

    /// Turn a parsed instruction into an ordering clause over this entity.
    pub fn resolve(&self, instruction: &SortInstruction) -> Result<OrderClause<T>> {
        let accessor = self.accessor(instruction.column())?;
        let selector: KeySelector<T> = Arc::new(accessor);
        Ok(OrderClause::new(selector, instruction.order()))
    }

    /// Parse and resolve a raw instruction in one step.
    pub fn resolve_str(&self, raw: &str) -> Result<OrderClause<T>> {
        self.resolve(&SortInstruction::parse(raw)?)
    }
}

impl<T: 'static> Default for SortRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SortRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortRegistry")
            .field(
                "columns",
                &self.columns.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::sorting::SortOrder;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        index: i32,
        name: &'static str,
    }

    fn registry() -> SortRegistry<Row> {
        SortRegistry::<Row>::new()
            .column("Index", |r| SortValue::from(r.index))
            .column("Name", |r| SortValue::from(r.name))
    }

    #[test]
    fn resolves_declared_columns() {
        let registry = registry();
        let clause = registry.resolve_str("-Index").unwrap();
        assert_eq!(clause.order(), SortOrder::Descending);

        let mut rows = vec![
            Row { index: 3, name: "c" },
            Row { index: 1, name: "a" },
            Row { index: 2, name: "b" },
        ];
        clause.sort(&mut rows);
        let order: Vec<i32> = rows.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let err = registry().resolve_str("index").unwrap_err();
        match err {
            AnnalsError::InvalidSortKey { column } => assert_eq!(column, "index"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_column_names_the_column() {
        let err = registry().resolve_str("Bogus").unwrap_err();
        assert_eq!(err.to_string(), "Invalid sort column: \"Bogus\"");
    }

    #[test]
    fn redeclaring_a_column_replaces_it() {
        let registry = registry().column("Index", |r| SortValue::from(-r.index));
        assert_eq!(registry.columns().collect::<Vec<_>>(), vec!["Index", "Name"]);
    }
}
