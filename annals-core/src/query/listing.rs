//! Paged, sortable, filterable listings
//!
//! Request shape: `{ title?, sort?, filter?, amount, page }` where `sort` is a
//! column name with an optional leading `-` and `filter` is `"Column:value"`.
//! The pipeline is: title filter, column filter, count, sort, page window.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::pagination::Pagination;
use super::sorting::{SortInstruction, Sortable};
use crate::database::repository::{EntityRepository, RepositoryBase};
use crate::domain::Entity;
use crate::error::{AnnalsError, Result};

/// Entities exposed through a listing endpoint.
pub trait Listable: Entity + Sortable {
    /// Columns accepted by `"Column:value"` filters.
    const FILTER_COLUMNS: &'static [&'static str];

    /// Text matched by the title filter.
    fn title(&self) -> &str;

    fn column_text(&self, column: &str) -> Option<String>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub filter: Option<String>,
    pub amount: i64,
    pub page: i64,
}

impl PageRequest {
    pub fn new(amount: i64, page: i64) -> Self {
        Self {
            amount,
            page,
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub pages: u64,
    pub items: Vec<T>,
}

/// A `"Column:value"` filter.
///
/// A row matches when `value` contains the row's column text, so
/// `"Status:Draft,Published"` matches drafts and published rows alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    column: String,
    value: String,
}

impl ColumnFilter {
    /// Blank input means no filter.
    pub fn parse<T: Listable>(raw: &str) -> Result<Option<Self>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        let Some((column, value)) = raw.split_once(':') else {
            return Err(AnnalsError::InvalidFilter(format!(
                "expected `Column:value`, got {raw:?}"
            )));
        };
        let column = column.trim();
        if !T::FILTER_COLUMNS.iter().any(|known| *known == column) {
            return Err(AnnalsError::InvalidFilter(format!(
                "{column:?} is not filterable for {}",
                T::KIND
            )));
        }

        Ok(Some(Self {
            column: column.to_string(),
            value: value.trim().to_string(),
        }))
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn matches<T: Listable>(&self, item: &T) -> bool {
        item.column_text(&self.column)
            .is_some_and(|text| self.value.contains(text.as_str()))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Run one listing request. Every input is validated before the store is
/// read.
pub async fn list_page<T: Listable>(
    repository: &EntityRepository<T>,
    request: &PageRequest,
) -> Result<PageResult<T>> {
    let pagination = Pagination::new(request.amount, request.page)?;
    let ordering = non_blank(request.sort.as_deref())
        .map(|raw| T::sort_registry().resolve(&SortInstruction::parse(raw)?))
        .transpose()?;
    let filter = match request.filter.as_deref() {
        Some(raw) => ColumnFilter::parse::<T>(raw)?,
        None => None,
    };

    let mut query = repository.find_all(None);
    if let Some(title) = non_blank(request.title.as_deref()) {
        let needle = title.to_lowercase();
        query = query.filter(move |item: &T| item.title().to_lowercase().contains(&needle));
    }
    if let Some(filter) = filter {
        query = query.filter(move |item: &T| filter.matches(item));
    }

    let total = query.count().await?;
    if let Some(ordering) = ordering {
        query = query.ordered(ordering);
    }
    let items = query.page(&pagination).to_vec().await?;

    debug!(
        kind = T::KIND,
        total,
        page = pagination.page(),
        returned = items.len(),
        "listing page served"
    );
    Ok(PageResult {
        pages: pagination.total_pages(total),
        items,
    })
}
