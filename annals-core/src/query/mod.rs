//! Query shapes and the pieces they are built from
//!
//! - [`specification`]: reusable query shapes and their builder
//! - [`include`]: eager-load clauses
//! - [`sorting`]: sort keys, ordering clauses and the dynamic sort registry
//! - [`pagination`]: page arithmetic
//! - [`query_set`]: lazy composable reads
//! - [`specs`]: named shapes used by the content handlers
//! - [`listing`]: paged listings with runtime sort and filter

pub mod include;
pub mod listing;
pub mod pagination;
pub mod query_set;
pub mod sorting;
pub mod specification;
pub mod specs;

pub use include::Include;
pub use listing::{ColumnFilter, Listable, PageRequest, PageResult, list_page};
pub use pagination::{PageWindow, Pagination, paginate, total_pages};
pub use query_set::QuerySet;
pub use sorting::{
    KeySelector, OrderClause, SortInstruction, SortOrder, SortRegistry, SortValue, Sortable,
};
pub use specification::{Paging, Predicate, Specification, SpecificationBuilder, predicate};
