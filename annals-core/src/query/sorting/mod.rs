//! Sorting for specification and listing queries
//!
//! This module provides:
//! - Sort key values extracted from entities
//! - Ordering clauses and group-by clustering
//! - Parsing of client sort instructions (`"-Column"`)
//! - A per-entity allow-list of sortable columns

pub mod clause;
pub mod instruction;
pub mod keys;
pub mod registry;

pub use clause::*;
pub use instruction::*;
pub use keys::*;
pub use registry::*;
