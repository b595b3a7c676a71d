//! # Annals Core
//!
//! Data-access layer for the Annals content backend: terms, related terms,
//! articles and categories.
//!
//! ## Overview
//!
//! - **Specifications**: reusable query shapes (filter, eager loads, order,
//!   group, paging, cache tag) executed uniformly for any entity
//! - **Repositories**: one generic executor per entity with staged writes
//! - **Dynamic sorting**: runtime column names resolved through a per-entity
//!   allow-list
//! - **Pagination**: 1-based page arithmetic for listing endpoints
//! - **Read-through cache**: tagged specifications served from a TTL cache
//! - **Unit of work**: one atomic save per request, optional transaction scope
//!
//! ## Feature Flags
//!
//! - `postgres`: PostgreSQL document store via SQLx
//! - `redis`: Redis query cache
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use annals_core::{
//!     database::{MemoryDocumentStore, RepositoryBase},
//!     application::RepositoryFactory,
//!     domain::{RelatedTerm, Term},
//!     query::specs::RelatedTermsWithTerm,
//! };
//!
//! async fn link_terms() -> annals_core::Result<()> {
//!     let factory = RepositoryFactory::new(Arc::new(MemoryDocumentStore::new()));
//!     let uow = factory.wrapper();
//!
//!     let feudalism = Term::new("Feudalism", "Land held in exchange for service");
//!     let manor = Term::new("Manor", "Estate of a lord");
//!     uow.related_terms
//!         .create(RelatedTerm::new(feudalism.id, manor.id, "organised around"))?;
//!     uow.terms.create_range_async(vec![feudalism, manor]).await?;
//!     uow.save_changes().await?;
//!
//!     let links = uow
//!         .related_terms
//!         .get_all_by_spec(Some(&RelatedTermsWithTerm::all()))
//!         .await?;
//!     println!("{} links", links.len());
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Unit of work, change tracking and transaction scopes
pub mod application;
/// Store and cache boundaries, adapters and the generic repository
pub mod database;
/// Content entities
pub mod domain;
/// Error types
pub mod error;
/// Specifications, sorting, pagination and listings
pub mod query;

pub use error::{AnnalsError, Result};
