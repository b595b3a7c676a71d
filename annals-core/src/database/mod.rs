//! Store and cache boundaries, their adapters and the generic repository

pub mod cache;
pub mod memory;
pub mod ports;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "redis")]
pub mod redis_cache;
pub mod repository;

pub use cache::CacheKeys;
pub use memory::{MemoryDocumentStore, MemoryQueryCache};
pub use ports::{
    Change, ChangeSet, DocumentBatch, DocumentQuery, DocumentSource, DocumentStore, QueryCache,
    StoreTransaction,
};
#[cfg(feature = "postgres")]
pub use postgres::PostgresDocumentStore;
#[cfg(feature = "redis")]
pub use redis_cache::RedisCache;
pub use repository::{EntityRepository, RepositoryBase, RepositorySelect};
