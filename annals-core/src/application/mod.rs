//! Unit of work: shared session state, change tracking and transactions

pub mod change_tracker;
pub mod session;
pub mod transaction;
pub mod unit_of_work;

pub use change_tracker::{Entry, EntryState};
pub use transaction::TransactionScope;
pub use unit_of_work::{
    DEFAULT_CACHE_TTL, RepositoryFactory, RepositoryWrapper, RepositoryWrapperBuilder,
    SaveOutcome,
};
