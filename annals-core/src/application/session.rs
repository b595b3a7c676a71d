use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::change_tracker::ChangeTracker;
use crate::database::ports::{
    DocumentBatch, DocumentQuery, DocumentSource, DocumentStore, QueryCache, StoreTransaction,
};
use crate::error::{AnnalsError, Result};

/// Cache used for tagged specifications and the TTL of every entry it writes.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    pub cache: Arc<dyn QueryCache>,
    pub ttl: Duration,
}

/// State shared by every repository of one unit of work: the store, the
/// optional cache, the change tracker and the open transaction, if any.
pub struct Session {
    store: Arc<dyn DocumentStore>,
    cache: Option<CachePolicy>,
    tracker: std::sync::Mutex<ChangeTracker>,
    transaction: tokio::sync::Mutex<Option<Box<dyn StoreTransaction>>>,
    abandoned: AtomicBool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let in_transaction = self
            .transaction
            .try_lock()
            .map(|tx| tx.is_some())
            .unwrap_or(true);
        f.debug_struct("Session")
            .field("store", &self.store)
            .field("cache", &self.cache)
            .field("in_transaction", &in_transaction)
            .finish()
    }
}

impl Session {
    pub fn new(store: Arc<dyn DocumentStore>, cache: Option<CachePolicy>) -> Self {
        Self {
            store,
            cache,
            tracker: std::sync::Mutex::new(ChangeTracker::new()),
            transaction: tokio::sync::Mutex::new(None),
            abandoned: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn cache(&self) -> Option<&CachePolicy> {
        self.cache.as_ref()
    }

    /// The tracker never holds partially applied state, so a poisoned lock is
    /// still usable.
    pub fn tracker(&self) -> MutexGuard<'_, ChangeTracker> {
        self.tracker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn transaction(&self) -> tokio::sync::MutexGuard<'_, Option<Box<dyn StoreTransaction>>> {
        let mut guard = self.transaction.lock().await;
        if self.abandoned.swap(false, Ordering::AcqRel) && guard.take().is_some() {
            debug!("discarded abandoned transaction");
        }
        guard
    }

    pub async fn in_transaction(&self) -> bool {
        self.transaction().await.is_some()
    }

    pub async fn begin(&self) -> Result<()> {
        let mut guard = self.transaction().await;
        if guard.is_some() {
            return Err(AnnalsError::TransactionActive);
        }
        *guard = Some(self.store.begin().await?);
        info!("transaction started");
        Ok(())
    }

    pub async fn commit(&self) -> Result<()> {
        match self.transaction().await.take() {
            Some(tx) => {
                tx.commit().await?;
                info!("transaction committed");
            }
            None => warn!("commit requested without an open transaction"),
        }
        Ok(())
    }

    pub async fn rollback(&self) -> Result<()> {
        if let Some(tx) = self.transaction().await.take() {
            tx.rollback().await?;
            info!("transaction rolled back");
        }
        Ok(())
    }

    /// Drop the open transaction without awaiting. Used from `Drop`, where a
    /// rollback cannot be awaited; dropping the store transaction discards
    /// its changes.
    pub fn abandon(&self) {
        match self.transaction.try_lock() {
            Ok(mut guard) => {
                guard.take();
            }
            Err(_) => self.abandoned.store(true, Ordering::Release),
        }
    }

    /// Write every staged change as one change set, through the open
    /// transaction when there is one.
    pub async fn flush(&self) -> Result<u64> {
        let (changes, stamps) = self.tracker().pending();
        if changes.is_empty() {
            debug!("nothing to save");
            return Ok(0);
        }

        let affected = {
            let mut guard = self.transaction().await;
            match guard.as_mut() {
                Some(tx) => tx.apply(&changes).await?,
                None => self.store.apply(&changes).await?,
            }
        };

        self.tracker().accept(&stamps);
        info!(changes = changes.len(), affected, "saved changes");
        Ok(affected)
    }
}

#[async_trait]
impl DocumentSource for Session {
    async fn fetch(&self, query: &DocumentQuery) -> Result<DocumentBatch> {
        let mut guard = self.transaction().await;
        match guard.as_mut() {
            Some(tx) => tx.fetch(query).await,
            None => self.store.fetch(query).await,
        }
    }
}
