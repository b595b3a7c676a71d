//! In-process store and cache adapters
//!
//! Used by tests and by local runs without a database URL. Documents of each
//! kind are kept in insertion order, which is the "store order" callers see
//! when no ordering is requested.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::ports::{
    Change, ChangeSet, DocumentBatch, DocumentQuery, DocumentSource, DocumentStore,
    QueryCache, StoreTransaction,
};
use crate::error::{AnnalsError, Result};

type Tables = HashMap<String, Vec<(Uuid, Value)>>;

fn read_documents(tables: &Tables, query: &DocumentQuery) -> DocumentBatch {
    let documents = |kind: &str| -> Vec<Value> {
        tables
            .get(kind)
            .map(|rows| rows.iter().map(|(_, body)| body.clone()).collect())
            .unwrap_or_default()
    };

    query.related().iter().fold(
        DocumentBatch::new(query.kind(), documents(query.kind())),
        |batch, kind| batch.with_related(*kind, documents(*kind)),
    )
}

/// Apply on a copy so a failing change leaves `tables` untouched.
fn apply_changes(tables: &mut Tables, changes: &ChangeSet) -> Result<u64> {
    let mut next = tables.clone();
    let mut affected = 0u64;

    for change in changes {
        let rows = next.entry(change.kind().to_string()).or_default();
        let position = rows.iter().position(|(id, _)| *id == change.id());

        match (change, position) {
            (Change::Insert { kind, id, .. }, Some(_)) => {
                return Err(AnnalsError::Conflict(format!(
                    "{kind} {id} already exists"
                )));
            }
            (Change::Insert { id, body, .. }, None) => {
                rows.push((*id, body.clone()));
                affected += 1;
            }
            (Change::Update { body, .. }, Some(at)) => {
                rows[at].1 = body.clone();
                affected += 1;
            }
            (Change::Delete { .. }, Some(at)) => {
                rows.remove(at);
                affected += 1;
            }
            (Change::Update { .. } | Change::Delete { .. }, None) => {}
        }
    }

    *tables = next;
    Ok(affected)
}

#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    tables: Arc<RwLock<Tables>>,
}

impl fmt::Debug for MemoryDocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds = self
            .tables
            .try_read()
            .map(|tables| tables.len())
            .unwrap_or_default();
        f.debug_struct("MemoryDocumentStore")
            .field("kinds", &kinds)
            .finish()
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents of `kind`.
    pub async fn len(&self, kind: &str) -> usize {
        self.tables
            .read()
            .await
            .get(kind)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub async fn is_empty(&self) -> bool {
        self.tables.read().await.values().all(Vec::is_empty)
    }
}

#[async_trait]
impl DocumentSource for MemoryDocumentStore {
    async fn fetch(&self, query: &DocumentQuery) -> Result<DocumentBatch> {
        let tables = self.tables.read().await;
        Ok(read_documents(&tables, query))
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn apply(&self, changes: &ChangeSet) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let affected = apply_changes(&mut tables, changes)?;
        debug!(changes = changes.len(), affected, "memory store applied change set");
        Ok(affected)
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let snapshot = self.tables.read().await.clone();
        Ok(Box::new(MemoryTransaction {
            tables: Arc::clone(&self.tables),
            working: snapshot,
            pending: Vec::new(),
        }))
    }

    /// Supports `TRUNCATE <kind>` only.
    async fn execute_raw(&self, statement: &str) -> Result<u64> {
        let mut words = statement.split_whitespace();
        match (words.next(), words.next(), words.next()) {
            (Some(verb), Some(kind), None) if verb.eq_ignore_ascii_case("truncate") => {
                let kind = kind.trim_end_matches(';');
                let removed = self
                    .tables
                    .write()
                    .await
                    .remove(kind)
                    .map(|rows| rows.len() as u64)
                    .unwrap_or(0);
                info!(kind, removed, "memory store truncated");
                Ok(removed)
            }
            _ => Err(AnnalsError::Internal(format!(
                "Unsupported statement for the memory store: {statement}"
            ))),
        }
    }
}

/// Reads see the snapshot taken at `begin` plus this transaction's own
/// writes. Commit replays the writes against the live tables.
pub struct MemoryTransaction {
    tables: Arc<RwLock<Tables>>,
    working: Tables,
    pending: Vec<ChangeSet>,
}

impl fmt::Debug for MemoryTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTransaction")
            .field("pending_change_sets", &self.pending.len())
            .finish()
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn fetch(&mut self, query: &DocumentQuery) -> Result<DocumentBatch> {
        Ok(read_documents(&self.working, query))
    }

    async fn apply(&mut self, changes: &ChangeSet) -> Result<u64> {
        let affected = apply_changes(&mut self.working, changes)?;
        self.pending.push(changes.clone());
        Ok(affected)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut tables = self.tables.write().await;
        let mut next = tables.clone();
        for changes in &self.pending {
            apply_changes(&mut next, changes)?;
        }
        *tables = next;
        debug!(change_sets = self.pending.len(), "memory transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        debug!(change_sets = self.pending.len(), "memory transaction rolled back");
        Ok(())
    }
}

/// TTL cache kept in process memory. Expired entries are dropped on read.
/// A TTL too large to represent as a deadline never expires.
#[derive(Clone, Default)]
pub struct MemoryQueryCache {
    entries: Arc<RwLock<HashMap<String, (String, Option<Instant>)>>>,
}

fn is_live(expires: Option<Instant>, now: Instant) -> bool {
    expires.is_none_or(|deadline| deadline > now)
}

impl fmt::Debug for MemoryQueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self
            .entries
            .try_read()
            .map(|entries| entries.len())
            .unwrap_or_default();
        f.debug_struct("MemoryQueryCache")
            .field("entries", &entries)
            .finish()
    }
}

impl MemoryQueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|(_, expires)| is_live(*expires, now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl QueryCache for MemoryQueryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((value, expires)) if is_live(*expires, now) => {
                    debug!("Cache HIT: {}", key);
                    return Ok(Some(value.clone()));
                }
                Some(_) => {}
                None => {
                    debug!("Cache MISS: {}", key);
                    return Ok(None);
                }
            }
        }

        self.entries.write().await.remove(key);
        debug!("Cache EXPIRED: {}", key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        debug!("Cache SET: {} (TTL: {:?})", key, ttl);
        let expires = Instant::now().checked_add(ttl);
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value, expires));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        debug!("Cache DELETE: {}", key);
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn insert(kind: &'static str, id: Uuid, n: i64) -> Change {
        Change::Insert {
            kind,
            id,
            body: json!({ "id": id, "n": n }),
        }
    }

    #[tokio::test]
    async fn failed_change_set_applies_nothing() {
        let store = MemoryDocumentStore::new();
        let id = Uuid::new_v4();
        store
            .apply(&ChangeSet::from_iter([insert("row", id, 1)]))
            .await
            .unwrap();

        let changes = ChangeSet::from_iter([
            insert("row", Uuid::new_v4(), 2),
            insert("row", id, 3),
        ]);
        let err = store.apply(&changes).await.unwrap_err();
        assert!(matches!(err, AnnalsError::Conflict(_)));
        assert_eq!(store.len("row").await, 1);
    }

    #[tokio::test]
    async fn fetch_keeps_insertion_order() {
        let store = MemoryDocumentStore::new();
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let changes: ChangeSet =
            ids.iter().enumerate().map(|(n, id)| insert("row", *id, n as i64)).collect();
        assert_eq!(store.apply(&changes).await.unwrap(), 4);

        let batch = store.fetch(&DocumentQuery::new("row")).await.unwrap();
        let ns: Vec<i64> = batch.primary().iter().map(|d| d["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn dropped_transaction_leaves_store_untouched() {
        let store = MemoryDocumentStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.apply(&ChangeSet::from_iter([insert("row", Uuid::new_v4(), 1)]))
                .await
                .unwrap();
            let inside = tx.fetch(&DocumentQuery::new("row")).await.unwrap();
            assert_eq!(inside.primary().len(), 1);
        }
        assert_eq!(store.len("row").await, 0);
    }

    #[tokio::test]
    async fn committed_transaction_is_visible() {
        let store = MemoryDocumentStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.apply(&ChangeSet::from_iter([insert("row", Uuid::new_v4(), 1)]))
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.len("row").await, 1);
    }

    #[tokio::test]
    async fn truncate_clears_one_kind() {
        let store = MemoryDocumentStore::new();
        store
            .apply(&ChangeSet::from_iter([
                insert("row", Uuid::new_v4(), 1),
                insert("other", Uuid::new_v4(), 2),
            ]))
            .await
            .unwrap();

        assert_eq!(store.execute_raw("TRUNCATE row").await.unwrap(), 1);
        assert_eq!(store.len("other").await, 1);
        assert!(store.execute_raw("DROP TABLE row").await.is_err());
    }

    #[tokio::test]
    async fn cache_entries_expire() {
        let cache = MemoryQueryCache::new();
        cache
            .set("k", "v".to_string(), Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn unrepresentable_ttl_never_expires() {
        let cache = MemoryQueryCache::new();
        cache
            .set("k", "v".to_string(), Duration::from_secs(u64::MAX / 2))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(cache.len().await, 1);
    }
}
