//! Boundary traits for the document store and the query cache
//!
//! The store is an opaque collaborator. Executors read whole kinds of
//! documents through [`DocumentSource`] and write through atomic
//! [`ChangeSet`]s; everything above this module works on typed entities.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;

/// One staged mutation of a single document.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Insert {
        kind: &'static str,
        id: Uuid,
        body: Value,
    },
    Update {
        kind: &'static str,
        id: Uuid,
        body: Value,
    },
    Delete {
        kind: &'static str,
        id: Uuid,
    },
}

impl Change {
    pub fn kind(&self) -> &'static str {
        match self {
            Change::Insert { kind, .. }
            | Change::Update { kind, .. }
            | Change::Delete { kind, .. } => kind,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Change::Insert { id, .. }
            | Change::Update { id, .. }
            | Change::Delete { id, .. } => *id,
        }
    }
}

/// Ordered list of changes applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }
}

impl FromIterator<Change> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = Change>>(iter: I) -> Self {
        Self {
            changes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

/// A read of one primary kind plus the kinds its eager loads need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentQuery {
    kind: &'static str,
    related: Vec<&'static str>,
}

impl DocumentQuery {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            related: Vec::new(),
        }
    }

    pub fn with_related(mut self, kind: &'static str) -> Self {
        if kind != self.kind && !self.related.contains(&kind) {
            self.related.push(kind);
        }
        self
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn related(&self) -> &[&'static str] {
        &self.related
    }

    /// Primary kind first, then related kinds in request order.
    pub fn kinds(&self) -> Vec<&'static str> {
        std::iter::once(self.kind)
            .chain(self.related.iter().copied())
            .collect()
    }
}

/// Documents returned for a [`DocumentQuery`], each kind in store order.
#[derive(Debug, Clone, Default)]
pub struct DocumentBatch {
    primary: Vec<Value>,
    related: HashMap<&'static str, Vec<Value>>,
    kind: &'static str,
}

impl DocumentBatch {
    pub fn new(kind: &'static str, primary: Vec<Value>) -> Self {
        Self {
            primary,
            related: HashMap::new(),
            kind,
        }
    }

    pub fn with_related(mut self, kind: &'static str, documents: Vec<Value>) -> Self {
        self.related.insert(kind, documents);
        self
    }

    pub fn primary(&self) -> &[Value] {
        &self.primary
    }

    /// Documents of a related kind. A navigation back onto the primary kind
    /// reads the primary documents.
    pub fn related(&self, kind: &str) -> &[Value] {
        if kind == self.kind {
            return &self.primary;
        }
        self.related.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn into_primary(self) -> Vec<Value> {
        self.primary
    }
}

/// Read side of the store, also implemented by sessions so reads follow an
/// open transaction.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, query: &DocumentQuery) -> Result<DocumentBatch>;
}

#[async_trait]
pub trait DocumentStore: DocumentSource + fmt::Debug {
    /// Apply a change set atomically and return the number of affected
    /// documents.
    async fn apply(&self, changes: &ChangeSet) -> Result<u64>;

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;

    /// Administrative statement passed straight to the store.
    async fn execute_raw(&self, statement: &str) -> Result<u64>;
}

/// An open store transaction. Dropping it without `commit` discards every
/// change applied through it.
#[async_trait]
pub trait StoreTransaction: Send + fmt::Debug {
    async fn fetch(&mut self, query: &DocumentQuery) -> Result<DocumentBatch>;

    async fn apply(&mut self, changes: &ChangeSet) -> Result<u64>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Key-value cache with per-entry TTL holding serialized query results.
#[async_trait]
pub trait QueryCache: Send + Sync + fmt::Debug {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}
