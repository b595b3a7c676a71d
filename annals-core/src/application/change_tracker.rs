//! Staged mutations for one unit of work
//!
//! The tracker holds a snapshot document per tracked entity together with its
//! state. Nothing reaches the store until the owning session flushes the
//! pending [`ChangeSet`]. Entries touched again while a flush is in flight
//! keep their new state, because acceptance is keyed by a per-entry version.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use super::session::Session;
use crate::database::ports::{Change, ChangeSet};
use crate::domain::Entity;
use crate::error::{AnnalsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// Not tracked by this unit of work
    Detached,
    Added,
    Unchanged,
    Modified,
    Deleted,
}

type Key = (&'static str, Uuid);

#[derive(Debug, Clone)]
struct Tracked {
    state: EntryState,
    document: Value,
    seq: u64,
    version: u64,
}

/// Version stamp of a staged change, used to accept it after a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
    key: Key,
    version: u64,
}

#[derive(Debug, Default)]
pub struct ChangeTracker {
    entries: HashMap<Key, Tracked>,
    next_seq: u64,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn track(&mut self, key: Key, state: EntryState, document: Value) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            key,
            Tracked {
                state,
                document,
                seq,
                version: 0,
            },
        );
    }

    fn transition(&mut self, key: Key, state: EntryState, document: Value) {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.state = state;
            entry.document = document;
            entry.version += 1;
        }
    }

    pub fn state(&self, kind: &'static str, id: Uuid) -> EntryState {
        self.entries
            .get(&(kind, id))
            .map(|entry| entry.state)
            .unwrap_or(EntryState::Detached)
    }

    pub fn document(&self, kind: &'static str, id: Uuid) -> Option<Value> {
        self.entries
            .get(&(kind, id))
            .map(|entry| entry.document.clone())
    }

    /// Stage an insert. Re-adding an entity staged for deletion turns the
    /// delete into an update.
    pub fn add(&mut self, kind: &'static str, id: Uuid, document: Value) -> Result<()> {
        let key = (kind, id);
        match self.entries.get(&key).map(|entry| entry.state) {
            None | Some(EntryState::Detached) => {
                self.track(key, EntryState::Added, document);
                Ok(())
            }
            Some(EntryState::Deleted) => {
                self.transition(key, EntryState::Modified, document);
                Ok(())
            }
            Some(_) => Err(AnnalsError::Conflict(format!(
                "{kind} {id} is already tracked"
            ))),
        }
    }

    /// Stage an update. An entity added in this unit of work stays an insert.
    pub fn update(&mut self, kind: &'static str, id: Uuid, document: Value) {
        let key = (kind, id);
        match self.entries.get(&key).map(|entry| entry.state) {
            None | Some(EntryState::Detached) => {
                self.track(key, EntryState::Modified, document);
            }
            Some(EntryState::Added) => {
                self.transition(key, EntryState::Added, document);
            }
            Some(_) => {
                self.transition(key, EntryState::Modified, document);
            }
        }
    }

    /// Stage a delete. Deleting an entity added in this unit of work simply
    /// forgets it.
    pub fn delete(&mut self, kind: &'static str, id: Uuid, document: Value) {
        let key = (kind, id);
        match self.entries.get(&key).map(|entry| entry.state) {
            None | Some(EntryState::Detached) => {
                self.track(key, EntryState::Deleted, document);
            }
            Some(EntryState::Added) => {
                self.entries.remove(&key);
            }
            Some(_) => {
                self.transition(key, EntryState::Deleted, document);
            }
        }
    }

    /// Start tracking an entity that already exists in the store.
    pub fn attach(&mut self, kind: &'static str, id: Uuid, document: Value) -> Result<()> {
        let key = (kind, id);
        if self.entries.contains_key(&key) {
            return Err(AnnalsError::Conflict(format!(
                "{kind} {id} is already tracked"
            )));
        }
        self.track(key, EntryState::Unchanged, document);
        Ok(())
    }

    pub fn detach(&mut self, kind: &'static str, id: Uuid) -> bool {
        self.entries.remove(&(kind, id)).is_some()
    }

    pub fn has_changes(&self) -> bool {
        self.entries
            .values()
            .any(|entry| entry.state != EntryState::Unchanged)
    }

    /// Everything staged, in the order entities were first tracked.
    pub fn pending(&self) -> (ChangeSet, Vec<Stamp>) {
        let mut staged: Vec<(&Key, &Tracked)> = self
            .entries
            .iter()
            .filter(|(_, entry)| {
                matches!(
                    entry.state,
                    EntryState::Added | EntryState::Modified | EntryState::Deleted
                )
            })
            .collect();
        staged.sort_by_key(|(_, entry)| entry.seq);

        let mut stamps = Vec::with_capacity(staged.len());
        let changes = staged
            .into_iter()
            .filter_map(|(&(kind, id), entry)| {
                stamps.push(Stamp {
                    key: (kind, id),
                    version: entry.version,
                });
                match entry.state {
                    EntryState::Added => Some(Change::Insert {
                        kind,
                        id,
                        body: entry.document.clone(),
                    }),
                    EntryState::Modified => Some(Change::Update {
                        kind,
                        id,
                        body: entry.document.clone(),
                    }),
                    EntryState::Deleted => Some(Change::Delete { kind, id }),
                    EntryState::Unchanged | EntryState::Detached => None,
                }
            })
            .collect();

        (changes, stamps)
    }

    /// Mark flushed entries as persisted. Entries changed since `pending`
    /// was taken are left staged.
    pub fn accept(&mut self, stamps: &[Stamp]) {
        for stamp in stamps {
            let state = match self.entries.get(&stamp.key) {
                Some(entry) if entry.version == stamp.version => entry.state,
                _ => continue,
            };
            match state {
                EntryState::Added | EntryState::Modified => {
                    if let Some(entry) = self.entries.get_mut(&stamp.key) {
                        entry.state = EntryState::Unchanged;
                    }
                }
                EntryState::Deleted => {
                    self.entries.remove(&stamp.key);
                }
                EntryState::Unchanged | EntryState::Detached => {}
            }
        }
    }
}

/// Handle on one tracked (or trackable) entity of a unit of work.
pub struct Entry<T> {
    session: Arc<Session>,
    id: Uuid,
    _entity: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Entry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("entity", &std::any::type_name::<T>())
            .field("id", &self.id)
            .finish()
    }
}

impl<T: Entity> Entry<T> {
    pub(crate) fn new(session: Arc<Session>, id: Uuid) -> Self {
        Self {
            session,
            id,
            _entity: PhantomData,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> EntryState {
        self.session.tracker().state(T::KIND, self.id)
    }

    /// The tracked snapshot, as it will be written on the next save.
    pub fn current(&self) -> Result<Option<T>> {
        self.session
            .tracker()
            .document(T::KIND, self.id)
            .map(|document| T::from_document(&document))
            .transpose()
    }

    /// Change the tracked snapshot in place and stage it as an update.
    pub fn modify<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut T),
    {
        // The tracker lock is released while `f` runs; `f` may use the unit of work.
        let document = self
            .session
            .tracker()
            .document(T::KIND, self.id)
            .ok_or(AnnalsError::NotTracked {
                entity: T::KIND,
                id: self.id,
            })?;

        let mut value = T::from_document(&document)?;
        f(&mut value);
        let document = value.to_document()?;
        self.session.tracker().update(T::KIND, self.id, document);
        Ok(())
    }
}
