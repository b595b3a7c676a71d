//! Eager-load clauses
//!
//! An [`Include`] names a navigation on an entity and knows how to populate it
//! from the documents of the related kind. Loading happens after filtering and
//! before ordering, for the whole materialised batch at once.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::database::ports::DocumentBatch;
use crate::domain::Entity;
use crate::error::Result;

type AttachFn<T> = Arc<dyn Fn(&mut [T], &DocumentBatch) -> Result<()> + Send + Sync>;

pub struct Include<T> {
    name: &'static str,
    related_kind: &'static str,
    attach: AttachFn<T>,
}

impl<T: Entity> Include<T> {
    /// Many-to-one navigation resolved through a foreign key on `T`.
    pub fn reference<R: Entity>(
        name: &'static str,
        key: fn(&T) -> Option<Uuid>,
        assign: fn(&mut T, Option<R>),
    ) -> Self {
        let attach: AttachFn<T> = Arc::new(move |items: &mut [T], batch: &DocumentBatch| {
            let related: HashMap<Uuid, R> = batch
                .related(R::KIND)
                .iter()
                .map(R::from_document)
                .map(|doc| doc.map(|r| (r.id(), r)))
                .collect::<Result<_>>()?;

            for item in items.iter_mut() {
                let target = key(item).and_then(|id| related.get(&id).cloned());
                assign(item, target);
            }
            Ok(())
        });

        Self {
            name,
            related_kind: R::KIND,
            attach,
        }
    }

    /// One-to-many navigation resolved through a back-reference on `R`.
    /// Children keep store order.
    pub fn collection<R: Entity>(
        name: &'static str,
        back_ref: fn(&R) -> Option<Uuid>,
        assign: fn(&mut T, Vec<R>),
    ) -> Self {
        let attach: AttachFn<T> = Arc::new(move |items: &mut [T], batch: &DocumentBatch| {
            let mut children: HashMap<Uuid, Vec<R>> = HashMap::new();
            for doc in batch.related(R::KIND) {
                let child = R::from_document(doc)?;
                if let Some(parent) = back_ref(&child) {
                    children.entry(parent).or_default().push(child);
                }
            }

            for item in items.iter_mut() {
                let owned = children.get(&item.id()).cloned().unwrap_or_default();
                assign(item, owned);
            }
            Ok(())
        });

        Self {
            name,
            related_kind: R::KIND,
            attach,
        }
    }
}

impl<T> Include<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn related_kind(&self) -> &'static str {
        self.related_kind
    }

    pub fn apply(&self, items: &mut [T], batch: &DocumentBatch) -> Result<()> {
        (self.attach)(items, batch)
    }
}

impl<T> Clone for Include<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            related_kind: self.related_kind,
            attach: Arc::clone(&self.attach),
        }
    }
}

impl<T> fmt::Debug for Include<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Include")
            .field("name", &self.name)
            .field("related_kind", &self.related_kind)
            .finish()
    }
}
