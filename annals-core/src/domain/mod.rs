//! Content entities stored by the repository layer

pub mod articles;
pub mod terms;

pub use articles::{Article, Category, ContentStatus};
pub use terms::{RelatedTerm, Term};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;
use crate::query::include::Include;

/// A type persisted as one document of kind [`Entity::KIND`].
pub trait Entity:
    Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: &'static str;

    fn id(&self) -> Uuid;

    /// Named eager-load clauses available to include-by-name reads.
    fn navigations() -> Vec<Include<Self>> {
        Vec::new()
    }

    /// Reset navigation fields so they are never written to the store.
    fn clear_navigations(&mut self) {}

    fn navigation(name: &str) -> Option<Include<Self>> {
        Self::navigations()
            .into_iter()
            .find(|include| include.name() == name)
    }

    fn to_document(&self) -> Result<Value> {
        let mut stored = self.clone();
        stored.clear_navigations();
        Ok(serde_json::to_value(stored)?)
    }

    fn from_document(document: &Value) -> Result<Self> {
        Ok(<Self as serde::Deserialize>::deserialize(document)?)
    }
}
