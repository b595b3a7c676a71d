use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Entity;
use crate::query::include::Include;
use crate::query::listing::Listable;
use crate::query::sorting::{SortRegistry, SortValue, Sortable};

/// A glossary term of the historical content set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub id: Uuid,
    pub name: String,
    pub definition: String,
    pub era: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Term {
    pub fn new(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            definition: definition.into(),
            era: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_era(mut self, era: impl Into<String>) -> Self {
        self.era = Some(era.into());
        self
    }
}

impl Entity for Term {
    const KIND: &'static str = "term";

    fn id(&self) -> Uuid {
        self.id
    }
}

static TERM_SORT: Lazy<SortRegistry<Term>> = Lazy::new(|| {
    SortRegistry::<Term>::new()
        .column("Id", |t| SortValue::from(t.id))
        .column("Name", |t| SortValue::from(t.name.as_str()))
        .column("Era", |t| SortValue::from(t.era.as_deref()))
        .column("CreatedAt", |t| SortValue::from(t.created_at))
});

impl Sortable for Term {
    fn sort_registry() -> &'static SortRegistry<Self> {
        &TERM_SORT
    }
}

impl Listable for Term {
    const FILTER_COLUMNS: &'static [&'static str] = &["Era"];

    fn title(&self) -> &str {
        &self.name
    }

    fn column_text(&self, column: &str) -> Option<String> {
        match column {
            "Era" => self.era.clone(),
            _ => None,
        }
    }
}

/// Directed link from one term to another, with an explanation of how they
/// relate. `term` is populated only when eager loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedTerm {
    pub id: Uuid,
    pub term_id: Uuid,
    pub related_term_id: Uuid,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<Term>,
}

impl RelatedTerm {
    pub const TERM: &'static str = "term";

    pub fn new(term_id: Uuid, related_term_id: Uuid, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            term_id,
            related_term_id,
            description: description.into(),
            term: None,
        }
    }

    pub fn include_term() -> Include<Self> {
        Include::reference::<Term>(
            Self::TERM,
            |link| Some(link.term_id),
            |link, term| link.term = term,
        )
    }
}

impl Entity for RelatedTerm {
    const KIND: &'static str = "related_term";

    fn id(&self) -> Uuid {
        self.id
    }

    fn navigations() -> Vec<Include<Self>> {
        vec![Self::include_term()]
    }

    fn clear_navigations(&mut self) {
        self.term = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_is_not_persisted() {
        let term = Term::new("Feudalism", "Land for service");
        let mut link = RelatedTerm::new(term.id, Uuid::new_v4(), "precedes");
        link.term = Some(term);

        let document = link.to_document().unwrap();
        assert!(document.get("term").is_none());
        assert_eq!(RelatedTerm::from_document(&document).unwrap().term, None);
    }

    #[test]
    fn navigation_lookup_by_name() {
        assert!(RelatedTerm::navigation("term").is_some());
        assert!(RelatedTerm::navigation("Term").is_none());
        assert!(Term::navigation("term").is_none());
    }
}
