use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Entity;
use crate::query::include::Include;
use crate::query::listing::Listable;
use crate::query::sorting::{SortRegistry, SortValue, Sortable};

/// Editorial state of an article.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum ContentStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl ContentStatus {
    fn rank(self) -> i32 {
        match self {
            ContentStatus::Draft => 0,
            ContentStatus::Published => 1,
            ContentStatus::Archived => 2,
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContentStatus::Draft => "Draft",
            ContentStatus::Published => "Published",
            ContentStatus::Archived => "Archived",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    /// Position of the article inside its listing
    pub index: i32,
    pub status: ContentStatus,
    pub category_id: Option<Uuid>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl Article {
    pub const CATEGORY: &'static str = "category";

    pub fn new(title: impl Into<String>, index: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            index,
            status: ContentStatus::Draft,
            category_id: None,
            published_at: None,
            created_at: Utc::now(),
            category: None,
        }
    }

    pub fn with_status(mut self, status: ContentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn in_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Mark as published at `at`.
    pub fn published(mut self, at: DateTime<Utc>) -> Self {
        self.status = ContentStatus::Published;
        self.published_at = Some(at);
        self
    }

    pub fn include_category() -> Include<Self> {
        Include::reference::<Category>(
            Self::CATEGORY,
            |article| article.category_id,
            |article, category| article.category = category,
        )
    }
}

impl Entity for Article {
    const KIND: &'static str = "article";

    fn id(&self) -> Uuid {
        self.id
    }

    fn navigations() -> Vec<Include<Self>> {
        vec![Self::include_category()]
    }

    fn clear_navigations(&mut self) {
        self.category = None;
    }
}

static ARTICLE_SORT: Lazy<SortRegistry<Article>> = Lazy::new(|| {
    SortRegistry::<Article>::new()
        .column("Id", |a| SortValue::from(a.id))
        .column("Title", |a| SortValue::from(a.title.as_str()))
        .column("Index", |a| SortValue::from(a.index))
        .column("Status", |a| SortValue::from(a.status.rank()))
        .column("PublishedAt", |a| SortValue::from(a.published_at))
        .column("CreatedAt", |a| SortValue::from(a.created_at))
});

impl Sortable for Article {
    fn sort_registry() -> &'static SortRegistry<Self> {
        &ARTICLE_SORT
    }
}

impl Listable for Article {
    const FILTER_COLUMNS: &'static [&'static str] = &["Status"];

    fn title(&self) -> &str {
        &self.title
    }

    fn column_text(&self, column: &str) -> Option<String> {
        match column {
            "Status" => Some(self.status.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub articles: Vec<Article>,
}

impl Category {
    pub const ARTICLES: &'static str = "articles";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            articles: Vec::new(),
        }
    }

    pub fn include_articles() -> Include<Self> {
        Include::collection::<Article>(
            Self::ARTICLES,
            |article| article.category_id,
            |category, articles| category.articles = articles,
        )
    }
}

impl Entity for Category {
    const KIND: &'static str = "category";

    fn id(&self) -> Uuid {
        self.id
    }

    fn navigations() -> Vec<Include<Self>> {
        vec![Self::include_articles()]
    }

    fn clear_navigations(&mut self) {
        self.articles.clear();
    }
}
