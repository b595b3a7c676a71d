#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use annals_core::Result;
use annals_core::application::{RepositoryFactory, RepositoryWrapper};
use annals_core::database::{
    ChangeSet, DocumentBatch, DocumentQuery, DocumentSource, DocumentStore,
    MemoryDocumentStore, MemoryQueryCache, QueryCache, RepositoryBase, StoreTransaction,
};
use annals_core::domain::{Article, Category, ContentStatus, RelatedTerm, Term};
use async_trait::async_trait;

/// Store double that counts reads and forwards to the in-memory store.
#[derive(Debug, Default)]
pub struct CountingStore {
    pub inner: MemoryDocumentStore,
    fetches: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.fetches.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentSource for CountingStore {
    async fn fetch(&self, query: &DocumentQuery) -> Result<DocumentBatch> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(query).await
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn apply(&self, changes: &ChangeSet) -> Result<u64> {
        self.inner.apply(changes).await
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        self.inner.begin().await
    }

    async fn execute_raw(&self, statement: &str) -> Result<u64> {
        self.inner.execute_raw(statement).await
    }
}

/// Cache double that counts writes and forwards to the in-memory cache.
#[derive(Debug, Default)]
pub struct CountingCache {
    pub inner: MemoryQueryCache,
    sets: AtomicUsize,
}

impl CountingCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryCache for CountingCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, ttl).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key).await
    }
}

pub fn factory(store: Arc<CountingStore>) -> RepositoryFactory {
    RepositoryFactory::new(store)
}

pub fn cached_factory(
    store: Arc<CountingStore>,
    cache: Arc<CountingCache>,
    ttl: Duration,
) -> RepositoryFactory {
    RepositoryFactory::new(store).with_cache(cache, ttl)
}

#[derive(Debug, Clone)]
pub struct Seeded {
    pub terms: Vec<Term>,
    pub links: Vec<RelatedTerm>,
    pub categories: Vec<Category>,
    pub articles: Vec<Article>,
}

/// Three terms with two links, two categories and five articles whose
/// indices are stored out of order.
pub async fn seed(uow: &RepositoryWrapper) -> Seeded {
    let terms = vec![
        Term::new("Serfdom", "Bound to the land").with_era("Medieval"),
        Term::new("Feudalism", "Land for service").with_era("Medieval"),
        Term::new("Mercantilism", "Trade as national policy").with_era("Early Modern"),
    ];
    let links = vec![
        RelatedTerm::new(terms[0].id, terms[1].id, "part of"),
        RelatedTerm::new(terms[2].id, terms[1].id, "succeeded"),
    ];
    let categories = vec![Category::new("Economy"), Category::new("Society")];
    let articles = vec![
        Article::new("The Manor", 3).in_category(categories[0].id),
        Article::new("Guilds", 1)
            .in_category(categories[0].id)
            .with_status(ContentStatus::Published),
        Article::new("Peasant Revolts", 4)
            .in_category(categories[1].id)
            .with_status(ContentStatus::Archived),
        Article::new("Trade Routes", 0).in_category(categories[0].id),
        Article::new("Knighthood", 2)
            .in_category(categories[1].id)
            .with_status(ContentStatus::Published),
    ];

    uow.terms
        .create_range_async(terms.clone())
        .await
        .expect("stage terms");
    uow.related_terms
        .create_range_async(links.clone())
        .await
        .expect("stage links");
    uow.categories
        .create_range_async(categories.clone())
        .await
        .expect("stage categories");
    uow.articles
        .create_range_async(articles.clone())
        .await
        .expect("stage articles");
    uow.save_changes().await.expect("save seed data");

    Seeded {
        terms,
        links,
        categories,
        articles,
    }
}

pub fn indices(articles: &[Article]) -> Vec<i32> {
    articles.iter().map(|a| a.index).collect()
}
