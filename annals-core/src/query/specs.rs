//! Named query shapes used by the content handlers

use uuid::Uuid;

use super::specification::Specification;
use super::sorting::SortValue;
use crate::domain::{Article, Category, ContentStatus, RelatedTerm, Term};

/// Related-term links with the source term eager loaded.
#[derive(Debug, Clone, Copy)]
pub struct RelatedTermsWithTerm;

impl RelatedTermsWithTerm {
    pub const CACHE_TAG: &'static str = "AllRelatedTermsWithTerm";

    /// Every link. Cached under [`Self::CACHE_TAG`].
    pub fn all() -> Specification<RelatedTerm> {
        Specification::builder()
            .include(RelatedTerm::include_term())
            .cache_tag(Self::CACHE_TAG)
            .build()
    }

    /// Links of one term. Not cached.
    pub fn for_term(term_id: Uuid) -> Specification<RelatedTerm> {
        Specification::builder()
            .filter(move |link: &RelatedTerm| link.term_id == term_id)
            .include(RelatedTerm::include_term())
            .build()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TermsByName;

impl TermsByName {
    pub fn all() -> Specification<Term> {
        Specification::builder()
            .order_by(|term: &Term| SortValue::from(term.name.as_str()))
            .build()
    }

    /// Terms of one era, alphabetical.
    pub fn in_era(era: impl Into<String>) -> Specification<Term> {
        let era = era.into();
        Specification::builder()
            .filter(move |term: &Term| term.era.as_deref() == Some(era.as_str()))
            .order_by(|term: &Term| SortValue::from(term.name.as_str()))
            .build()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ArticlesInCategory;

impl ArticlesInCategory {
    pub fn new(category_id: Uuid) -> Specification<Article> {
        Specification::builder()
            .filter(move |article: &Article| article.category_id == Some(category_id))
            .include(Article::include_category())
            .order_by(|article: &Article| SortValue::from(article.index))
            .build()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PublishedArticles;

impl PublishedArticles {
    /// Newest first.
    pub fn page(skip: usize, take: usize) -> Specification<Article> {
        Specification::builder()
            .filter(|article: &Article| article.status == ContentStatus::Published)
            .order_by_desc(|article: &Article| SortValue::from(article.published_at))
            .page(skip, take)
            .build()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CategoriesWithArticles;

impl CategoriesWithArticles {
    pub const CACHE_TAG: &'static str = "AllCategoriesWithArticles";

    pub fn all() -> Specification<Category> {
        Specification::builder()
            .include(Category::include_articles())
            .order_by(|category: &Category| SortValue::from(category.name.as_str()))
            .cache_tag(Self::CACHE_TAG)
            .build()
    }
}

/// Articles clustered by status, each cluster in index order.
#[derive(Debug, Clone, Copy)]
pub struct ArticlesByStatus;

impl ArticlesByStatus {
    pub fn all() -> Specification<Article> {
        Specification::builder()
            .order_by(|article: &Article| SortValue::from(article.index))
            .group_by(|article: &Article| SortValue::from(article.status.to_string()))
            .build()
    }
}
