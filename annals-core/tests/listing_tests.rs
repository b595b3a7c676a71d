//! Paged listings with runtime sort and filter.

mod support;

use annals_core::AnnalsError;
use annals_core::database::RepositoryBase;
use annals_core::domain::{Article, ContentStatus, Term};
use annals_core::query::{PageRequest, list_page};

use support::{CountingStore, factory, indices, seed};

async fn articles_with_indices(uow: &annals_core::application::RepositoryWrapper, indices: &[i32]) {
    let articles = indices
        .iter()
        .map(|i| Article::new(format!("Article {i}"), *i))
        .collect();
    uow.articles
        .create_range_async(articles)
        .await
        .expect("stage articles");
    uow.save_changes().await.expect("save articles");
}

#[tokio::test]
async fn descending_sort_by_index() {
    let uow = factory(CountingStore::new()).wrapper();
    articles_with_indices(&uow, &[3, 1, 2]).await;

    let result = list_page(&uow.articles, &PageRequest::new(10, 1).with_sort("-Index"))
        .await
        .expect("listing");
    assert_eq!(indices(&result.items), vec![3, 2, 1]);
    assert_eq!(result.pages, 1);
}

#[tokio::test]
async fn descending_is_the_reverse_of_ascending() {
    let uow = factory(CountingStore::new()).wrapper();
    articles_with_indices(&uow, &[7, 2, 9, 4, 0, 5]).await;

    let asc = list_page(&uow.articles, &PageRequest::new(10, 1).with_sort("Index"))
        .await
        .expect("ascending");
    let desc = list_page(&uow.articles, &PageRequest::new(10, 1).with_sort("-Index"))
        .await
        .expect("descending");

    let mut reversed = indices(&asc.items);
    reversed.reverse();
    assert_eq!(indices(&desc.items), reversed);
}

#[tokio::test]
async fn second_page_of_five() {
    let uow = factory(CountingStore::new()).wrapper();
    articles_with_indices(&uow, &[4, 0, 3, 1, 2]).await;

    let result = list_page(&uow.articles, &PageRequest::new(2, 2).with_sort("Index"))
        .await
        .expect("listing");
    assert_eq!(indices(&result.items), vec![2, 3]);
    assert_eq!(result.pages, 3);
}

#[tokio::test]
async fn page_past_the_end_is_empty() {
    let uow = factory(CountingStore::new()).wrapper();
    articles_with_indices(&uow, &[0, 1, 2, 3, 4]).await;

    let last = list_page(&uow.articles, &PageRequest::new(2, 3).with_sort("Index"))
        .await
        .expect("last page");
    assert_eq!(indices(&last.items), vec![4]);

    let past = list_page(&uow.articles, &PageRequest::new(2, 4).with_sort("Index"))
        .await
        .expect("past the end");
    assert!(past.items.is_empty());
    assert_eq!(past.pages, 3);
}

#[tokio::test]
async fn status_filter_value_contains_row_status() {
    let uow = factory(CountingStore::new()).wrapper();
    uow.articles
        .create_range_async(vec![
            Article::new("Kept", 1),
            Article::new("Dropped", 2).with_status(ContentStatus::Archived),
        ])
        .await
        .expect("stage");
    uow.save_changes().await.expect("save");

    let result = list_page(
        &uow.articles,
        &PageRequest::new(10, 1).with_filter("Status:Draft,Published"),
    )
    .await
    .expect("listing");
    let titles: Vec<&str> = result.items.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["Kept"]);
    assert_eq!(result.pages, 1);
}

#[tokio::test]
async fn unknown_sort_column_fails_before_reading() {
    let store = CountingStore::new();
    let uow = factory(store.clone()).wrapper();
    articles_with_indices(&uow, &[1, 2]).await;
    store.reset();

    let err = list_page(&uow.articles, &PageRequest::new(10, 1).with_sort("Bogus"))
        .await
        .expect_err("bogus column");
    match err {
        AnnalsError::InvalidSortKey { column } => assert_eq!(column, "Bogus"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.fetches(), 0);
}

#[tokio::test]
async fn sort_column_is_case_sensitive() {
    let uow = factory(CountingStore::new()).wrapper();
    let err = list_page(&uow.articles, &PageRequest::new(10, 1).with_sort("-index"))
        .await
        .expect_err("lower-case column");
    assert!(matches!(err, AnnalsError::InvalidSortKey { .. }));
}

#[tokio::test]
async fn invalid_paging_is_rejected() {
    let uow = factory(CountingStore::new()).wrapper();

    let err = list_page(&uow.articles, &PageRequest::new(0, 1))
        .await
        .expect_err("zero amount");
    assert!(matches!(err, AnnalsError::InvalidPageSize(0)));

    let err = list_page(&uow.articles, &PageRequest::new(5, 0))
        .await
        .expect_err("page zero");
    assert!(matches!(err, AnnalsError::InvalidPage(0)));
}

#[tokio::test]
async fn title_filter_is_case_insensitive() {
    let uow = factory(CountingStore::new()).wrapper();
    seed(&uow).await;

    let result = list_page(
        &uow.articles,
        &PageRequest::new(10, 1).with_title("  ROUTES ").with_sort("Title"),
    )
    .await
    .expect("listing");
    let titles: Vec<&str> = result.items.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["Trade Routes"]);
}

#[tokio::test]
async fn unsorted_listing_keeps_store_order() {
    let uow = factory(CountingStore::new()).wrapper();
    articles_with_indices(&uow, &[5, 3, 8]).await;

    let result = list_page(&uow.articles, &PageRequest::new(10, 1).with_sort("   "))
        .await
        .expect("listing");
    assert_eq!(indices(&result.items), vec![5, 3, 8]);
}

#[tokio::test]
async fn terms_list_by_era() {
    let uow = factory(CountingStore::new()).wrapper();
    seed(&uow).await;

    let result = list_page(
        &uow.terms,
        &PageRequest::new(1, 1).with_filter("Era:Medieval").with_sort("-Name"),
    )
    .await
    .expect("listing");
    let names: Vec<String> = result.items.into_iter().map(|t: Term| t.name).collect();
    assert_eq!(names, vec!["Serfdom"]);
    assert_eq!(result.pages, 2);
}
