//! End-to-end tests of query parsing, fetching, paging and client refinement

mod common;

use common::{ids, listing, sample_listings, with_amenities};
use listing_search::{
    api::InMemoryPropertyApi,
    config::SearchConfig,
    filters::FilterStore,
    models::{FilterState, FilterUpdate, PropertyType, SortBy, SortSpec},
    search::{self, CacheKey, QueryKind, SearchService},
};
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn service_over(api: &InMemoryPropertyApi, page_size: u32) -> SearchService {
    SearchService::new(
        Arc::new(api.clone()),
        SearchConfig {
            page_size,
            ..SearchConfig::default()
        },
    )
}

#[tokio::test]
async fn test_load_more_exhaustion_scenario() {
    let api = InMemoryPropertyApi::new(sample_listings(25));
    let service = service_over(&api, 20);

    let first = service.search("", &FilterState::baseline()).await;
    assert_eq!(first.items.len(), 20);
    assert!(first.has_more);

    let second = service.load_more().await.expect("second page");
    assert_eq!(second.items.len(), 5);
    assert!(!second.has_more);

    let before = service.snapshot();
    assert!(service.load_more().await.is_none());
    assert_eq!(service.snapshot(), before);
    assert_eq!(before.items.len(), 25);
}

#[tokio::test]
async fn test_pagination_merge_is_append_only() {
    let api = InMemoryPropertyApi::new(sample_listings(12));
    let service = service_over(&api, 5);

    let first = service.search("apartment", &FilterState::baseline()).await;
    let second = service.load_more().await.unwrap();

    let accumulated = service.snapshot().items;
    assert_eq!(accumulated.len(), first.items.len() + second.items.len());

    let mut expected = ids(&first.items);
    expected.extend(ids(&second.items));
    assert_eq!(ids(&accumulated), expected);

    let unique: HashSet<_> = expected.iter().collect();
    assert_eq!(unique.len(), expected.len());
}

#[tokio::test]
async fn test_free_text_query_drives_filters_and_endpoint() {
    let mut dataset = sample_listings(6);
    let mut villa = listing(100, "Hilltop villa", PropertyType::Villa);
    villa.bedrooms = 3;
    villa.location = "Goa".to_string();
    dataset.push(villa);
    let api = InMemoryPropertyApi::new(dataset);
    let service = service_over(&api, 20);

    let parsed = search::parse("3 bhk villa goa");
    assert_eq!(parsed.clean_query, "goa");

    let mut store = FilterStore::default();
    store.apply_extracted(&parsed);
    let page = service.search(&parsed.clean_query, store.filters()).await;

    assert_eq!(ids(&page.items), vec![100]);
    assert_eq!(service.snapshot().kind, Some(QueryKind::Search));
    assert_eq!(api.calls().search.load(Ordering::SeqCst), 1);
    assert_eq!(api.calls().filter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_client_amenity_filter_scenario() {
    let first = with_amenities(listing(1, "Pool only", PropertyType::House), &[("pool", true), ("gym", false)]);
    let second = with_amenities(listing(2, "Pool and gym", PropertyType::House), &[("pool", true), ("gym", true)]);
    let api = InMemoryPropertyApi::new(vec![first, second]);
    let service = service_over(&api, 20);

    let mut store = FilterStore::default();
    store.update_filter(FilterUpdate::Amenities(vec!["pool".to_string(), "gym".to_string()]));
    service.search("", store.filters()).await;

    assert_eq!(service.snapshot().items.len(), 2);
    assert_eq!(ids(&service.results(&store.sort())), vec![2]);
}

#[tokio::test]
async fn test_relevance_sort_puts_featured_first() {
    let mut dataset = sample_listings(8);
    for property in dataset.iter_mut().filter(|p| p.id % 3 == 0) {
        property.is_featured = true;
    }
    let api = InMemoryPropertyApi::new(dataset);
    let service = service_over(&api, 20);
    service.search("", &FilterState::baseline()).await;

    let sorted = service.results(&SortSpec::by(SortBy::Relevance));
    let featured_prefix: Vec<bool> = sorted.iter().map(|p| p.is_featured).collect();
    assert_eq!(featured_prefix, vec![true, true, false, false, false, false, false, false]);
    // newest first within each group
    assert_eq!(ids(&sorted), vec![6, 3, 8, 7, 5, 4, 2, 1]);

    assert_eq!(service.results(&SortSpec::by(SortBy::Relevance)), sorted);
}

#[tokio::test]
async fn test_cache_shared_across_clear_search() {
    let api = InMemoryPropertyApi::new(sample_listings(10));
    let service = service_over(&api, 20);
    let filters = FilterState {
        bedrooms: Some(2),
        ..FilterState::baseline()
    };

    service.search("", &filters).await;
    service.clear_search();
    assert!(service.snapshot().items.is_empty());

    service.search("", &filters).await;
    assert_eq!(api.calls().filter.load(Ordering::SeqCst), 1);
    assert!(!service.snapshot().items.is_empty());
}

#[test]
fn test_cache_keys_distinguish_every_request_field() {
    let filters = FilterState::baseline();
    let base = CacheKey::new(QueryKind::Search, "villa", &filters, 1, 20);

    let variants = [
        CacheKey::new(QueryKind::Filter, "villa", &filters, 1, 20),
        CacheKey::new(QueryKind::Search, "villas", &filters, 1, 20),
        CacheKey::new(QueryKind::Search, "villa", &filters, 2, 20),
        CacheKey::new(
            QueryKind::Search,
            "villa",
            &FilterState {
                min_price: Some(1),
                ..FilterState::baseline()
            },
            1,
            20,
        ),
    ];
    for variant in &variants {
        assert_ne!(&base, variant);
    }

    assert_eq!(base, CacheKey::new(QueryKind::Search, " Villa ", &FilterState::baseline(), 1, 20));
}
