//! Filter state round-trips through the URL and durable storage

use listing_search::{
    config::SyncConfig,
    filters::{decode_state, encode_state, FilterStore, FilterSynchronizer, LoadSource, LocationSink, MemoryLocation},
    models::{FilterState, FilterUpdate, ListingType, PropertyType, SortBy, SortOrder, SortSpec},
    state::{InMemoryKvStore, KeyValueStore, SledKvStore},
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn sync_config() -> SyncConfig {
    SyncConfig {
        debounce_ms: 300,
        ..SyncConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_debounced_save_writes_once_with_last_state() {
    let location = Arc::new(MemoryLocation::default());
    let sync = FilterSynchronizer::new(location.clone(), None, "search", &sync_config());
    let mut store = FilterStore::default().with_synchronizer(sync);

    store.update_filter(FilterUpdate::Bedrooms(Some(1)));
    tokio::time::sleep(Duration::from_millis(100)).await;
    store.update_filter(FilterUpdate::Bedrooms(Some(2)));
    tokio::time::sleep(Duration::from_millis(100)).await;
    store.update_filter(FilterUpdate::Bedrooms(Some(3)));
    assert_eq!(location.write_count(), 0);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(location.write_count(), 1);
    assert_eq!(location.current_query(), "beds=3");
}

#[tokio::test(start_paused = true)]
async fn test_teardown_flushes_mid_debounce() {
    let location = Arc::new(MemoryLocation::default());
    let sync = FilterSynchronizer::new(location.clone(), None, "search", &sync_config());
    let mut store = FilterStore::default().with_synchronizer(sync);

    store.toggle_sort(SortBy::Price);
    store.teardown();

    assert_eq!(location.write_count(), 1);
    assert_eq!(location.current_query(), "sort=price");
}

#[test]
fn test_url_round_trip_preserves_filters() {
    let filters = FilterState {
        location: Some("Navi Mumbai".to_string()),
        property_types: vec![PropertyType::Villa, PropertyType::Plot],
        listing_type: Some(ListingType::Sale),
        min_price: Some(250_000),
        max_price: Some(900_000),
        min_area: Some(800),
        bedrooms: Some(2),
        bathrooms: Some(2),
        amenities: vec!["pool".to_string(), "power backup".to_string()],
        features: vec!["sea facing".to_string()],
        is_featured: Some(true),
        is_active: None,
        verified_only: Some(true),
        ..FilterState::default()
    };
    let sort = SortSpec {
        sort_by: SortBy::Area,
        sort_order: SortOrder::Asc,
    };

    let decoded = decode_state(&encode_state(&filters, &sort));
    assert_eq!(decoded.filters, filters);
    assert_eq!(decoded.sort, sort);
}

#[test]
fn test_malformed_url_never_fails_load() {
    let location = Arc::new(MemoryLocation::new("?minPrice=cheap&beds=2&type=castle,villa&order=sideways"));
    let sync = FilterSynchronizer::new(location, None, "search", &sync_config());

    let loaded = sync.load(&FilterState::baseline(), &SortSpec::default());
    assert_eq!(loaded.source, LoadSource::Url);
    assert_eq!(loaded.filters.min_price, None);
    assert_eq!(loaded.filters.bedrooms, Some(2));
    assert_eq!(loaded.filters.property_types, vec![PropertyType::Villa]);
    assert_eq!(loaded.sort, SortSpec::default());
}

#[test]
fn test_filters_restored_from_sled_on_next_mount() {
    let dir = TempDir::new().unwrap();
    let kv: Arc<dyn KeyValueStore> = Arc::new(SledKvStore::new(dir.path().join("filters.db")).unwrap());

    {
        let sync = FilterSynchronizer::new(Arc::new(MemoryLocation::default()), Some(kv.clone()), "search", &sync_config());
        let mut store = FilterStore::default().with_synchronizer(sync);
        store.update_filter(FilterUpdate::ListingType(Some(ListingType::Rent)));
        store.update_filter(FilterUpdate::MaxPrice(Some(30_000)));
        store.teardown();
    }

    let sync = FilterSynchronizer::new(Arc::new(MemoryLocation::default()), Some(kv), "search", &sync_config());
    let store = FilterStore::default().with_synchronizer(sync);

    assert_eq!(store.filters().listing_type, Some(ListingType::Rent));
    assert_eq!(store.filters().max_price, Some(30_000));
    assert_eq!(store.active_filter_count(), 2);
}

#[test]
fn test_screens_use_separate_storage_keys() {
    let kv = Arc::new(InMemoryKvStore::new());
    let search = FilterSynchronizer::new(
        Arc::new(MemoryLocation::default()),
        Some(kv.clone()),
        "search",
        &sync_config(),
    );
    let listings = FilterSynchronizer::new(
        Arc::new(MemoryLocation::default()),
        Some(kv.clone()),
        "listings",
        &sync_config(),
    );

    search.save(
        &FilterState {
            bedrooms: Some(4),
            ..FilterState::baseline()
        },
        &SortSpec::default(),
    );

    let loaded = listings.load(&FilterState::baseline(), &SortSpec::default());
    assert_eq!(loaded.source, LoadSource::Initial);
    assert_eq!(kv.get(search.storage_key()).unwrap().as_deref(), Some("beds=4"));
}
