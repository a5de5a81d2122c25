//! Client-side filtering and sorting for constraints the listing API ignores
//!
//! Everything here is a pure function of its inputs so the same page, filters
//! and sort always render in the same order.

use crate::models::{FilterState, Property, SortBy, SortSpec};
use std::cmp::Ordering;

/// Filter then sort an already-fetched result set
pub fn refine(items: &[Property], filters: &FilterState, sort: &SortSpec) -> Vec<Property> {
    let mut refined = filter_properties(items, filters);
    sort_properties(&mut refined, sort);
    refined
}

/// Keep properties that have every requested amenity and mention every requested feature
pub fn filter_properties(items: &[Property], filters: &FilterState) -> Vec<Property> {
    if !filters.needs_client_refinement() {
        return items.to_vec();
    }

    let features: Vec<String> = filters
        .features
        .iter()
        .map(|feature| feature.trim().to_lowercase())
        .filter(|feature| !feature.is_empty())
        .collect();

    items
        .iter()
        .filter(|property| has_all_amenities(property, &filters.amenities))
        .filter(|property| mentions_all_features(property, &features))
        .cloned()
        .collect()
}

fn has_all_amenities(property: &Property, amenities: &[String]) -> bool {
    amenities
        .iter()
        .filter(|amenity| !amenity.trim().is_empty())
        .all(|amenity| property.has_amenity(amenity.trim()))
}

fn mentions_all_features(property: &Property, features: &[String]) -> bool {
    if features.is_empty() {
        return true;
    }
    let text = property.feature_text();
    features.iter().all(|feature| text.contains(feature.as_str()))
}

/// Stable sort in place; ties keep their incoming order
pub fn sort_properties(items: &mut [Property], sort: &SortSpec) {
    let reversed = sort.sort_order != sort.sort_by.default_order();
    items.sort_by(|a, b| {
        let ordering = compare(a, b, sort.sort_by);
        if reversed {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

/// Comparison in the field's default direction (see [`SortBy::default_order`])
fn compare(a: &Property, b: &Property, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::Price => a.price.cmp(&b.price),
        SortBy::Area => b.area.total_cmp(&a.area),
        SortBy::Newest => b.created_at.cmp(&a.created_at),
        SortBy::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortBy::Relevance => b
            .is_featured
            .cmp(&a.is_featured)
            .then_with(|| b.created_at.cmp(&a.created_at)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListingType, PropertyType, SortOrder};
    use chrono::{Duration, TimeZone, Utc};

    fn property(id: u64, price: u64, featured: bool, age_days: i64) -> Property {
        let mut p = Property::new(id, format!("Listing {id}"), price, PropertyType::House, ListingType::Sale);
        p.is_featured = featured;
        p.created_at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() - Duration::days(age_days);
        p
    }

    fn ids(items: &[Property]) -> Vec<u64> {
        items.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_amenity_filter_is_conjunction() {
        let mut only_pool = property(1, 100, false, 0);
        only_pool.amenities.insert("pool".to_string(), true);
        only_pool.amenities.insert("gym".to_string(), false);

        let mut both = property(2, 100, false, 0);
        both.amenities.insert("pool".to_string(), true);
        both.amenities.insert("gym".to_string(), true);

        let filters = FilterState {
            amenities: vec!["pool".to_string(), "gym".to_string()],
            ..Default::default()
        };

        let result = filter_properties(&[only_pool, both], &filters);
        assert_eq!(ids(&result), vec![2]);
    }

    #[test]
    fn test_feature_filter_matches_substrings_case_insensitively() {
        let mut garden = property(1, 100, false, 0);
        garden.description = "Lovely private Garden and terrace".to_string();
        let mut plain = property(2, 100, false, 0);
        plain.description = "Compact studio".to_string();
        let mut tagged = property(3, 100, false, 0);
        tagged.features = vec!["GARDEN view".to_string()];

        let filters = FilterState {
            features: vec!["garden".to_string()],
            ..Default::default()
        };

        let result = filter_properties(&[garden, plain, tagged], &filters);
        assert_eq!(ids(&result), vec![1, 3]);
    }

    #[test]
    fn test_no_client_filters_keeps_everything() {
        let items = vec![property(1, 10, false, 0), property(2, 20, false, 0)];
        let result = filter_properties(&items, &FilterState::baseline());
        assert_eq!(result, items);
    }

    #[test]
    fn test_price_sort_both_directions() {
        let mut items = vec![property(1, 300, false, 0), property(2, 100, false, 0), property(3, 200, false, 0)];

        sort_properties(&mut items, &SortSpec::by(SortBy::Price));
        assert_eq!(ids(&items), vec![2, 3, 1]);

        sort_properties(&mut items, &SortSpec { sort_by: SortBy::Price, sort_order: SortOrder::Desc });
        assert_eq!(ids(&items), vec![1, 3, 2]);
    }

    #[test]
    fn test_relevance_puts_featured_first_then_newest() {
        let mut items = vec![
            property(1, 100, false, 1),
            property(2, 100, true, 10),
            property(3, 100, false, 0),
            property(4, 100, true, 2),
        ];

        sort_properties(&mut items, &SortSpec::by(SortBy::Relevance));
        assert_eq!(ids(&items), vec![4, 2, 3, 1]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let mut items = vec![
            property(5, 100, false, 0),
            property(1, 100, false, 0),
            property(3, 100, false, 0),
        ];

        sort_properties(&mut items, &SortSpec::by(SortBy::Price));
        assert_eq!(ids(&items), vec![5, 1, 3]);

        sort_properties(&mut items, &SortSpec { sort_by: SortBy::Price, sort_order: SortOrder::Desc });
        assert_eq!(ids(&items), vec![5, 1, 3]);
    }

    #[test]
    fn test_sorting_twice_is_identical() {
        let items = vec![
            property(1, 300, true, 4),
            property(2, 100, false, 3),
            property(3, 300, false, 2),
            property(4, 200, true, 1),
        ];
        let sort = SortSpec::by(SortBy::Newest);

        let once = refine(&items, &FilterState::default(), &sort);
        let twice = refine(&once, &FilterState::default(), &sort);
        assert_eq!(once, twice);
        assert_eq!(ids(&once), vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_title_sort_ignores_case() {
        let mut a = property(1, 1, false, 0);
        a.title = "beach house".to_string();
        let mut b = property(2, 1, false, 0);
        b.title = "Attic".to_string();

        let mut items = vec![a, b];
        sort_properties(&mut items, &SortSpec::by(SortBy::Title));
        assert_eq!(ids(&items), vec![2, 1]);
    }
}
