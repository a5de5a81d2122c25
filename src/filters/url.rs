//! Query-string codec for filter and sort state
//!
//! Internal field names are translated to the external parameter names
//! declared on [`FilterKey`]. List fields are comma-joined. Values equal to
//! the defaults are omitted; a typed optional field that the defaults
//! constrain but the state leaves open is written as `any`. Free text is
//! carried verbatim, so `any` is only special for numbers, flags and enums.
//! Blank text (empty or whitespace only) constrains nothing and is dropped.
//!
//! Decoding never fails: unknown parameters and unparseable values are
//! dropped and the field keeps its default.

use crate::models::{FilterKey, FilterState, ListingType, PropertyType, SortBy, SortOrder, SortSpec};
use std::fmt::Display;
use std::str::FromStr;
use url::form_urlencoded;

/// Separator for list-valued parameters
pub const LIST_DELIMITER: char = ',';

/// Marker for "explicitly unconstrained" on typed fields
pub const ANY: &str = "any";

pub const SORT_PARAM: &str = "sort";
pub const ORDER_PARAM: &str = "order";

/// State recovered from a query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedState {
    pub filters: FilterState,
    pub sort: SortSpec,

    /// Whether at least one known parameter was present
    pub recognised: bool,
}

/// Encode filters and sort against the baseline filters and default sort
pub fn encode_state(filters: &FilterState, sort: &SortSpec) -> String {
    let mut pairs = filter_params(filters, &FilterState::baseline());
    pairs.extend(sort_params(sort, &SortSpec::default()));

    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Decode a query string (with or without the leading `?`)
pub fn decode_state(query: &str) -> DecodedState {
    let mut filters = FilterState::baseline();
    let mut sort_by: Option<SortBy> = None;
    let mut sort_order: Option<SortOrder> = None;
    let mut recognised = false;

    for (name, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        match name.as_ref() {
            SORT_PARAM => {
                recognised = true;
                sort_by = parse_or_drop(SORT_PARAM, &value);
            }
            ORDER_PARAM => {
                recognised = true;
                sort_order = parse_or_drop(ORDER_PARAM, &value);
            }
            other => match FilterKey::from_str(other) {
                Ok(key) => {
                    recognised = true;
                    apply_param(&mut filters, key, &value);
                }
                Err(_) => tracing::trace!(param = %other, "Ignoring unknown query parameter"),
            },
        }
    }

    let default_sort = SortSpec::default();
    let sort = match sort_by {
        Some(sort_by) => SortSpec {
            sort_by,
            sort_order: sort_order.unwrap_or_else(|| sort_by.default_order()),
        },
        None => SortSpec {
            sort_by: default_sort.sort_by,
            sort_order: sort_order.unwrap_or(default_sort.sort_order),
        },
    };

    DecodedState {
        filters,
        sort,
        recognised,
    }
}

/// Parameters for every filter field that differs from `defaults`, in declaration order
pub fn filter_params(filters: &FilterState, defaults: &FilterState) -> Vec<(String, String)> {
    let filters = without_blank_text(filters);
    let defaults = without_blank_text(defaults);
    let mut params = Vec::new();

    let mut push = |key: FilterKey, value: Option<String>| {
        if let Some(value) = value {
            params.push((key.param_name(), value));
        }
    };

    push(FilterKey::Location, text(&filters.location, &defaults.location));
    push(
        FilterKey::PropertyTypes,
        list(&filters.property_types, &defaults.property_types),
    );
    push(FilterKey::ListingType, optional(&filters.listing_type, &defaults.listing_type));
    push(FilterKey::MinPrice, optional(&filters.min_price, &defaults.min_price));
    push(FilterKey::MaxPrice, optional(&filters.max_price, &defaults.max_price));
    push(FilterKey::MinArea, optional(&filters.min_area, &defaults.min_area));
    push(FilterKey::MaxArea, optional(&filters.max_area, &defaults.max_area));
    push(FilterKey::Bedrooms, optional(&filters.bedrooms, &defaults.bedrooms));
    push(FilterKey::Bathrooms, optional(&filters.bathrooms, &defaults.bathrooms));
    push(FilterKey::Amenities, list(&filters.amenities, &defaults.amenities));
    push(FilterKey::Features, list(&filters.features, &defaults.features));
    push(FilterKey::IsFeatured, optional(&filters.is_featured, &defaults.is_featured));
    push(FilterKey::IsActive, optional(&filters.is_active, &defaults.is_active));
    push(FilterKey::VerifiedOnly, optional(&filters.verified_only, &defaults.verified_only));

    params
}

fn sort_params(sort: &SortSpec, default: &SortSpec) -> Vec<(String, String)> {
    let mut params = Vec::new();
    if sort.sort_by != default.sort_by {
        params.push((SORT_PARAM.to_string(), sort.sort_by.to_string()));
    }
    let implied_order = if sort.sort_by == default.sort_by {
        default.sort_order
    } else {
        sort.sort_by.default_order()
    };
    if sort.sort_order != implied_order {
        params.push((ORDER_PARAM.to_string(), sort.sort_order.to_string()));
    }
    params
}

fn without_blank_text(filters: &FilterState) -> FilterState {
    let mut cleaned = filters.clone();
    cleaned.location = cleaned.location.filter(|location| !is_blank(location));
    cleaned.amenities.retain(|amenity| !is_blank(amenity));
    cleaned.features.retain(|feature| !is_blank(feature));
    cleaned
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Free text is written as-is; an empty value means unconstrained
fn text(value: &Option<String>, default: &Option<String>) -> Option<String> {
    if value == default {
        return None;
    }
    Some(value.clone().unwrap_or_default())
}

fn optional<T: PartialEq + Display>(value: &Option<T>, default: &Option<T>) -> Option<String> {
    if value == default {
        return None;
    }
    Some(match value {
        Some(value) => value.to_string(),
        None => ANY.to_string(),
    })
}

fn list<T: PartialEq + Display>(values: &[T], defaults: &[T]) -> Option<String> {
    if values == defaults {
        return None;
    }
    Some(
        values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(&LIST_DELIMITER.to_string()),
    )
}

fn parse_or_drop<T: FromStr>(param: &str, raw: &str) -> Option<T> {
    let parsed = raw.trim().parse::<T>().ok();
    if parsed.is_none() {
        tracing::debug!(param = %param, value = %raw, "Dropping malformed query parameter");
    }
    parsed
}

/// `any` clears the field, a valid value sets it, anything else leaves it untouched
fn optional_param<T: FromStr>(slot: &mut Option<T>, param: &str, raw: &str) {
    if raw.trim().eq_ignore_ascii_case(ANY) {
        *slot = None;
    } else if let Some(value) = parse_or_drop(param, raw) {
        *slot = Some(value);
    }
}

fn list_param<T: FromStr>(param: &str, raw: &str) -> Vec<T> {
    raw.split(LIST_DELIMITER)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| parse_or_drop(param, part))
        .collect()
}

fn text_list_param(raw: &str) -> Vec<String> {
    raw.split(LIST_DELIMITER)
        .filter(|part| !is_blank(part))
        .map(str::to_string)
        .collect()
}

fn apply_param(filters: &mut FilterState, key: FilterKey, raw: &str) {
    let param = key.param_name();
    match key {
        FilterKey::Location => {
            filters.location = if is_blank(raw) { None } else { Some(raw.to_string()) };
        }
        FilterKey::PropertyTypes => filters.property_types = list_param::<PropertyType>(&param, raw),
        FilterKey::ListingType => optional_param::<ListingType>(&mut filters.listing_type, &param, raw),
        FilterKey::MinPrice => optional_param(&mut filters.min_price, &param, raw),
        FilterKey::MaxPrice => optional_param(&mut filters.max_price, &param, raw),
        FilterKey::MinArea => optional_param(&mut filters.min_area, &param, raw),
        FilterKey::MaxArea => optional_param(&mut filters.max_area, &param, raw),
        FilterKey::Bedrooms => optional_param(&mut filters.bedrooms, &param, raw),
        FilterKey::Bathrooms => optional_param(&mut filters.bathrooms, &param, raw),
        FilterKey::Amenities => filters.amenities = text_list_param(raw),
        FilterKey::Features => filters.features = text_list_param(raw),
        FilterKey::IsFeatured => optional_param(&mut filters.is_featured, &param, raw),
        FilterKey::IsActive => optional_param(&mut filters.is_active, &param, raw),
        FilterKey::VerifiedOnly => optional_param(&mut filters.verified_only, &param, raw),
    }
}
