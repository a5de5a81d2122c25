//! Filter and sort state shared by the search pipeline
//!
//! `FilterState` is a closed record: every constraint the listing screens
//! understand is a named optional field. A field that is `None` (or an empty
//! list) is unconstrained; it never means zero.

use crate::models::property::{ListingType, PropertyType};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Structured search constraints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    /// Free-text location (city, locality)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Accepted property types
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub property_types: Vec<PropertyType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_type: Option<ListingType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_area: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_area: Option<u32>,

    /// Minimum bedroom count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,

    /// Minimum bathroom count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,

    /// Amenities that must all be available
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub amenities: Vec<String>,

    /// Feature phrases that must all appear in the listing text
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_only: Option<bool>,
}

/// Names of every filter field.
///
/// The string form is the external (URL / storage) parameter name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, EnumIter)]
pub enum FilterKey {
    #[strum(serialize = "location")]
    Location,
    #[strum(serialize = "type")]
    PropertyTypes,
    #[strum(serialize = "listing")]
    ListingType,
    #[strum(serialize = "minPrice")]
    MinPrice,
    #[strum(serialize = "maxPrice")]
    MaxPrice,
    #[strum(serialize = "minArea")]
    MinArea,
    #[strum(serialize = "maxArea")]
    MaxArea,
    #[strum(serialize = "beds")]
    Bedrooms,
    #[strum(serialize = "baths")]
    Bathrooms,
    #[strum(serialize = "amenities")]
    Amenities,
    #[strum(serialize = "features")]
    Features,
    #[strum(serialize = "featured")]
    IsFeatured,
    #[strum(serialize = "active")]
    IsActive,
    #[strum(serialize = "verified")]
    VerifiedOnly,
}

impl FilterKey {
    /// External parameter name for this field
    pub fn param_name(&self) -> String {
        self.to_string()
    }
}

/// A replacement value for exactly one filter field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterUpdate {
    Location(Option<String>),
    PropertyTypes(Vec<PropertyType>),
    ListingType(Option<ListingType>),
    MinPrice(Option<u64>),
    MaxPrice(Option<u64>),
    MinArea(Option<u32>),
    MaxArea(Option<u32>),
    Bedrooms(Option<u32>),
    Bathrooms(Option<u32>),
    Amenities(Vec<String>),
    Features(Vec<String>),
    IsFeatured(Option<bool>),
    IsActive(Option<bool>),
    VerifiedOnly(Option<bool>),
}

impl FilterUpdate {
    /// Field this update replaces
    pub fn key(&self) -> FilterKey {
        match self {
            FilterUpdate::Location(_) => FilterKey::Location,
            FilterUpdate::PropertyTypes(_) => FilterKey::PropertyTypes,
            FilterUpdate::ListingType(_) => FilterKey::ListingType,
            FilterUpdate::MinPrice(_) => FilterKey::MinPrice,
            FilterUpdate::MaxPrice(_) => FilterKey::MaxPrice,
            FilterUpdate::MinArea(_) => FilterKey::MinArea,
            FilterUpdate::MaxArea(_) => FilterKey::MaxArea,
            FilterUpdate::Bedrooms(_) => FilterKey::Bedrooms,
            FilterUpdate::Bathrooms(_) => FilterKey::Bathrooms,
            FilterUpdate::Amenities(_) => FilterKey::Amenities,
            FilterUpdate::Features(_) => FilterKey::Features,
            FilterUpdate::IsFeatured(_) => FilterKey::IsFeatured,
            FilterUpdate::IsActive(_) => FilterKey::IsActive,
            FilterUpdate::VerifiedOnly(_) => FilterKey::VerifiedOnly,
        }
    }
}

impl FilterState {
    /// The default filter object used by `clear_filters`: active listings only
    pub fn baseline() -> Self {
        Self {
            is_active: Some(true),
            ..Default::default()
        }
    }

    /// Replace one field, leaving the others untouched
    pub fn apply(&mut self, update: FilterUpdate) {
        match update {
            FilterUpdate::Location(value) => self.location = value,
            FilterUpdate::PropertyTypes(value) => self.property_types = value,
            FilterUpdate::ListingType(value) => self.listing_type = value,
            FilterUpdate::MinPrice(value) => self.min_price = value,
            FilterUpdate::MaxPrice(value) => self.max_price = value,
            FilterUpdate::MinArea(value) => self.min_area = value,
            FilterUpdate::MaxArea(value) => self.max_area = value,
            FilterUpdate::Bedrooms(value) => self.bedrooms = value,
            FilterUpdate::Bathrooms(value) => self.bathrooms = value,
            FilterUpdate::Amenities(value) => self.amenities = value,
            FilterUpdate::Features(value) => self.features = value,
            FilterUpdate::IsFeatured(value) => self.is_featured = value,
            FilterUpdate::IsActive(value) => self.is_active = value,
            FilterUpdate::VerifiedOnly(value) => self.verified_only = value,
        }
    }

    /// Overlay every constrained field of `other` onto `self`
    pub fn merge(&mut self, other: &FilterState) {
        if other.location.is_some() {
            self.location = other.location.clone();
        }
        if !other.property_types.is_empty() {
            self.property_types = other.property_types.clone();
        }
        if other.listing_type.is_some() {
            self.listing_type = other.listing_type;
        }
        if other.min_price.is_some() {
            self.min_price = other.min_price;
        }
        if other.max_price.is_some() {
            self.max_price = other.max_price;
        }
        if other.min_area.is_some() {
            self.min_area = other.min_area;
        }
        if other.max_area.is_some() {
            self.max_area = other.max_area;
        }
        if other.bedrooms.is_some() {
            self.bedrooms = other.bedrooms;
        }
        if other.bathrooms.is_some() {
            self.bathrooms = other.bathrooms;
        }
        if !other.amenities.is_empty() {
            self.amenities = other.amenities.clone();
        }
        if !other.features.is_empty() {
            self.features = other.features.clone();
        }
        if other.is_featured.is_some() {
            self.is_featured = other.is_featured;
        }
        if other.is_active.is_some() {
            self.is_active = other.is_active;
        }
        if other.verified_only.is_some() {
            self.verified_only = other.verified_only;
        }
    }

    /// Whether a field differs from `defaults` and actually constrains results
    pub fn is_field_active(&self, key: FilterKey, defaults: &FilterState) -> bool {
        fn scalar<T: PartialEq>(value: &Option<T>, default: &Option<T>) -> bool {
            value.is_some() && value != default
        }

        match key {
            FilterKey::Location => {
                self.location.as_deref().is_some_and(|l| !l.trim().is_empty())
                    && self.location != defaults.location
            }
            FilterKey::PropertyTypes => {
                !self.property_types.is_empty() && self.property_types != defaults.property_types
            }
            FilterKey::ListingType => scalar(&self.listing_type, &defaults.listing_type),
            FilterKey::MinPrice => scalar(&self.min_price, &defaults.min_price),
            FilterKey::MaxPrice => scalar(&self.max_price, &defaults.max_price),
            FilterKey::MinArea => scalar(&self.min_area, &defaults.min_area),
            FilterKey::MaxArea => scalar(&self.max_area, &defaults.max_area),
            FilterKey::Bedrooms => scalar(&self.bedrooms, &defaults.bedrooms),
            FilterKey::Bathrooms => scalar(&self.bathrooms, &defaults.bathrooms),
            FilterKey::Amenities => {
                !self.amenities.is_empty() && self.amenities != defaults.amenities
            }
            FilterKey::Features => !self.features.is_empty() && self.features != defaults.features,
            FilterKey::IsFeatured => scalar(&self.is_featured, &defaults.is_featured),
            FilterKey::IsActive => scalar(&self.is_active, &defaults.is_active),
            FilterKey::VerifiedOnly => scalar(&self.verified_only, &defaults.verified_only),
        }
    }

    /// Number of fields that constrain results beyond `defaults`
    pub fn active_count(&self, defaults: &FilterState) -> usize {
        FilterKey::iter()
            .filter(|key| self.is_field_active(*key, defaults))
            .count()
    }

    /// Copy with blank text trimmed away, used before deriving cache keys
    pub fn normalized(&self) -> Self {
        let mut normalized = self.clone();
        normalized.location = self
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        normalized
            .amenities
            .retain(|amenity| !amenity.trim().is_empty());
        normalized
            .features
            .retain(|feature| !feature.trim().is_empty());
        normalized
    }

    /// Whether any field needs the client-side fallback stage
    pub fn needs_client_refinement(&self) -> bool {
        !self.amenities.is_empty() || !self.features.is_empty()
    }
}

/// Field to sort listings by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortBy {
    Price,
    Area,
    Newest,
    Title,
    Relevance,
}

impl SortBy {
    /// Order applied when this field is first selected
    pub fn default_order(&self) -> SortOrder {
        match self {
            SortBy::Price => SortOrder::Asc,
            SortBy::Area => SortOrder::Desc,
            SortBy::Newest => SortOrder::Desc,
            SortBy::Title => SortOrder::Asc,
            SortBy::Relevance => SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flipped(&self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Sort field plus direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::by(SortBy::Relevance)
    }
}

impl SortSpec {
    /// Sort by `sort_by` in its default direction
    pub fn by(sort_by: SortBy) -> Self {
        Self {
            sort_by,
            sort_order: sort_by.default_order(),
        }
    }

    /// Select `sort_by`; selecting the current field again flips the direction
    pub fn toggle(&mut self, sort_by: SortBy) {
        if self.sort_by == sort_by {
            self.sort_order = self.sort_order.flipped();
        } else {
            *self = Self::by(sort_by);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_baseline_counts_nothing() {
        let baseline = FilterState::baseline();
        assert_eq!(baseline.active_count(&FilterState::baseline()), 0);
    }

    #[test]
    fn test_active_count_ignores_empty_values() {
        let mut filters = FilterState::baseline();
        filters.location = Some("   ".to_string());
        filters.amenities = Vec::new();
        assert_eq!(filters.active_count(&FilterState::baseline()), 0);

        filters.location = Some("Pune".to_string());
        filters.amenities = vec!["pool".to_string()];
        filters.bedrooms = Some(2);
        assert_eq!(filters.active_count(&FilterState::baseline()), 3);
    }

    #[test]
    fn test_is_active_change_counts() {
        let mut filters = FilterState::baseline();
        filters.is_active = Some(false);
        assert_eq!(filters.active_count(&FilterState::baseline()), 1);

        filters.is_active = None;
        assert_eq!(filters.active_count(&FilterState::baseline()), 0);
    }

    #[test]
    fn test_merge_only_overlays_constrained_fields() {
        let mut filters = FilterState {
            location: Some("Goa".to_string()),
            bedrooms: Some(1),
            ..FilterState::baseline()
        };
        let extracted = FilterState {
            bedrooms: Some(3),
            property_types: vec![PropertyType::Villa],
            ..Default::default()
        };

        filters.merge(&extracted);
        assert_eq!(filters.location.as_deref(), Some("Goa"));
        assert_eq!(filters.bedrooms, Some(3));
        assert_eq!(filters.property_types, vec![PropertyType::Villa]);
        assert_eq!(filters.is_active, Some(true));
    }

    #[test]
    fn test_apply_replaces_single_field() {
        let mut filters = FilterState::baseline();
        filters.apply(FilterUpdate::MinPrice(Some(1000)));
        filters.apply(FilterUpdate::Amenities(vec!["gym".to_string()]));

        assert_eq!(filters.min_price, Some(1000));
        assert_eq!(filters.amenities, vec!["gym".to_string()]);
        assert_eq!(filters.is_active, Some(true));
        assert_eq!(FilterUpdate::MinPrice(None).key(), FilterKey::MinPrice);
    }

    #[test]
    fn test_filter_key_param_names() {
        assert_eq!(FilterKey::MinPrice.param_name(), "minPrice");
        assert_eq!(FilterKey::from_str("beds").unwrap(), FilterKey::Bedrooms);
        assert!(FilterKey::from_str("unknown").is_err());
    }

    #[test]
    fn test_sort_toggle_flips_same_field() {
        let mut sort = SortSpec::default();
        assert_eq!(sort.sort_by, SortBy::Relevance);

        sort.toggle(SortBy::Price);
        assert_eq!(sort, SortSpec { sort_by: SortBy::Price, sort_order: SortOrder::Asc });

        sort.toggle(SortBy::Price);
        assert_eq!(sort.sort_order, SortOrder::Desc);

        sort.toggle(SortBy::Area);
        assert_eq!(sort, SortSpec { sort_by: SortBy::Area, sort_order: SortOrder::Desc });
    }

    #[test]
    fn test_normalized_trims_blank_text() {
        let filters = FilterState {
            location: Some("  ".to_string()),
            amenities: vec!["pool".to_string(), " ".to_string()],
            ..Default::default()
        };
        let normalized = filters.normalized();
        assert_eq!(normalized.location, None);
        assert_eq!(normalized.amenities, vec!["pool".to_string()]);
    }
}
