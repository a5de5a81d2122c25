use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumIter, EnumString};

/// Identifier shared by listings and favorites
pub type PropertyId = u64;

/// Kind of property being listed
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PropertyType {
    Apartment,
    Villa,
    House,
    Plot,
    Commercial,
}

/// Whether a listing is offered for rent or for sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ListingType {
    Rent,
    Sale,
}

/// A property listing as returned by the listing API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    /// Unique identifier
    pub id: PropertyId,

    /// Listing headline
    pub title: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Asking price (rent per month or sale price)
    pub price: u64,

    /// Built-up area in square feet
    #[serde(default)]
    pub area: f64,

    pub property_type: PropertyType,

    pub listing_type: ListingType,

    #[serde(default)]
    pub bedrooms: u32,

    #[serde(default)]
    pub bathrooms: u32,

    /// City or locality
    #[serde(default)]
    pub location: String,

    /// Amenity name to availability, e.g. `{"pool": true, "gym": false}`
    #[serde(default)]
    pub amenities: BTreeMap<String, bool>,

    /// Free-form feature tags
    #[serde(default)]
    pub features: Vec<String>,

    #[serde(default)]
    pub is_featured: bool,

    #[serde(default = "default_true")]
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Property {
    /// Create a listing with the required fields; optional fields start empty
    pub fn new(
        id: PropertyId,
        title: impl Into<String>,
        price: u64,
        property_type: PropertyType,
        listing_type: ListingType,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            price,
            area: 0.0,
            property_type,
            listing_type,
            bedrooms: 0,
            bathrooms: 0,
            location: String::new(),
            amenities: BTreeMap::new(),
            features: Vec::new(),
            is_featured: false,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Whether the amenity is listed and available
    pub fn has_amenity(&self, amenity: &str) -> bool {
        self.amenities.get(amenity).copied().unwrap_or(false)
    }

    /// Lower-cased text used for substring feature matching
    pub fn feature_text(&self) -> String {
        let mut blob = self.description.to_lowercase();
        for (name, available) in &self.amenities {
            if *available {
                blob.push(' ');
                blob.push_str(&name.to_lowercase());
            }
        }
        for feature in &self.features {
            blob.push(' ');
            blob.push_str(&feature.to_lowercase());
        }
        blob
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_property_type_parsing() {
        assert_eq!(PropertyType::from_str("villa").unwrap(), PropertyType::Villa);
        assert_eq!(PropertyType::from_str("Apartment").unwrap(), PropertyType::Apartment);
        assert!(PropertyType::from_str("castle").is_err());
        assert_eq!(PropertyType::Commercial.to_string(), "commercial");
    }

    #[test]
    fn test_deserialize_api_payload() {
        let json = r#"{
            "id": 42,
            "title": "Sea view villa",
            "price": 250000,
            "propertyType": "villa",
            "listingType": "sale",
            "amenities": {"pool": true, "gym": false},
            "createdAt": "2024-03-01T10:00:00Z"
        }"#;

        let property: Property = serde_json::from_str(json).unwrap();
        assert_eq!(property.id, 42);
        assert!(property.is_active);
        assert!(property.has_amenity("pool"));
        assert!(!property.has_amenity("gym"));
        assert!(!property.has_amenity("sauna"));
    }

    #[test]
    fn test_feature_text_skips_unavailable_amenities() {
        let mut property = Property::new(1, "Loft", 900, PropertyType::Apartment, ListingType::Rent);
        property.description = "Bright Corner unit".to_string();
        property.amenities.insert("Pool".to_string(), true);
        property.amenities.insert("gym".to_string(), false);
        property.features.push("Sea Facing".to_string());

        let text = property.feature_text();
        assert!(text.contains("corner"));
        assert!(text.contains("pool"));
        assert!(text.contains("sea facing"));
        assert!(!text.contains("gym"));
    }
}
