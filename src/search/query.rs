//! Free-text query interpretation
//!
//! Turns input such as `"3 bhk villa for rent in goa"` into a residual text
//! query (`"for in goa"`) plus structured filter fragments (villa, rent,
//! 3 bedrooms). Each category is extracted at most once; the first match in
//! the text wins and only that occurrence is stripped.

use crate::models::{FilterState, ListingType, PropertyType};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

lazy_static! {
    static ref BEDROOM_PATTERN: Regex =
        Regex::new(r"(?i)\b(\d{1,2})\s*(?:bhk|bedrooms?|beds?)\b").expect("valid bedroom regex");
    static ref PROPERTY_TYPE_PATTERN: Regex =
        Regex::new(r"(?i)\b(apartment|villa|house|plot|commercial)s?\b")
            .expect("valid property type regex");
    static ref LISTING_TYPE_PATTERN: Regex =
        Regex::new(r"(?i)\b(rental|rent|sale|buy)\b").expect("valid listing type regex");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid whitespace regex");
}

/// Result of interpreting a free-text query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedQuery {
    /// Text left after structured tokens were stripped
    pub clean_query: String,

    /// Filters recognised in the text; unset fields were not mentioned
    pub extracted_filters: FilterState,
}

impl ParsedQuery {
    pub fn has_extracted_filters(&self) -> bool {
        self.extracted_filters != FilterState::default()
    }
}

/// Parse `query` into a residual text query and extracted filters.
///
/// If stripping removes every word, the original (trimmed) input is kept as
/// the text query so a non-empty search never turns into an empty one.
pub fn parse(query: &str) -> ParsedQuery {
    let mut extracted = FilterState::default();
    let mut remaining = query.to_string();

    if let Some(captures) = BEDROOM_PATTERN.captures(&remaining) {
        if let Ok(count) = captures[1].parse::<u32>() {
            extracted.bedrooms = Some(count);
            remaining = BEDROOM_PATTERN.replacen(&remaining, 1, " ").into_owned();
        }
    }

    if let Some(captures) = PROPERTY_TYPE_PATTERN.captures(&remaining) {
        if let Ok(property_type) = PropertyType::from_str(&captures[1]) {
            extracted.property_types = vec![property_type];
            remaining = PROPERTY_TYPE_PATTERN.replacen(&remaining, 1, " ").into_owned();
        }
    }

    if let Some(captures) = LISTING_TYPE_PATTERN.captures(&remaining) {
        extracted.listing_type = Some(listing_type_for(&captures[1]));
        remaining = LISTING_TYPE_PATTERN.replacen(&remaining, 1, " ").into_owned();
    }

    let cleaned = normalize_whitespace(&remaining);
    let clean_query = if cleaned.is_empty() {
        normalize_whitespace(query)
    } else {
        cleaned
    };

    tracing::trace!(
        input = %query,
        clean_query = %clean_query,
        extracted = ?extracted,
        "Parsed search query"
    );

    ParsedQuery {
        clean_query,
        extracted_filters: extracted,
    }
}

/// Collapse runs of whitespace to single spaces and trim both ends
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

fn listing_type_for(token: &str) -> ListingType {
    match token.to_ascii_lowercase().as_str() {
        "rent" | "rental" => ListingType::Rent,
        _ => ListingType::Sale,
    }
}
