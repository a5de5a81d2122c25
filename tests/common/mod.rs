//! Shared fixtures for integration tests

#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};
use listing_search::models::{ListingType, Property, PropertyId, PropertyType};
use std::collections::HashMap;

/// `count` rental apartments with ascending ids, prices and creation dates
pub fn sample_listings(count: u64) -> Vec<Property> {
    let epoch = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (1..=count)
        .map(|id| {
            let mut property = Property::new(
                id,
                format!("Apartment {id}"),
                1000 + id * 250,
                PropertyType::Apartment,
                ListingType::Rent,
            );
            property.location = if id % 2 == 0 { "Pune" } else { "Goa" }.to_string();
            property.bedrooms = (id % 4 + 1) as u32;
            property.area = 500.0 + id as f64 * 10.0;
            property.created_at = epoch + Duration::days(id as i64);
            property
        })
        .collect()
}

pub fn listing(id: PropertyId, title: &str, property_type: PropertyType) -> Property {
    let mut property = Property::new(id, title, 5000, property_type, ListingType::Sale);
    property.created_at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    property
}

pub fn with_amenities(mut property: Property, amenities: &[(&str, bool)]) -> Property {
    for (name, available) in amenities {
        property.amenities.insert(name.to_string(), *available);
    }
    property
}

pub fn ids(properties: &[Property]) -> Vec<PropertyId> {
    properties.iter().map(|p| p.id).collect()
}

/// Parse Prometheus exposition output into metric name -> lines
pub fn parse_prometheus_output(output: &str) -> HashMap<String, Vec<String>> {
    let mut metrics = HashMap::new();
    let mut current_metric = String::new();

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with("# HELP") || line.starts_with("# TYPE") {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 3 {
                current_metric = parts[2].to_string();
                metrics
                    .entry(current_metric.clone())
                    .or_insert_with(Vec::new)
                    .push(line.to_string());
            }
        } else if !line.starts_with('#') && !current_metric.is_empty() {
            metrics
                .entry(current_metric.clone())
                .or_insert_with(Vec::new)
                .push(line.to_string());
        }
    }

    metrics
}

/// Metric name follows Prometheus conventions
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == ':' => {}
        _ => return false,
    }
    !name.starts_with("__") && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

pub fn is_valid_counter_name(name: &str) -> bool {
    is_valid_metric_name(name) && name.ends_with("_total")
}

/// Value of a sample line such as `metric{a="1"} 42`
pub fn extract_metric_value(line: &str) -> Option<f64> {
    line.split_whitespace().last()?.parse::<f64>().ok()
}
