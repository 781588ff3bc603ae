//! Test fixtures for table persistence testing.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use helios_table_persistence::config::TableStoreConfig;
use helios_table_persistence::types::{
    PartialDateTime, ResourceMethod, SearchIndexEntry, SearchValue, StoredResource,
};

/// The instant tests treat as "now".
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

/// Midnight UTC on the given day of 2024.
pub fn day(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, 0, 0, 0).unwrap()
}

/// Parses a partial date, panicking on invalid input.
pub fn date(value: &str) -> PartialDateTime {
    value.parse().expect("valid partial date")
}

/// Builds ordered query parameters.
pub fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// A small configuration for service tests.
pub fn test_config() -> TableStoreConfig {
    TableStoreConfig {
        default_page_size: 10,
        max_page_size: 100,
        resource_types: vec![
            "Patient".to_string(),
            "Observation".to_string(),
            "Encounter".to_string(),
        ],
        compartment_types: vec!["Patient".to_string(), "Encounter".to_string()],
    }
}

/// A patient version with a family name.
pub fn patient_version(
    id: &str,
    version: &str,
    family: &str,
    last_modified: DateTime<Utc>,
) -> (StoredResource, Vec<SearchIndexEntry>) {
    let content = json!({
        "resourceType": "Patient",
        "id": id,
        "meta": {"versionId": version},
        "name": [{"family": family}]
    });
    let method = if version == "1" {
        ResourceMethod::Post
    } else {
        ResourceMethod::Put
    };
    let resource = StoredResource::from_json("Patient", id, version, &content)
        .expect("serializable patient")
        .with_request(method, format!("Patient/{}", id))
        .with_last_modified(last_modified);
    let entries = vec![
        SearchIndexEntry::new("_id", SearchValue::token_code(id)),
        SearchIndexEntry::new("family", SearchValue::string(family)),
    ];
    (resource, entries)
}

/// An observation referencing a patient.
pub fn observation_for(
    id: &str,
    patient_id: &str,
    last_modified: DateTime<Utc>,
) -> (StoredResource, Vec<SearchIndexEntry>) {
    let content = json!({
        "resourceType": "Observation",
        "id": id,
        "status": "final",
        "subject": {"reference": format!("Patient/{}", patient_id)}
    });
    let resource = StoredResource::from_json("Observation", id, "1", &content)
        .expect("serializable observation")
        .with_request(ResourceMethod::Post, "Observation")
        .with_last_modified(last_modified);
    let entries = vec![
        SearchIndexEntry::new("status", SearchValue::token_code("final")),
        SearchIndexEntry::new(
            "subject",
            SearchValue::reference(None, Some("Patient".to_string()), patient_id),
        ),
    ];
    (resource, entries)
}
