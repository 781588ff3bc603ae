//! Mapping between stored resources and table rows.
//!
//! A row carries the intrinsic columns listed in [`columns`] plus every
//! generated index column (`s_` prefix). The resource type is never a column;
//! it is recovered from the partition key.

use chrono::{DateTime, Utc};

use crate::error::RowError;
use crate::search::{IndexFields, is_index_column};
use crate::types::{PropertyValue, ResourceMethod, StoredResource};

use super::keys::RowAddress;
use super::row::TableRow;

/// Intrinsic column names.
pub mod columns {
    /// Logical resource id.
    pub const RESOURCE_ID: &str = "ResourceId";
    /// Version id.
    pub const VERSION_ID: &str = "VersionId";
    /// Raw serialized resource.
    pub const RAW_RESOURCE: &str = "RawResource";
    /// HTTP method of the originating request.
    pub const REQUEST_METHOD: &str = "RequestMethod";
    /// URI of the originating request.
    pub const REQUEST_URI: &str = "RequestUri";
    /// Last modified timestamp.
    pub const LAST_MODIFIED: &str = "LastModified";
    /// Deletion marker.
    pub const IS_DELETED: &str = "IsDeleted";
    /// History row marker.
    pub const IS_HISTORY: &str = "IsHistory";
}

/// Maps a resource version and its index fields to a table row.
///
/// The row is addressed by [`RowAddress::history`] when the record is a history
/// record and by [`RowAddress::current`] otherwise. Index fields without the
/// `s_` prefix are skipped, since they would shadow intrinsic columns.
pub fn to_row(resource: &StoredResource, index_fields: &IndexFields) -> Result<TableRow, RowError> {
    let address = if resource.is_history() {
        RowAddress::history(resource.resource_type(), resource.id(), resource.version_id())?
    } else {
        RowAddress::current(resource.resource_type(), resource.id())?
    };

    let mut row = TableRow::at(address)
        .with(columns::RESOURCE_ID, resource.id())
        .with(columns::VERSION_ID, resource.version_id())
        .with(columns::RAW_RESOURCE, resource.raw_resource().to_vec())
        .with(columns::LAST_MODIFIED, resource.last_modified())
        .with(columns::IS_DELETED, resource.is_deleted())
        .with(columns::IS_HISTORY, resource.is_history());

    if let Some(method) = resource.request_method() {
        row.set(columns::REQUEST_METHOD, method.to_string());
    }
    if let Some(uri) = resource.request_uri() {
        row.set(columns::REQUEST_URI, uri);
    }

    for (column, value) in index_fields {
        if is_index_column(column) {
            row.set(column.as_str(), value.clone());
        } else {
            tracing::warn!(column = %column, "Skipping index field without index prefix");
        }
    }

    Ok(row)
}

/// Rebuilds a resource version and its index fields from a table row.
///
/// Columns with the `s_` prefix become index fields. Unknown columns without
/// the prefix are ignored.
pub fn from_row(row: &TableRow) -> Result<(StoredResource, IndexFields), RowError> {
    let resource_type = row.resource_type();
    if resource_type.is_empty() {
        return Err(RowError::EmptyKey {
            field: "partition key".to_string(),
        });
    }

    let id = required_str(row, columns::RESOURCE_ID)?;
    let version_id = required_str(row, columns::VERSION_ID)?;
    let raw = required(row, columns::RAW_RESOURCE)?
        .as_bytes()
        .ok_or_else(|| invalid(columns::RAW_RESOURCE, "binary"))?
        .to_vec();
    let last_modified = required_datetime(row, columns::LAST_MODIFIED)?;
    let is_deleted = required_bool(row, columns::IS_DELETED)?;
    let is_history = required_bool(row, columns::IS_HISTORY)?;

    let mut resource = StoredResource::new(resource_type, id, version_id, raw)
        .with_last_modified(last_modified)
        .with_deleted(is_deleted)
        .with_history(is_history);

    if let Some(value) = row.get(columns::REQUEST_METHOD) {
        let method = value
            .as_str()
            .and_then(|s| s.parse::<ResourceMethod>().ok())
            .ok_or_else(|| invalid(columns::REQUEST_METHOD, "request method"))?;
        resource = resource.with_request_method(method);
    }
    if let Some(value) = row.get(columns::REQUEST_URI) {
        let uri = value
            .as_str()
            .ok_or_else(|| invalid(columns::REQUEST_URI, "string"))?;
        resource = resource.with_request_uri(uri);
    }

    let index_fields = row
        .properties
        .iter()
        .filter(|(column, _)| is_index_column(column))
        .map(|(column, value)| (column.clone(), value.clone()))
        .collect();

    Ok((resource, index_fields))
}

fn required<'a>(row: &'a TableRow, column: &str) -> Result<&'a PropertyValue, RowError> {
    row.get(column).ok_or_else(|| RowError::MissingColumn {
        partition_key: row.partition_key.clone(),
        row_key: row.row_key.clone(),
        column: column.to_string(),
    })
}

fn required_str<'a>(row: &'a TableRow, column: &str) -> Result<&'a str, RowError> {
    required(row, column)?
        .as_str()
        .ok_or_else(|| invalid(column, "string"))
}

fn required_bool(row: &TableRow, column: &str) -> Result<bool, RowError> {
    required(row, column)?
        .as_bool()
        .ok_or_else(|| invalid(column, "boolean"))
}

fn required_datetime(row: &TableRow, column: &str) -> Result<DateTime<Utc>, RowError> {
    required(row, column)?
        .as_datetime()
        .ok_or_else(|| invalid(column, "datetime"))
}

fn invalid(column: &str, expected: &str) -> RowError {
    RowError::InvalidColumn {
        column: column.to_string(),
        expected: expected.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> StoredResource {
        StoredResource::new("Patient", "p1", "3", br#"{"resourceType":"Patient"}"#.to_vec())
            .with_request(ResourceMethod::Put, "Patient/p1")
            .with_last_modified(Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap())
    }

    #[test]
    fn test_current_row_layout() {
        let row = to_row(&record(), &IndexFields::new()).unwrap();

        assert_eq!(row.partition_key, "Patient");
        assert_eq!(row.row_key, "p1");
        assert_eq!(
            row.get(columns::REQUEST_METHOD).and_then(|v| v.as_str()),
            Some("PUT")
        );
        assert!(row.get("ResourceType").is_none());
        assert_eq!(row.properties.len(), 8);
    }

    #[test]
    fn test_history_row_layout() {
        let row = to_row(&record().to_history(), &IndexFields::new()).unwrap();

        assert_eq!(row.partition_key, "Patient_history");
        assert_eq!(row.row_key, "p1_3");
        assert_eq!(row.get(columns::IS_HISTORY).and_then(|v| v.as_bool()), Some(true));
    }

    #[test]
    fn test_empty_id_fails() {
        let resource = StoredResource::new("Patient", "", "1", Vec::new());
        assert!(matches!(
            to_row(&resource, &IndexFields::new()),
            Err(RowError::EmptyKey { .. })
        ));

        let resource = StoredResource::new("", "p1", "1", Vec::new());
        assert!(to_row(&resource, &IndexFields::new()).is_err());
    }

    #[test]
    fn test_round_trip_without_request() {
        let resource = StoredResource::new("Observation", "o1", "1", b"{}".to_vec())
            .with_deleted(true);
        let row = to_row(&resource, &IndexFields::new()).unwrap();
        let (back, fields) = from_row(&row).unwrap();

        assert_eq!(back, resource);
        assert!(fields.is_empty());
    }

    #[test]
    fn test_missing_column() {
        let mut row = to_row(&record(), &IndexFields::new()).unwrap();
        row.properties.remove(columns::VERSION_ID);

        assert_eq!(
            from_row(&row).unwrap_err(),
            RowError::MissingColumn {
                partition_key: "Patient".to_string(),
                row_key: "p1".to_string(),
                column: columns::VERSION_ID.to_string(),
            }
        );
    }

    #[test]
    fn test_wrong_column_type() {
        let mut row = to_row(&record(), &IndexFields::new()).unwrap();
        row.set(columns::IS_DELETED, "no");

        assert!(matches!(
            from_row(&row),
            Err(RowError::InvalidColumn { column, .. }) if column == columns::IS_DELETED
        ));
    }

    #[test]
    fn test_non_prefixed_index_field_is_skipped() {
        let mut fields = IndexFields::new();
        fields.insert("VersionId", PropertyValue::from("99"));
        fields.insert("s_name_NormalizedString", PropertyValue::from("SMITH"));

        let row = to_row(&record(), &fields).unwrap();
        assert_eq!(row.get(columns::VERSION_ID).and_then(|v| v.as_str()), Some("3"));
        assert!(row.get("s_name_NormalizedString").is_some());
    }
}
