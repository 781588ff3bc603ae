//! Partition and row key derivation.
//!
//! Current rows live in the partition named after the resource type and are
//! addressed by resource id. History rows live in `<type>_history` and are
//! addressed by `<id>_<version>`, so two writes of the same id and version map
//! to the same row.

use serde::{Deserialize, Serialize};

use crate::error::RowError;

/// Suffix appended to the resource type for the history partition.
pub const HISTORY_PARTITION_SUFFIX: &str = "_history";

/// Separator between resource id and version id in history row keys.
pub const ROW_KEY_SEPARATOR: char = '_';

/// The address of one row in the table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowAddress {
    /// Partition key.
    pub partition_key: String,
    /// Row key, unique within the partition.
    pub row_key: String,
}

impl RowAddress {
    /// Address of the current row of a resource.
    pub fn current(resource_type: &str, id: &str) -> Result<Self, RowError> {
        Ok(Self {
            partition_key: partition_key(resource_type, false)?,
            row_key: row_key(id, "", false)?,
        })
    }

    /// Address of the history row of one resource version.
    pub fn history(resource_type: &str, id: &str, version_id: &str) -> Result<Self, RowError> {
        Ok(Self {
            partition_key: partition_key(resource_type, true)?,
            row_key: row_key(id, version_id, true)?,
        })
    }

    /// Returns the resource type this address belongs to.
    pub fn resource_type(&self) -> &str {
        resource_type_from_partition(&self.partition_key)
    }

    /// Returns true if this address is in a history partition.
    pub fn is_history(&self) -> bool {
        is_history_partition(&self.partition_key)
    }
}

/// Builds the partition key for a resource type.
pub fn partition_key(resource_type: &str, is_history: bool) -> Result<String, RowError> {
    if resource_type.is_empty() {
        return Err(RowError::EmptyKey {
            field: "resource type".to_string(),
        });
    }

    if is_history {
        Ok(format!("{}{}", resource_type, HISTORY_PARTITION_SUFFIX))
    } else {
        Ok(resource_type.to_string())
    }
}

/// Builds the row key for a resource id and version.
///
/// The version only takes part in history row keys.
pub fn row_key(id: &str, version_id: &str, is_history: bool) -> Result<String, RowError> {
    if id.is_empty() {
        return Err(RowError::EmptyKey {
            field: "resource id".to_string(),
        });
    }

    if !is_history {
        return Ok(id.to_string());
    }

    if version_id.is_empty() {
        return Err(RowError::EmptyKey {
            field: "version id".to_string(),
        });
    }

    Ok(format!("{}{}{}", id, ROW_KEY_SEPARATOR, version_id))
}

/// Strips the history suffix from a partition key.
pub fn resource_type_from_partition(partition_key: &str) -> &str {
    partition_key
        .strip_suffix(HISTORY_PARTITION_SUFFIX)
        .unwrap_or(partition_key)
}

/// Returns true if the partition key names a history partition.
pub fn is_history_partition(partition_key: &str) -> bool {
    partition_key.ends_with(HISTORY_PARTITION_SUFFIX)
}
