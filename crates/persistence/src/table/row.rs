//! Table rows.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::PropertyValue;

use super::keys::{RowAddress, is_history_partition, resource_type_from_partition};

/// One physical row of the partitioned table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    /// Partition key.
    pub partition_key: String,
    /// Row key.
    pub row_key: String,
    /// Column values by name.
    pub properties: BTreeMap<String, PropertyValue>,
}

impl TableRow {
    /// Creates a row with no columns.
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Creates a row at the given address.
    pub fn at(address: RowAddress) -> Self {
        Self::new(address.partition_key, address.row_key)
    }

    /// Returns the row's address.
    pub fn address(&self) -> RowAddress {
        RowAddress {
            partition_key: self.partition_key.clone(),
            row_key: self.row_key.clone(),
        }
    }

    /// Sets a column.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(column.into(), value.into());
    }

    /// Sets a column, builder style.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.set(column, value);
        self
    }

    /// Returns a column value.
    pub fn get(&self, column: &str) -> Option<&PropertyValue> {
        self.properties.get(column)
    }

    /// Returns the resource type encoded in the partition key.
    pub fn resource_type(&self) -> &str {
        resource_type_from_partition(&self.partition_key)
    }

    /// Returns true if the row is stored in a history partition.
    pub fn in_history_partition(&self) -> bool {
        is_history_partition(&self.partition_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_columns() {
        let row = TableRow::at(RowAddress::history("Patient", "1", "2").unwrap())
            .with("ResourceId", "1")
            .with("IsDeleted", false);

        assert_eq!(row.resource_type(), "Patient");
        assert!(row.in_history_partition());
        assert_eq!(row.get("ResourceId").and_then(|v| v.as_str()), Some("1"));
        assert_eq!(row.get("IsDeleted").and_then(|v| v.as_bool()), Some(false));
        assert!(row.get("Missing").is_none());
        assert_eq!(row.address().row_key, "1_2");
    }
}
