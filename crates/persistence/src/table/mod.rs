//! Partitioned table row model.
//!
//! - [`keys`] - Partition/row key derivation and the history partition convention
//! - [`row`] - The [`TableRow`] type
//! - [`mapper`] - [`to_row`] / [`from_row`] between stored resources and rows
//!
//! # Row Layout
//!
//! ```text
//! PartitionKey      RowKey   ResourceId VersionId RawResource ... s_name_NormalizedString
//! Patient           123      123        2         {...}           SMITH
//! Patient_history   123_1    123        1         {...}           SMYTH
//! Patient_history   123_2    123        2         {...}           SMITH
//! ```

pub mod keys;
pub mod mapper;
pub mod row;

pub use keys::{
    HISTORY_PARTITION_SUFFIX, RowAddress, is_history_partition, partition_key,
    resource_type_from_partition, row_key,
};
pub use mapper::{columns, from_row, to_row};
pub use row::TableRow;
