//! Core types for the table persistence layer.
//!
//! - [`SearchValue`], [`SearchIndexEntry`] - Typed search values consumed by the index compiler
//! - [`PropertyValue`] - Scalar column values of a table row
//! - [`PartialDateTime`] - Partial date/time values used by history and `_lastUpdated` filters
//! - [`StoredResource`] - A versioned FHIR resource with persistence metadata
//!
//! # Examples
//!
//! ```
//! use helios_table_persistence::types::{PartialDateTime, SearchIndexEntry, SearchValue};
//!
//! let entry = SearchIndexEntry::new(
//!     "identifier",
//!     SearchValue::token(Some("http://hospital.org/mrn".to_string()), "12345"),
//! );
//! assert_eq!(entry.param_name, "identifier");
//!
//! let since: PartialDateTime = "2024-01".parse().unwrap();
//! assert_eq!(since.to_string(), "2024-01");
//! ```

mod partial_datetime;
mod property;
mod search_value;
mod stored_resource;

pub use partial_datetime::{DatePrecision, PartialDateTime};
pub use property::PropertyValue;
pub use search_value::{SearchIndexEntry, SearchValue};
pub use stored_resource::{ResourceMethod, StoredResource};
