//! Helios FHIR Server Table Persistence Layer
//!
//! This crate provides the indexing and query layer of a FHIR server backed by
//! a partitioned key-value table. It compiles typed search values into flat
//! index columns, maps resource versions to table rows, and orchestrates
//! search and history queries against a pluggable executor.
//!
//! # Architecture
//!
//! - [`types`] - Typed search values, column values, partial dates and stored resources
//! - [`search`] - Index compilation (composite expansion, per-type encoding)
//! - [`table`] - Partition/row keys and resource-to-row mapping
//! - [`core`] - Search options, executor traits, history requests and the search service
//! - [`backends`] - Executor implementations
//! - [`config`] - Store configuration
//! - [`error`] - Error types for all operations
//!
//! # Write Path
//!
//! ```text
//! SearchIndexEntry* ──► IndexCompileSession ──► IndexFields
//!                                                   │
//! StoredResource ─────────────────────────────► to_row ──► TableRow (current + history)
//! ```
//!
//! # Read Path
//!
//! ```text
//! request params ──► SearchService ──► SearchOptionsFactory ──► SearchExecutor
//!                                                                   │
//!                         StoredResource ◄── from_row ◄── TableRow ◄┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use helios_table_persistence::search::IndexCompileSession;
//! use helios_table_persistence::table::{from_row, to_row};
//! use helios_table_persistence::types::{SearchIndexEntry, SearchValue, StoredResource};
//!
//! let patient = StoredResource::new(
//!     "Patient",
//!     "patient-123",
//!     "1",
//!     br#"{"resourceType":"Patient","id":"patient-123"}"#.to_vec(),
//! );
//!
//! let fields = IndexCompileSession::compile_all(&[
//!     SearchIndexEntry::new("family", SearchValue::string("Smith")),
//!     SearchIndexEntry::new("gender", SearchValue::token_code("male")),
//! ])
//! .unwrap();
//!
//! let row = to_row(&patient, &fields).unwrap();
//! assert_eq!(row.partition_key, "Patient");
//! assert_eq!(row.row_key, "patient-123");
//!
//! let (restored, restored_fields) = from_row(&row).unwrap();
//! assert_eq!(restored, patient);
//! assert_eq!(restored_fields, fields);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod config;
pub mod core;
pub mod error;
pub mod search;
pub mod table;
pub mod types;

// Re-export commonly used types at crate root
pub use config::TableStoreConfig;
pub use error::{StorageError, StorageResult};
pub use types::{SearchIndexEntry, SearchValue, StoredResource};

// Re-export core traits
pub use core::{CapabilityProvider, ResourceReader, SearchExecutor, SearchService};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
