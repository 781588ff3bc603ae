//! Storage backend implementations.
//!
//! A backend provides the [`SearchExecutor`](crate::core::SearchExecutor) and
//! [`ResourceReader`](crate::core::ResourceReader) hooks the search service
//! delegates to.
//!
//! # Available Backends
//!
//! | Backend | Description |
//! |---------|-------------|
//! | [`memory`] | In-process partitioned table, for tests and embedding |
//!
//! # Example
//!
//! ```
//! use helios_table_persistence::backends::memory::MemoryTableStore;
//! use helios_table_persistence::types::{SearchIndexEntry, SearchValue, StoredResource};
//!
//! let store = MemoryTableStore::new();
//! let patient = StoredResource::new("Patient", "p1", "1", br#"{"resourceType":"Patient"}"#.to_vec());
//!
//! store
//!     .write(&patient, &[SearchIndexEntry::new("family", SearchValue::string("Smith"))])
//!     .unwrap();
//! assert_eq!(store.row_count(), 2);
//! ```

pub mod memory;

pub use memory::MemoryTableStore;
