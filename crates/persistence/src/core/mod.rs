//! Search orchestration traits and services.
//!
//! This module provides the query front end of the table store:
//!
//! - [`SearchExecutor`] - Storage-specific search and history hooks
//! - [`ResourceReader`] - Point lookup used for existence checks
//! - [`SearchOptionsFactory`] - Builds [`SearchOptions`] from request parameters
//! - [`HistoryRequest`] - History parameters and their validation
//! - [`SearchService`] - Validation, delegation and existence reconciliation
//! - [`CapabilityProvider`] - Capability declaration
//!
//! # Trait Hierarchy
//!
//! ```text
//! ResourceReader
//!     └── SearchExecutor
//!             └── wrapped by SearchService<E>
//! ```
//!
//! # History Flow
//!
//! ```text
//! HistoryRequest
//!    └── validate (_at vs _since, _at vs _before, future _before)
//!        └── to_query_params (_id, ct, _lastUpdated, _count)
//!            └── SearchOptionsFactory::create
//!                └── SearchExecutor::execute_history_search
//!                    └── empty + instance scoped?
//!                        └── ResourceReader::get → NotFound or empty result
//! ```

pub mod capabilities;
pub mod history;
pub mod options;
pub mod search;
pub mod service;

// Re-export main types
pub use capabilities::{
    CapabilityProvider, Interaction, ResourceCapabilities, StorageCapabilities, SystemInteraction,
};
pub use history::HistoryRequest;
pub use options::{DefaultSearchOptionsFactory, SearchOptions, SearchOptionsFactory, SearchScope};
pub use search::{ResourceReader, SearchExecutor, SearchResult};
pub use service::SearchService;
