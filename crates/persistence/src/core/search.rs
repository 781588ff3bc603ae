//! Search executor traits and results.
//!
//! The executor is the storage-specific half of a search: it turns
//! [`SearchOptions`] into rows. [`SearchService`](super::SearchService) wraps
//! an executor with validation and existence checks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::types::StoredResource;

use super::options::SearchOptions;

/// Result of a search or history search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matching resources, in result order.
    pub resources: Vec<StoredResource>,

    /// Token for the next page, if there is one.
    pub continuation_token: Option<String>,

    /// Parameters the executor did not apply.
    pub unsupported_parameters: Vec<(String, String)>,
}

impl SearchResult {
    /// Creates a result with the given resources.
    pub fn new(resources: Vec<StoredResource>) -> Self {
        Self {
            resources,
            ..Default::default()
        }
    }

    /// Creates an empty result.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sets the continuation token.
    pub fn with_continuation_token(mut self, token: Option<String>) -> Self {
        self.continuation_token = token;
        self
    }

    /// Sets the unsupported parameters.
    pub fn with_unsupported_parameters(mut self, params: Vec<(String, String)>) -> Self {
        self.unsupported_parameters = params;
        self
    }

    /// Returns true if no resource matched.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Returns the number of resources on this page.
    pub fn len(&self) -> usize {
        self.resources.len()
    }
}

/// Point lookup of the current version of a resource.
#[async_trait]
pub trait ResourceReader: Send + Sync {
    /// Reads the current version of a resource.
    ///
    /// Deleted resources are returned with their deleted flag set; `None`
    /// means the resource was never written.
    async fn get(&self, resource_type: &str, id: &str) -> StorageResult<Option<StoredResource>>;
}

/// Executes search options against a concrete store.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use helios_table_persistence::core::{ResourceReader, SearchExecutor, SearchOptions, SearchResult};
///
/// #[async_trait]
/// impl SearchExecutor for MyTableClient {
///     async fn execute_search(&self, options: &SearchOptions) -> StorageResult<SearchResult> {
///         let filter = self.build_filter(options)?;
///         self.query_current_rows(filter).await
///     }
///
///     async fn execute_history_search(&self, options: &SearchOptions) -> StorageResult<SearchResult> {
///         let filter = self.build_filter(options)?;
///         self.query_history_rows(filter).await
///     }
/// }
/// ```
#[async_trait]
pub trait SearchExecutor: ResourceReader {
    /// Searches current resource versions.
    async fn execute_search(&self, options: &SearchOptions) -> StorageResult<SearchResult>;

    /// Searches history rows, newest first.
    async fn execute_history_search(&self, options: &SearchOptions) -> StorageResult<SearchResult>;
}
