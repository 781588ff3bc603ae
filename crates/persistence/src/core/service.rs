//! Search orchestration.
//!
//! [`SearchService`] is the query front end of the table store. It validates
//! and composes parameters, delegates row retrieval to a [`SearchExecutor`],
//! and reconciles empty instance history against the point lookup.
//!
//! All operations are async and hold no locks. Dropping a returned future
//! drops the in-flight executor call with it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::TableStoreConfig;
use crate::error::{ResourceError, SearchError, StorageError, StorageResult};

use super::capabilities::{CapabilityProvider, ResourceCapabilities, StorageCapabilities};
use super::history::HistoryRequest;
use super::options::{DefaultSearchOptionsFactory, SearchOptionsFactory};
use super::search::{SearchExecutor, SearchResult};

/// Name reported in capability declarations.
pub const SERVICE_NAME: &str = "table";

/// Search front end over a [`SearchExecutor`].
///
/// # Example
///
/// ```ignore
/// use helios_table_persistence::backends::memory::MemoryTableStore;
/// use helios_table_persistence::config::TableStoreConfig;
/// use helios_table_persistence::core::{HistoryRequest, SearchService};
///
/// let service = SearchService::new(MemoryTableStore::new(), TableStoreConfig::default());
///
/// let page = service
///     .search(Some("Patient"), &[("_id".to_string(), "p1".to_string())])
///     .await?;
///
/// let history = service
///     .search_history(&HistoryRequest::for_instance("Patient", "p1").count(10))
///     .await?;
/// ```
pub struct SearchService<E> {
    executor: E,
    factory: Arc<dyn SearchOptionsFactory>,
    config: Arc<TableStoreConfig>,
    clock: fn() -> DateTime<Utc>,
}

impl<E> SearchService<E>
where
    E: SearchExecutor,
{
    /// Creates a service using the default options factory.
    pub fn new(executor: E, config: TableStoreConfig) -> Self {
        let config = Arc::new(config);
        Self {
            executor,
            factory: Arc::new(DefaultSearchOptionsFactory::new(config.clone())),
            config,
            clock: Utc::now,
        }
    }

    /// Replaces the options factory.
    pub fn with_factory(mut self, factory: Arc<dyn SearchOptionsFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Replaces the clock used to reject future `_before` values.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TableStoreConfig {
        &self.config
    }

    /// Searches current resources of one type, or of all types when
    /// `resource_type` is `None`.
    ///
    /// Options errors are returned as is. Any executor failure is reported as
    /// [`SearchError::InvalidContinuationToken`].
    pub async fn search(
        &self,
        resource_type: Option<&str>,
        query: &[(String, String)],
    ) -> StorageResult<SearchResult> {
        debug!(
            resource_type = resource_type.unwrap_or("*"),
            params = query.len(),
            "Processing search request"
        );

        let options = self.factory.create(resource_type, query)?;
        self.executor
            .execute_search(&options)
            .await
            .map_err(collapse_search_error)
    }

    /// Searches current resources inside a compartment.
    ///
    /// Error handling matches [`search`](Self::search).
    pub async fn search_compartment(
        &self,
        compartment_type: &str,
        compartment_id: &str,
        resource_type: Option<&str>,
        query: &[(String, String)],
    ) -> StorageResult<SearchResult> {
        debug!(
            compartment_type = %compartment_type,
            compartment_id = %compartment_id,
            resource_type = resource_type.unwrap_or("*"),
            "Processing compartment search request"
        );

        let options = self.factory.create_compartment(
            compartment_type,
            compartment_id,
            resource_type,
            query,
        )?;
        self.executor
            .execute_search(&options)
            .await
            .map_err(collapse_search_error)
    }

    /// Searches resource history.
    ///
    /// Invalid parameter combinations fail before any I/O. Executor errors
    /// propagate unchanged. An empty instance history is only reported as
    /// not found when the point lookup confirms the resource never existed;
    /// a deleted resource still has history.
    pub async fn search_history(&self, request: &HistoryRequest) -> StorageResult<SearchResult> {
        debug!(
            resource_type = request.resource_type.as_deref().unwrap_or("*"),
            resource_id = request.resource_id.as_deref().unwrap_or("*"),
            "Processing history request"
        );

        request.validate((self.clock)())?;

        let params = request.to_query_params();
        let options = self
            .factory
            .create(request.resource_type.as_deref(), &params)?;
        let result = self.executor.execute_history_search(&options).await?;

        if result.is_empty()
            && let (Some(resource_type), Some(id)) =
                (request.resource_type.as_deref(), request.resource_id.as_deref())
        {
            debug!(
                resource_type = %resource_type,
                id = %id,
                "Empty instance history, checking resource existence"
            );

            if self.executor.get(resource_type, id).await?.is_none() {
                return Err(ResourceError::NotFound {
                    resource_type: resource_type.to_string(),
                    id: id.to_string(),
                }
                .into());
            }
        }

        Ok(result)
    }
}

impl<E> CapabilityProvider for SearchService<E> {
    fn capabilities(&self) -> StorageCapabilities {
        self.config
            .resource_types
            .iter()
            .fold(StorageCapabilities::new(SERVICE_NAME), |caps, resource_type| {
                caps.with_resource(ResourceCapabilities::new(resource_type.as_str()).with_history())
            })
            .with_system_history()
            .with_pagination(self.config.default_page_size, Some(self.config.max_page_size))
    }
}

impl<E> std::fmt::Debug for SearchService<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn collapse_search_error(err: StorageError) -> StorageError {
    warn!(error = %err, "Search execution failed");
    SearchError::InvalidContinuationToken.into()
}
