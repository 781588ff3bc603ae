//! A scripted search executor.
//!
//! Returns canned results, records the options it was called with, and can
//! block forever to exercise cancellation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use helios_table_persistence::core::{ResourceReader, SearchExecutor, SearchOptions, SearchResult};
use helios_table_persistence::error::{BackendError, StorageError, StorageResult};
use helios_table_persistence::types::StoredResource;

/// What a hook does when called.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Return this result.
    Rows(SearchResult),
    /// Fail with an internal backend error carrying this message.
    Fail(String),
    /// Never complete.
    Pending,
}

impl Default for Outcome {
    fn default() -> Self {
        Outcome::Rows(SearchResult::empty())
    }
}

/// Sets a flag when dropped.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// A [`SearchExecutor`] driven by canned outcomes.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    pub search: Outcome,
    pub history: Outcome,
    pub resources: HashMap<(String, String), StoredResource>,
    pub search_calls: Mutex<Vec<SearchOptions>>,
    pub history_calls: Mutex<Vec<SearchOptions>>,
    pub get_calls: AtomicUsize,
    pub cancelled: Arc<AtomicBool>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, outcome: Outcome) -> Self {
        self.search = outcome;
        self
    }

    pub fn with_history(mut self, outcome: Outcome) -> Self {
        self.history = outcome;
        self
    }

    pub fn with_resource(mut self, resource: StoredResource) -> Self {
        self.resources.insert(
            (resource.resource_type().to_string(), resource.id().to_string()),
            resource,
        );
        self
    }

    pub fn search_calls(&self) -> Vec<SearchOptions> {
        self.search_calls.lock().clone()
    }

    pub fn history_calls(&self) -> Vec<SearchOptions> {
        self.history_calls.lock().clone()
    }

    pub fn get_count(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    async fn run(&self, outcome: &Outcome) -> StorageResult<SearchResult> {
        match outcome {
            Outcome::Rows(result) => Ok(result.clone()),
            Outcome::Fail(message) => Err(StorageError::Backend(BackendError::Internal {
                backend_name: "scripted".to_string(),
                message: message.clone(),
                source: None,
            })),
            Outcome::Pending => {
                let _flag = DropFlag(self.cancelled.clone());
                std::future::pending::<()>().await;
                Ok(SearchResult::empty())
            }
        }
    }
}

#[async_trait]
impl ResourceReader for ScriptedExecutor {
    async fn get(&self, resource_type: &str, id: &str) -> StorageResult<Option<StoredResource>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .resources
            .get(&(resource_type.to_string(), id.to_string()))
            .cloned())
    }
}

#[async_trait]
impl SearchExecutor for ScriptedExecutor {
    async fn execute_search(&self, options: &SearchOptions) -> StorageResult<SearchResult> {
        self.search_calls.lock().push(options.clone());
        self.run(&self.search).await
    }

    async fn execute_history_search(&self, options: &SearchOptions) -> StorageResult<SearchResult> {
        self.history_calls.lock().push(options.clone());
        self.run(&self.history).await
    }
}
