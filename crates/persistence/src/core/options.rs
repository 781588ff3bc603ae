//! Search options and the factory that builds them.
//!
//! Request parameters arrive as ordered `(name, value)` tuples. The factory
//! pulls out the paging controls (`ct`, `_count`), checks the scope against
//! the configuration and hands everything else to the executor in order.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::TableStoreConfig;
use crate::error::{StorageResult, ValidationError};

/// Name of the continuation token parameter.
pub const CONTINUATION_TOKEN_PARAM: &str = "ct";

/// Name of the page size parameter.
pub const COUNT_PARAM: &str = "_count";

/// What a search runs over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchScope {
    /// All resource types.
    System,

    /// One resource type.
    Type {
        /// The resource type.
        resource_type: String,
    },

    /// Resources in a compartment, optionally of one type.
    Compartment {
        /// The compartment's resource type (e.g., "Patient").
        compartment_type: String,
        /// The compartment's resource id.
        compartment_id: String,
        /// Restricts the search to one resource type.
        resource_type: Option<String>,
    },
}

impl SearchScope {
    /// Returns the resource type the scope is restricted to, if any.
    pub fn resource_type(&self) -> Option<&str> {
        match self {
            SearchScope::System => None,
            SearchScope::Type { resource_type } => Some(resource_type),
            SearchScope::Compartment { resource_type, .. } => resource_type.as_deref(),
        }
    }
}

/// Storage-level search options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// What the search runs over.
    pub scope: SearchScope,

    /// Query parameters in request order, without paging controls.
    pub parameters: Vec<(String, String)>,

    /// Opaque continuation token from a previous page.
    pub continuation_token: Option<String>,

    /// Page size.
    pub max_item_count: u32,
}

impl SearchOptions {
    /// Creates options with no parameters.
    pub fn new(scope: SearchScope, max_item_count: u32) -> Self {
        Self {
            scope,
            parameters: Vec::new(),
            continuation_token: None,
            max_item_count,
        }
    }

    /// Adds a parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    /// Sets the continuation token.
    pub fn with_continuation_token(mut self, token: impl Into<String>) -> Self {
        self.continuation_token = Some(token.into());
        self
    }

    /// Returns the resource type the search is restricted to, if any.
    pub fn resource_type(&self) -> Option<&str> {
        self.scope.resource_type()
    }

    /// Returns the values of every parameter with the given name, in order.
    pub fn values_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.parameters
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Builds [`SearchOptions`] from request parameters.
pub trait SearchOptionsFactory: Send + Sync {
    /// Builds options for a type-level (or system-level, when `resource_type`
    /// is `None`) search.
    fn create(
        &self,
        resource_type: Option<&str>,
        query: &[(String, String)],
    ) -> StorageResult<SearchOptions>;

    /// Builds options for a compartment search.
    fn create_compartment(
        &self,
        compartment_type: &str,
        compartment_id: &str,
        resource_type: Option<&str>,
        query: &[(String, String)],
    ) -> StorageResult<SearchOptions>;
}

/// The default options factory, driven by [`TableStoreConfig`].
#[derive(Debug, Clone)]
pub struct DefaultSearchOptionsFactory {
    config: Arc<TableStoreConfig>,
}

impl DefaultSearchOptionsFactory {
    /// Creates a factory for the given configuration.
    pub fn new(config: Arc<TableStoreConfig>) -> Self {
        Self { config }
    }

    fn check_resource_type(&self, resource_type: Option<&str>) -> StorageResult<()> {
        match resource_type {
            Some(rt) if !self.config.is_known_resource_type(rt) => {
                Err(ValidationError::UnsupportedResourceType {
                    resource_type: rt.to_string(),
                }
                .into())
            }
            _ => Ok(()),
        }
    }

    fn build(&self, scope: SearchScope, query: &[(String, String)]) -> StorageResult<SearchOptions> {
        let mut options = SearchOptions::new(scope, self.config.default_page_size);

        for (name, value) in query {
            match name.as_str() {
                CONTINUATION_TOKEN_PARAM => {
                    if !value.is_empty() {
                        options.continuation_token = Some(value.clone());
                    }
                }
                COUNT_PARAM => {
                    let count: i64 =
                        value
                            .trim()
                            .parse()
                            .map_err(|_| ValidationError::InvalidSearchParameter {
                                parameter: COUNT_PARAM.to_string(),
                                message: format!("'{}' is not an integer", value),
                            })?;
                    if count > 0 {
                        let max = i64::from(self.config.max_page_size);
                        options.max_item_count = count.min(max) as u32;
                    }
                }
                _ => options.parameters.push((name.clone(), value.clone())),
            }
        }

        Ok(options)
    }
}

impl SearchOptionsFactory for DefaultSearchOptionsFactory {
    fn create(
        &self,
        resource_type: Option<&str>,
        query: &[(String, String)],
    ) -> StorageResult<SearchOptions> {
        self.check_resource_type(resource_type)?;

        let scope = match resource_type {
            Some(rt) => SearchScope::Type {
                resource_type: rt.to_string(),
            },
            None => SearchScope::System,
        };
        self.build(scope, query)
    }

    fn create_compartment(
        &self,
        compartment_type: &str,
        compartment_id: &str,
        resource_type: Option<&str>,
        query: &[(String, String)],
    ) -> StorageResult<SearchOptions> {
        if !self.config.is_compartment_type(compartment_type) {
            return Err(ValidationError::UnsupportedCompartmentType {
                compartment_type: compartment_type.to_string(),
            }
            .into());
        }
        if compartment_id.is_empty() {
            return Err(ValidationError::InvalidOperation {
                message: "compartment id must not be empty".to_string(),
            }
            .into());
        }
        self.check_resource_type(resource_type)?;

        let scope = SearchScope::Compartment {
            compartment_type: compartment_type.to_string(),
            compartment_id: compartment_id.to_string(),
            resource_type: resource_type.map(str::to_string),
        };
        self.build(scope, query)
    }
}
