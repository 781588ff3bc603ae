//! Error types for the table persistence layer.
//!
//! This module defines all error types used throughout the crate, following a
//! hierarchy that separates resource state errors, request validation errors,
//! search execution errors, index compilation errors, and row mapping errors.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all storage and search operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Resource state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Concurrency and versioning errors
    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),

    /// Request validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Search execution errors
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Search index compilation errors
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Table row mapping errors
    #[error(transparent)]
    Row(#[from] RowError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl StorageError {
    /// Returns true if this is a client-correctable request error.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StorageError::Validation(_)
                | StorageError::Search(SearchError::InvalidContinuationToken)
                | StorageError::Resource(ResourceError::NotFound { .. })
        )
    }
}

/// Errors related to resource state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The requested resource was not found.
    #[error("resource not found: {resource_type}/{id}")]
    NotFound { resource_type: String, id: String },
}

/// Errors related to concurrency control.
#[derive(Error, Debug)]
pub enum ConcurrencyError {
    /// A row with the same id and version has already been written.
    #[error("version conflict: {resource_type}/{id}/_history/{version_id} already exists")]
    VersionConflict {
        resource_type: String,
        id: String,
        version_id: String,
    },
}

/// Errors related to request validation.
///
/// These are raised before any I/O and are surfaced to the caller verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Two search parameters that cannot be combined were both supplied.
    #[error("invalid search operation: {first} and {second} cannot be used together")]
    MutuallyExclusiveParameters { first: String, second: String },

    /// The `_before` parameter references an instant in the future.
    #[error("invalid search operation: {parameter} cannot reference a time in the future")]
    FutureInstant { parameter: String },

    /// The search operation is not valid for the given scope.
    #[error("invalid search operation: {message}")]
    InvalidOperation { message: String },

    /// The search parameter value is invalid.
    #[error("invalid search parameter: {parameter}: {message}")]
    InvalidSearchParameter { parameter: String, message: String },

    /// The resource type is not supported.
    #[error("unsupported resource type: {resource_type}")]
    UnsupportedResourceType { resource_type: String },

    /// The compartment type is not supported.
    #[error("unsupported compartment type: {compartment_type}")]
    UnsupportedCompartmentType { compartment_type: String },

    /// Invalid configuration value.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Errors related to search execution.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Opaque failure of a plain or compartment search.
    ///
    /// Every executor failure on those paths is reported as this single kind so
    /// that storage details never reach the caller.
    #[error("invalid continuation token")]
    InvalidContinuationToken,

    /// The continuation token could not be decoded by the executor.
    #[error("invalid pagination cursor: {cursor}")]
    InvalidCursor { cursor: String },
}

/// Errors raised while compiling typed search values into index entries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// The search parameter name was empty after sanitization.
    #[error("search parameter name is empty")]
    EmptyParameterName,

    /// A required field of a search value was missing or empty.
    #[error("search parameter '{parameter}' is missing required field '{field}'")]
    MissingField { parameter: String, field: String },

    /// A composite component was itself a composite.
    #[error("search parameter '{parameter}' nests a composite inside a composite")]
    NestedComposite { parameter: String },
}

/// Errors raised while mapping resources to and from table rows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// A key component was empty.
    #[error("cannot build row key: {field} is empty")]
    EmptyKey { field: String },

    /// A required intrinsic column is absent.
    #[error("row {partition_key}/{row_key} is missing column '{column}'")]
    MissingColumn {
        partition_key: String,
        row_key: String,
        column: String,
    },

    /// An intrinsic column has the wrong type or an unparseable value.
    #[error("row column '{column}' is invalid: expected {expected}")]
    InvalidColumn { column: String, expected: String },
}

/// Errors originating from the storage backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for index compilation.
pub type IndexResult<T> = Result<T, IndexError>;

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            message: err.to_string(),
        })
    }
}

impl From<base64::DecodeError> for SearchError {
    fn from(err: base64::DecodeError) -> Self {
        SearchError::InvalidCursor {
            cursor: err.to_string(),
        }
    }
}
