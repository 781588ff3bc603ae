//! Stored resource types.
//!
//! This module defines the [`StoredResource`] type, which carries a raw FHIR
//! resource together with the intrinsic metadata persisted in every table row:
//! identity, version, originating request, timestamps and flags.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StorageError, StorageResult};

/// A versioned FHIR resource with persistence metadata.
///
/// # Examples
///
/// ```
/// use helios_table_persistence::types::{ResourceMethod, StoredResource};
///
/// let resource = StoredResource::new(
///     "Patient",
///     "123",
///     "1",
///     br#"{"resourceType":"Patient","id":"123"}"#.to_vec(),
/// )
/// .with_request(ResourceMethod::Post, "Patient");
///
/// assert_eq!(resource.url(), "Patient/123");
/// assert_eq!(resource.versioned_url(), "Patient/123/_history/1");
/// assert!(!resource.is_deleted());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResource {
    /// The FHIR resource type (e.g., "Patient", "Observation").
    resource_type: String,

    /// The resource's logical ID.
    id: String,

    /// The version ID.
    version_id: String,

    /// The raw serialized resource.
    raw_resource: Vec<u8>,

    /// HTTP method that created this version.
    request_method: Option<ResourceMethod>,

    /// Request URI that created this version.
    request_uri: Option<String>,

    /// When this version was written.
    last_modified: DateTime<Utc>,

    /// Whether this version is a deletion marker.
    is_deleted: bool,

    /// Whether this record is a history row rather than the current row.
    is_history: bool,
}

/// HTTP method that created a resource version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceMethod {
    /// Resource was created via POST.
    Post,
    /// Resource was created/updated via PUT.
    Put,
    /// Resource was updated via PATCH.
    Patch,
    /// Resource was deleted via DELETE.
    Delete,
}

impl fmt::Display for ResourceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceMethod::Post => write!(f, "POST"),
            ResourceMethod::Put => write!(f, "PUT"),
            ResourceMethod::Patch => write!(f, "PATCH"),
            ResourceMethod::Delete => write!(f, "DELETE"),
        }
    }
}

impl FromStr for ResourceMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "POST" => Ok(ResourceMethod::Post),
            "PUT" => Ok(ResourceMethod::Put),
            "PATCH" => Ok(ResourceMethod::Patch),
            "DELETE" => Ok(ResourceMethod::Delete),
            other => Err(format!("unknown request method '{}'", other)),
        }
    }
}

impl StoredResource {
    /// Creates a current (non-history, not deleted) record last modified now.
    pub fn new(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        version_id: impl Into<String>,
        raw_resource: Vec<u8>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            version_id: version_id.into(),
            raw_resource,
            request_method: None,
            request_uri: None,
            last_modified: Utc::now(),
            is_deleted: false,
            is_history: false,
        }
    }

    /// Creates a record from a JSON resource body.
    pub fn from_json(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        version_id: impl Into<String>,
        content: &Value,
    ) -> StorageResult<Self> {
        let raw = serde_json::to_vec(content)?;
        Ok(Self::new(resource_type, id, version_id, raw))
    }

    /// Sets the originating request.
    pub fn with_request(mut self, method: ResourceMethod, uri: impl Into<String>) -> Self {
        self.request_method = Some(method);
        self.request_uri = Some(uri.into());
        self
    }

    /// Sets only the request method.
    pub fn with_request_method(mut self, method: ResourceMethod) -> Self {
        self.request_method = Some(method);
        self
    }

    /// Sets only the request URI.
    pub fn with_request_uri(mut self, uri: impl Into<String>) -> Self {
        self.request_uri = Some(uri.into());
        self
    }

    /// Sets the last modified timestamp.
    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = last_modified;
        self
    }

    /// Sets the deleted flag.
    pub fn with_deleted(mut self, deleted: bool) -> Self {
        self.is_deleted = deleted;
        self
    }

    /// Sets the history flag.
    pub fn with_history(mut self, history: bool) -> Self {
        self.is_history = history;
        self
    }

    /// Returns the FHIR resource type.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Returns the resource's logical ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the version ID.
    pub fn version_id(&self) -> &str {
        &self.version_id
    }

    /// Returns the raw serialized resource.
    pub fn raw_resource(&self) -> &[u8] {
        &self.raw_resource
    }

    /// Parses the raw resource as JSON.
    pub fn content(&self) -> StorageResult<Value> {
        serde_json::from_slice(&self.raw_resource).map_err(StorageError::from)
    }

    /// Returns the HTTP method that created this version.
    pub fn request_method(&self) -> Option<ResourceMethod> {
        self.request_method
    }

    /// Returns the request URI that created this version.
    pub fn request_uri(&self) -> Option<&str> {
        self.request_uri.as_deref()
    }

    /// Returns when this version was written.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Returns true if this version marks the resource as deleted.
    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Returns true if this is a history record.
    pub fn is_history(&self) -> bool {
        self.is_history
    }

    /// Returns the ETag for this version.
    pub fn etag(&self) -> String {
        format!("W/\"{}\"", self.version_id)
    }

    /// Returns the relative URL (e.g., "Patient/123").
    pub fn url(&self) -> String {
        format!("{}/{}", self.resource_type, self.id)
    }

    /// Returns the versioned URL (e.g., "Patient/123/_history/1").
    pub fn versioned_url(&self) -> String {
        format!("{}/{}/_history/{}", self.resource_type, self.id, self.version_id)
    }

    /// Returns a copy of this record flagged as a history record.
    pub fn to_history(&self) -> Self {
        self.clone().with_history(true)
    }
}
