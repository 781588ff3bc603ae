//! History search requests.
//!
//! A [`HistoryRequest`] covers the three FHIR history levels:
//! - Instance history: `GET [base]/[type]/[id]/_history`
//! - Type history: `GET [base]/[type]/_history`
//! - System history: `GET [base]/_history`
//!
//! Validation happens before any I/O and the request is then lowered to
//! ordered query parameters for the options factory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::PartialDateTime;

use super::options::{CONTINUATION_TOKEN_PARAM, COUNT_PARAM};

/// `_at` parameter name.
pub const AT_PARAM: &str = "_at";
/// `_since` parameter name.
pub const SINCE_PARAM: &str = "_since";
/// `_before` parameter name.
pub const BEFORE_PARAM: &str = "_before";
/// `_id` parameter name.
pub const ID_PARAM: &str = "_id";
/// `_lastUpdated` parameter name.
pub const LAST_UPDATED_PARAM: &str = "_lastUpdated";

/// Parameters of a history search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRequest {
    /// Restricts history to one resource type.
    pub resource_type: Option<String>,

    /// Restricts history to one resource. Requires `resource_type`.
    pub resource_id: Option<String>,

    /// Only versions last updated within this date's precision range.
    pub at: Option<PartialDateTime>,

    /// Only versions last updated at or after this instant.
    pub since: Option<PartialDateTime>,

    /// Only versions last updated before this instant.
    pub before: Option<PartialDateTime>,

    /// Page size. Ignored unless positive.
    pub count: Option<i32>,

    /// Opaque token from a previous page.
    pub continuation_token: Option<String>,
}

impl HistoryRequest {
    /// History across all resource types.
    pub fn system() -> Self {
        Self::default()
    }

    /// History of every resource of one type.
    pub fn for_type(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: Some(resource_type.into()),
            ..Default::default()
        }
    }

    /// History of one resource.
    pub fn for_instance(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: Some(resource_type.into()),
            resource_id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Builds a request from raw query parameters.
    ///
    /// Recognizes `_at`, `_since`, `_before`, `_count` and `ct`; other
    /// parameters are ignored.
    pub fn from_query_params(
        resource_type: Option<&str>,
        resource_id: Option<&str>,
        params: &[(String, String)],
    ) -> Result<Self, ValidationError> {
        let mut request = Self {
            resource_type: resource_type.map(str::to_string),
            resource_id: resource_id.map(str::to_string),
            ..Default::default()
        };

        for (name, value) in params {
            match name.as_str() {
                AT_PARAM => request.at = Some(PartialDateTime::parse_parameter(name, value)?),
                SINCE_PARAM => request.since = Some(PartialDateTime::parse_parameter(name, value)?),
                BEFORE_PARAM => {
                    request.before = Some(PartialDateTime::parse_parameter(name, value)?)
                }
                COUNT_PARAM => {
                    let count = value.trim().parse::<i32>().map_err(|_| {
                        ValidationError::InvalidSearchParameter {
                            parameter: COUNT_PARAM.to_string(),
                            message: format!("'{}' is not an integer", value),
                        }
                    })?;
                    request.count = Some(count);
                }
                CONTINUATION_TOKEN_PARAM => request.continuation_token = Some(value.clone()),
                _ => {}
            }
        }

        Ok(request)
    }

    /// Sets `_at`.
    pub fn at(mut self, at: PartialDateTime) -> Self {
        self.at = Some(at);
        self
    }

    /// Sets `_since`.
    pub fn since(mut self, since: PartialDateTime) -> Self {
        self.since = Some(since);
        self
    }

    /// Sets `_before`.
    pub fn before(mut self, before: PartialDateTime) -> Self {
        self.before = Some(before);
        self
    }

    /// Sets `_count`.
    pub fn count(mut self, count: i32) -> Self {
        self.count = Some(count);
        self
    }

    /// Sets the continuation token.
    pub fn continuation_token(mut self, token: impl Into<String>) -> Self {
        self.continuation_token = Some(token.into());
        self
    }

    /// Checks parameter combinations against the current instant.
    ///
    /// `_at` excludes both `_since` and `_before`, and `_before` may not lie in
    /// the future.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if self.at.is_some() && self.since.is_some() {
            return Err(ValidationError::MutuallyExclusiveParameters {
                first: AT_PARAM.to_string(),
                second: SINCE_PARAM.to_string(),
            });
        }

        if self.at.is_some() && self.before.is_some() {
            return Err(ValidationError::MutuallyExclusiveParameters {
                first: AT_PARAM.to_string(),
                second: BEFORE_PARAM.to_string(),
            });
        }

        if let Some(before) = &self.before
            && before.start_instant() > now
        {
            return Err(ValidationError::FutureInstant {
                parameter: BEFORE_PARAM.to_string(),
            });
        }

        if self.resource_id.is_some() && self.resource_type.is_none() {
            return Err(ValidationError::InvalidOperation {
                message: "instance history requires a resource type".to_string(),
            });
        }

        Ok(())
    }

    /// Lowers the request to ordered query parameters.
    pub fn to_query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        if let Some(id) = &self.resource_id {
            params.push((ID_PARAM.to_string(), id.clone()));
        }

        if let Some(token) = &self.continuation_token {
            params.push((CONTINUATION_TOKEN_PARAM.to_string(), token.clone()));
        }

        match &self.at {
            Some(at) => params.push((LAST_UPDATED_PARAM.to_string(), at.to_string())),
            None => {
                if let Some(since) = &self.since {
                    params.push((LAST_UPDATED_PARAM.to_string(), format!("ge{}", since)));
                }
                if let Some(before) = &self.before {
                    params.push((LAST_UPDATED_PARAM.to_string(), format!("lt{}", before)));
                }
            }
        }

        if let Some(count) = self.count.filter(|c| *c > 0) {
            params.push((COUNT_PARAM.to_string(), count.to_string()));
        }

        params
    }
}
