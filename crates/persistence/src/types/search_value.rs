//! Typed search values.
//!
//! Search values are produced by the upstream extraction stage from a resource
//! and consumed by the index compiler. Each variant carries exactly the data
//! needed to build its index columns.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A normalized, strongly-typed value of one searchable attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum SearchValue {
    /// A date range. Point-in-time values use the same instant for both ends.
    Date {
        /// Inclusive start of the range.
        start: DateTime<FixedOffset>,
        /// Inclusive end of the range.
        end: DateTime<FixedOffset>,
    },

    /// A number, possibly expressed as a range.
    Number {
        /// Lower bound.
        low: Option<Decimal>,
        /// Upper bound.
        high: Option<Decimal>,
    },

    /// A quantity with optional unit system and code.
    Quantity {
        /// Unit system URI (e.g., "http://unitsofmeasure.org").
        system: Option<String>,
        /// Unit code (e.g., "kg").
        code: Option<String>,
        /// Lower bound.
        low: Option<Decimal>,
        /// Upper bound.
        high: Option<Decimal>,
    },

    /// A reference to another resource.
    Reference {
        /// Base URI for absolute references.
        base_uri: Option<String>,
        /// Target resource type, if known.
        resource_type: Option<String>,
        /// Target resource id.
        resource_id: String,
    },

    /// A plain string.
    String(String),

    /// A coded value.
    Token {
        /// Code system URI.
        system: Option<String>,
        /// Code value.
        code: Option<String>,
    },

    /// A URI.
    Uri(String),

    /// A composite of positional components.
    ///
    /// Each component holds every candidate value for its position; the
    /// cartesian product of the components is the set of tuples to index.
    Composite(Vec<Vec<SearchValue>>),
}

impl SearchValue {
    /// Creates a date value covering `start..=end`.
    pub fn date(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        SearchValue::Date { start, end }
    }

    /// Creates a date value for a single instant.
    pub fn date_point(instant: DateTime<FixedOffset>) -> Self {
        SearchValue::Date {
            start: instant,
            end: instant,
        }
    }

    /// Creates a number value for a single point.
    pub fn number(value: Decimal) -> Self {
        SearchValue::Number {
            low: Some(value),
            high: Some(value),
        }
    }

    /// Creates a number value covering `low..=high`.
    pub fn number_range(low: Decimal, high: Decimal) -> Self {
        SearchValue::Number {
            low: Some(low),
            high: Some(high),
        }
    }

    /// Creates a quantity value for a single point.
    pub fn quantity(system: Option<String>, code: Option<String>, value: Decimal) -> Self {
        SearchValue::Quantity {
            system,
            code,
            low: Some(value),
            high: Some(value),
        }
    }

    /// Creates a reference value from its parts.
    pub fn reference(
        base_uri: Option<String>,
        resource_type: Option<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        SearchValue::Reference {
            base_uri,
            resource_type,
            resource_id: resource_id.into(),
        }
    }

    /// Creates a string value.
    pub fn string(s: impl Into<String>) -> Self {
        SearchValue::String(s.into())
    }

    /// Creates a token value with system and code.
    pub fn token(system: Option<String>, code: impl Into<String>) -> Self {
        SearchValue::Token {
            system,
            code: Some(code.into()),
        }
    }

    /// Creates a token value with code only.
    pub fn token_code(code: impl Into<String>) -> Self {
        SearchValue::Token {
            system: None,
            code: Some(code.into()),
        }
    }

    /// Creates a URI value.
    pub fn uri(uri: impl Into<String>) -> Self {
        SearchValue::Uri(uri.into())
    }

    /// Creates a composite value from its components.
    pub fn composite(components: Vec<Vec<SearchValue>>) -> Self {
        SearchValue::Composite(components)
    }

    /// Returns true for composite values.
    pub fn is_composite(&self) -> bool {
        matches!(self, SearchValue::Composite(_))
    }
}

/// One extracted search parameter occurrence: the parameter name and its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchIndexEntry {
    /// The search parameter code (e.g., "birthdate", "code-value-quantity").
    pub param_name: String,

    /// The typed value to index.
    pub value: SearchValue,
}

impl SearchIndexEntry {
    /// Creates a new index entry.
    pub fn new(param_name: impl Into<String>, value: SearchValue) -> Self {
        Self {
            param_name: param_name.into(),
            value,
        }
    }
}
