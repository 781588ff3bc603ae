//! Index entries and index fields.
//!
//! An [`IndexEntry`] is the flat representation of one occurrence of a search
//! parameter. Each of its parts becomes one dynamic table column named
//! `s_<EntryName>_<PartName>`. [`IndexFields`] is the resulting set of columns.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

use crate::types::PropertyValue;

/// Prefix marking generated index columns in a table row.
pub const INDEX_COLUMN_PREFIX: &str = "s_";

/// Separator used when the same part is written more than once.
pub const MULTI_VALUE_SEPARATOR: char = '|';

/// Returns true if the column name belongs to the generated index columns.
pub fn is_index_column(column: &str) -> bool {
    column.starts_with(INDEX_COLUMN_PREFIX)
}

/// One occurrence of a search parameter, as named parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    name: String,
    parts: Vec<(String, PropertyValue)>,
}

impl IndexEntry {
    /// Creates an empty entry.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parts: Vec::new(),
        }
    }

    /// Returns the entry name (sanitized parameter name plus occurrence suffix).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a part to the entry.
    ///
    /// Writing a part name that is already present appends the new value to
    /// the existing one, separated by `|`, so multi-valued sub-fields keep all
    /// of their values in insertion order.
    pub fn add_part(&mut self, part: impl Into<String>, value: impl Into<PropertyValue>) {
        let part = part.into();
        let value = value.into();

        match self.parts.iter_mut().find(|(name, _)| *name == part) {
            Some((_, existing)) => {
                let joined = format!("{}{}{}", existing, MULTI_VALUE_SEPARATOR, value);
                *existing = PropertyValue::String(joined);
            }
            None => self.parts.push((part, value)),
        }
    }

    /// Returns the value of a part.
    pub fn part(&self, part: &str) -> Option<&PropertyValue> {
        self.parts
            .iter()
            .find(|(name, _)| name == part)
            .map(|(_, value)| value)
    }

    /// Returns the parts in insertion order.
    pub fn parts(&self) -> &[(String, PropertyValue)] {
        &self.parts
    }

    /// Returns true if no part has been written.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Returns the column name for one of this entry's parts.
    pub fn column_name(&self, part: &str) -> String {
        format!("{}{}_{}", INDEX_COLUMN_PREFIX, self.name, part)
    }

    /// Returns the entry's columns in part order.
    pub fn columns(&self) -> impl Iterator<Item = (String, PropertyValue)> + '_ {
        self.parts
            .iter()
            .map(|(part, value)| (self.column_name(part), value.clone()))
    }
}

/// The set of generated index columns for one resource version.
///
/// Keyed by full column name; iteration order is the column name order, so two
/// compilations of the same input always produce identical sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexFields(BTreeMap<String, PropertyValue>);

impl IndexFields {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a column, returning the previous value.
    pub fn insert(&mut self, column: impl Into<String>, value: PropertyValue) -> Option<PropertyValue> {
        self.0.insert(column.into(), value)
    }

    /// Returns a column value.
    pub fn get(&self, column: &str) -> Option<&PropertyValue> {
        self.0.get(column)
    }

    /// Returns true if the column is present.
    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the columns in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, PropertyValue> {
        self.0.iter()
    }

    /// Returns the column names in name order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Moves every column of `other` into this set.
    pub fn merge(&mut self, other: IndexFields) {
        self.0.extend(other.0);
    }
}

impl IntoIterator for IndexFields {
    type Item = (String, PropertyValue);
    type IntoIter = btree_map::IntoIter<String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a IndexFields {
    type Item = (&'a String, &'a PropertyValue);
    type IntoIter = btree_map::Iter<'a, String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, PropertyValue)> for IndexFields {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<(String, PropertyValue)> for IndexFields {
    fn extend<I: IntoIterator<Item = (String, PropertyValue)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}
