//! In-memory partitioned table.
//!
//! [`MemoryTableStore`] keeps rows in the same layout a remote table store
//! would: current rows in `<type>` partitions, history rows in
//! `<type>_history` partitions, index columns alongside the intrinsic ones.
//! It implements [`SearchExecutor`] over those rows.
//!
//! # Supported Parameters
//!
//! | Parameter | Behavior |
//! |-----------|----------|
//! | `_id` | Comma-separated ids, any match |
//! | `_lastUpdated` | Prefixes `eq` (default), `ne`, `gt`, `lt`, `ge`, `le`; partial dates match their whole range |
//!
//! Any other parameter is returned in
//! [`SearchResult::unsupported_parameters`]. Compartment scopes match rows
//! with a reference index entry pointing at the compartment resource.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::core::{ResourceReader, SearchExecutor, SearchOptions, SearchResult, SearchScope};
use crate::error::{ConcurrencyError, SearchError, StorageError, StorageResult, ValidationError};
use crate::search::{INDEX_COLUMN_PREFIX, IndexCompileSession, IndexFields};
use crate::table::{
    RowAddress, TableRow, from_row, is_history_partition, resource_type_from_partition, to_row,
};
use crate::types::{PartialDateTime, SearchIndexEntry, StoredResource};

const ID_PARAM: &str = "_id";
const LAST_UPDATED_PARAM: &str = "_lastUpdated";

/// Opaque position in a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct ContinuationToken {
    /// Token format version.
    version: u8,
    /// Number of rows already returned.
    offset: usize,
}

impl ContinuationToken {
    fn new(offset: usize) -> Self {
        Self { version: 1, offset }
    }

    fn encode(&self) -> StorageResult<String> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    fn decode(s: &str) -> Result<Self, SearchError> {
        let bytes = URL_SAFE_NO_PAD.decode(s)?;
        serde_json::from_slice(&bytes).map_err(|_| SearchError::InvalidCursor {
            cursor: s.to_string(),
        })
    }
}

/// A comparison against the `_lastUpdated` timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DatePrefix {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl DatePrefix {
    fn split(value: &str) -> (Self, &str) {
        let prefixes = [
            ("eq", DatePrefix::Eq),
            ("ne", DatePrefix::Ne),
            ("gt", DatePrefix::Gt),
            ("lt", DatePrefix::Lt),
            ("ge", DatePrefix::Ge),
            ("le", DatePrefix::Le),
        ];
        prefixes
            .iter()
            .find_map(|(p, prefix)| value.strip_prefix(p).map(|rest| (*prefix, rest)))
            .unwrap_or((DatePrefix::Eq, value))
    }

    fn matches(self, date: &PartialDateTime, instant: DateTime<Utc>) -> bool {
        match self {
            DatePrefix::Eq => date.contains(instant),
            DatePrefix::Ne => !date.contains(instant),
            DatePrefix::Gt => instant >= date.end_instant_exclusive(),
            DatePrefix::Lt => instant < date.start_instant(),
            DatePrefix::Ge => instant >= date.start_instant(),
            DatePrefix::Le => instant < date.end_instant_exclusive(),
        }
    }
}

/// One parsed filter.
#[derive(Debug, Clone)]
enum RowFilter {
    Ids(Vec<String>),
    LastUpdated(DatePrefix, PartialDateTime),
    Compartment {
        compartment_type: String,
        compartment_id: String,
    },
}

impl RowFilter {
    fn matches(&self, resource: &StoredResource, fields: &IndexFields) -> bool {
        match self {
            RowFilter::Ids(ids) => ids.iter().any(|id| id == resource.id()),
            RowFilter::LastUpdated(prefix, date) => prefix.matches(date, resource.last_modified()),
            RowFilter::Compartment {
                compartment_type,
                compartment_id,
            } => references(fields, compartment_type, compartment_id),
        }
    }
}

/// Returns true if any reference index entry points at `type/id`.
fn references(fields: &IndexFields, resource_type: &str, id: &str) -> bool {
    fields.iter().any(|(column, value)| {
        let Some(entry) = column
            .strip_prefix(INDEX_COLUMN_PREFIX)
            .and_then(|rest| rest.strip_suffix("_ResourceId"))
        else {
            return false;
        };
        let type_column = format!("{}{}_ResourceType", INDEX_COLUMN_PREFIX, entry);
        value.as_str() == Some(id)
            && fields.get(&type_column).and_then(|v| v.as_str()) == Some(resource_type)
    })
}

#[derive(Debug, Default)]
struct MemoryTable {
    partitions: BTreeMap<String, BTreeMap<String, TableRow>>,
}

impl MemoryTable {
    fn get(&self, address: &RowAddress) -> Option<&TableRow> {
        self.partitions
            .get(&address.partition_key)
            .and_then(|partition| partition.get(&address.row_key))
    }

    fn contains(&self, address: &RowAddress) -> bool {
        self.get(address).is_some()
    }

    fn put(&mut self, row: TableRow) {
        self.partitions
            .entry(row.partition_key.clone())
            .or_default()
            .insert(row.row_key.clone(), row);
    }

    fn rows_in<'a>(
        &'a self,
        resource_type: Option<&'a str>,
        history: bool,
    ) -> impl Iterator<Item = &'a TableRow> + 'a {
        self.partitions
            .iter()
            .filter(move |(key, _)| {
                is_history_partition(key) == history
                    && resource_type.is_none_or(|rt| resource_type_from_partition(key) == rt)
            })
            .flat_map(|(_, partition)| partition.values())
    }
}

/// An in-memory partitioned table store.
///
/// Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct MemoryTableStore {
    table: Arc<RwLock<MemoryTable>>,
}

impl MemoryTableStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes one resource version.
    ///
    /// Compiles the index entries with a fresh session, upserts the current
    /// row and inserts the history row. Writing the same id and version twice
    /// is a version conflict.
    pub fn write(
        &self,
        resource: &StoredResource,
        entries: &[SearchIndexEntry],
    ) -> StorageResult<()> {
        let fields = IndexCompileSession::compile_all(entries)?;

        let current = to_row(&resource.clone().with_history(false), &fields)?;
        let history = to_row(&resource.to_history(), &fields)?;

        let mut table = self.table.write();
        if table.contains(&history.address()) {
            return Err(ConcurrencyError::VersionConflict {
                resource_type: resource.resource_type().to_string(),
                id: resource.id().to_string(),
                version_id: resource.version_id().to_string(),
            }
            .into());
        }
        table.put(current);
        table.put(history);
        drop(table);

        tracing::debug!(
            resource_type = %resource.resource_type(),
            id = %resource.id(),
            version_id = %resource.version_id(),
            index_columns = fields.len(),
            "Wrote resource version"
        );

        Ok(())
    }

    /// Stores a row as is.
    pub fn put_row(&self, row: TableRow) {
        self.table.write().put(row);
    }

    /// Returns a copy of the row at the given address.
    pub fn row(&self, address: &RowAddress) -> Option<TableRow> {
        self.table.read().get(address).cloned()
    }

    /// Returns the total number of rows across all partitions.
    pub fn row_count(&self) -> usize {
        self.table
            .read()
            .partitions
            .values()
            .map(BTreeMap::len)
            .sum()
    }

    fn run(&self, options: &SearchOptions, history: bool) -> StorageResult<SearchResult> {
        let offset = match options.continuation_token.as_deref() {
            Some(token) => ContinuationToken::decode(token)?.offset,
            None => 0,
        };

        let (filters, unsupported) = parse_filters(options)?;

        let mut matches = {
            let table = self.table.read();
            let mut matches = Vec::new();
            for row in table.rows_in(options.resource_type(), history) {
                let (resource, fields) = from_row(row)?;
                if !history && resource.is_deleted() {
                    continue;
                }
                if filters.iter().all(|f| f.matches(&resource, &fields)) {
                    matches.push(resource);
                }
            }
            matches
        };

        if history {
            matches.sort_by(|a, b| {
                b.last_modified()
                    .cmp(&a.last_modified())
                    .then_with(|| compare_versions(b.version_id(), a.version_id()))
            });
        }

        let page_size = options.max_item_count.max(1) as usize;
        let total = matches.len();
        let resources: Vec<StoredResource> =
            matches.into_iter().skip(offset).take(page_size).collect();

        let next = offset + resources.len();
        let continuation_token = if next < total {
            Some(ContinuationToken::new(next).encode()?)
        } else {
            None
        };

        tracing::trace!(
            history,
            total,
            returned = resources.len(),
            "Executed table search"
        );

        Ok(SearchResult::new(resources)
            .with_continuation_token(continuation_token)
            .with_unsupported_parameters(unsupported))
    }
}

/// Orders version ids numerically when both are integers, as text otherwise.
fn compare_versions(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

fn parse_filters(
    options: &SearchOptions,
) -> StorageResult<(Vec<RowFilter>, Vec<(String, String)>)> {
    let mut filters = Vec::new();
    let mut unsupported = Vec::new();

    if let SearchScope::Compartment {
        compartment_type,
        compartment_id,
        ..
    } = &options.scope
    {
        filters.push(RowFilter::Compartment {
            compartment_type: compartment_type.clone(),
            compartment_id: compartment_id.clone(),
        });
    }

    for (name, value) in &options.parameters {
        match name.as_str() {
            ID_PARAM => filters.push(RowFilter::Ids(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            LAST_UPDATED_PARAM => {
                let (prefix, date) = DatePrefix::split(value);
                let date = PartialDateTime::parse_parameter(LAST_UPDATED_PARAM, date)
                    .map_err(StorageError::from)?;
                filters.push(RowFilter::LastUpdated(prefix, date));
            }
            _ => unsupported.push((name.clone(), value.clone())),
        }
    }

    Ok((filters, unsupported))
}

#[async_trait]
impl ResourceReader for MemoryTableStore {
    async fn get(&self, resource_type: &str, id: &str) -> StorageResult<Option<StoredResource>> {
        let address = RowAddress::current(resource_type, id).map_err(|_| {
            ValidationError::InvalidOperation {
                message: "resource type and id must not be empty".to_string(),
            }
        })?;

        let Some(row) = self.row(&address) else {
            return Ok(None);
        };
        let (resource, _) = from_row(&row)?;
        Ok(Some(resource))
    }
}

#[async_trait]
impl SearchExecutor for MemoryTableStore {
    async fn execute_search(&self, options: &SearchOptions) -> StorageResult<SearchResult> {
        self.run(options, false)
    }

    async fn execute_history_search(&self, options: &SearchOptions) -> StorageResult<SearchResult> {
        self.run(options, true)
    }
}
