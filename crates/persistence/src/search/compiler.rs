//! Search index compiler.
//!
//! Turns typed search values into flat index columns. One
//! [`IndexCompileSession`] covers exactly one resource version: it numbers the
//! occurrences of each parameter name so that repeated parameters get distinct
//! column names. A numbered name that is already taken by another parameter
//! (`code` occurring twice next to a parameter literally named `code1`) moves
//! on to the next free occurrence.
//!
//! # Column layout
//!
//! | Value | Parts |
//! |-------|-------|
//! | Date | `Start`, `End` |
//! | Number | `Low`, `High`, `Number` (only when Low == High) |
//! | Quantity | `System`?, `Code`?, `Low`, `High`, `Quantity` (only when Low == High) |
//! | Reference | `BaseUri`?, `ResourceType`?, `ResourceId` |
//! | String | `NormalizedString` |
//! | Token | `System`?, `Code`? |
//! | Uri | `Uri` |
//!
//! Composite values open one entry per tuple of the cartesian product of their
//! components; each component's parts carry the component's position as a
//! suffix (`Code0`, `Low1`, ...).
//!
//! # Example
//!
//! ```
//! use helios_table_persistence::search::IndexCompileSession;
//! use helios_table_persistence::types::{SearchIndexEntry, SearchValue};
//!
//! let mut session = IndexCompileSession::new();
//! let fields = session
//!     .compile(&SearchIndexEntry::new("family", SearchValue::string("Smith")))
//!     .unwrap();
//!
//! assert_eq!(
//!     fields.get("s_family_NormalizedString").and_then(|v| v.as_str()),
//!     Some("SMITH")
//! );
//! ```

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, FixedOffset, ParseError, Timelike};
use parking_lot::Mutex;

use crate::error::{IndexError, IndexResult};
use crate::types::{PropertyValue, SearchIndexEntry, SearchValue};

use super::entry::{IndexEntry, IndexFields};

/// Formats a date for an index column.
///
/// The output always carries seven fractional digits and an explicit offset
/// (`2018-01-01T00:00:00.0000000+00:00`), so stored values have constant width
/// and compare correctly as strings.
pub fn format_index_date(value: &DateTime<FixedOffset>) -> String {
    let ticks = (value.nanosecond() % 1_000_000_000) / 100;
    format!(
        "{}.{:07}{}",
        value.format("%Y-%m-%dT%H:%M:%S"),
        ticks,
        value.format("%:z")
    )
}

/// Parses a date written by [`format_index_date`].
pub fn parse_index_date(value: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    DateTime::parse_from_rfc3339(value)
}

/// Removes characters that are not allowed in column names.
pub fn sanitize_param_name(name: &str) -> String {
    name.chars().filter(|c| *c != '-').collect()
}

/// Compiles the search values of one resource version.
#[derive(Debug, Default)]
pub struct IndexCompileSession {
    occurrences: HashMap<String, usize>,
    names: HashSet<String>,
    entries: Vec<IndexEntry>,
}

impl IndexCompileSession {
    /// Creates a fresh session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles every entry of one resource version with a fresh session.
    ///
    /// Either all entries compile or the first error is returned.
    pub fn compile_all<'a, I>(entries: I) -> IndexResult<IndexFields>
    where
        I: IntoIterator<Item = &'a SearchIndexEntry>,
    {
        let mut session = Self::new();
        session.compile_many(entries)
    }

    /// Clears occurrence counters and accumulated entries.
    pub fn reset(&mut self) {
        self.occurrences.clear();
        self.names.clear();
        self.entries.clear();
    }

    /// Compiles one search parameter occurrence.
    ///
    /// Returns the columns produced by this call. A failing call leaves the
    /// session unchanged.
    pub fn compile(&mut self, entry: &SearchIndexEntry) -> IndexResult<IndexFields> {
        let base = sanitize_param_name(&entry.param_name);
        if base.is_empty() {
            return Err(IndexError::EmptyParameterName);
        }

        let mut next = self.occurrences.get(&base).copied().unwrap_or(0);
        let mut claimed = Vec::new();
        let mut produced = Vec::new();

        match &entry.value {
            SearchValue::Composite(components) => {
                for tuple in cartesian_product(components) {
                    let name = self.claim_name(&base, &mut next, &mut claimed);
                    let mut index_entry = IndexEntry::new(name);
                    for (slot, value) in tuple.into_iter().enumerate() {
                        encode_value(&mut index_entry, &entry.param_name, value, Some(slot))?;
                    }
                    produced.push(index_entry);
                }
            }
            value => {
                let name = self.claim_name(&base, &mut next, &mut claimed);
                let mut index_entry = IndexEntry::new(name);
                encode_value(&mut index_entry, &entry.param_name, value, None)?;
                produced.push(index_entry);
            }
        }

        tracing::trace!(
            param = %entry.param_name,
            entries = produced.len(),
            "Compiled search index entry"
        );

        self.occurrences.insert(base, next);
        self.names.extend(claimed);
        let fields = produced.iter().flat_map(IndexEntry::columns).collect();
        self.entries.extend(produced);
        Ok(fields)
    }

    /// Returns the next entry name for `base` not yet used in this session or
    /// in the current call.
    fn claim_name(&self, base: &str, next: &mut usize, claimed: &mut Vec<String>) -> String {
        loop {
            let name = entry_name(base, *next);
            *next += 1;
            if !self.names.contains(&name) && !claimed.contains(&name) {
                claimed.push(name.clone());
                return name;
            }
        }
    }

    /// Compiles several occurrences, merging their columns.
    ///
    /// On error the session keeps whatever earlier calls committed; use
    /// [`compile_all`](Self::compile_all) for an all-or-nothing version.
    pub fn compile_many<'a, I>(&mut self, entries: I) -> IndexResult<IndexFields>
    where
        I: IntoIterator<Item = &'a SearchIndexEntry>,
    {
        let mut fields = IndexFields::new();
        for entry in entries {
            fields.merge(self.compile(entry)?);
        }
        Ok(fields)
    }

    /// Returns every entry compiled since the last reset, in emission order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Returns the columns of every entry compiled since the last reset.
    pub fn fields(&self) -> IndexFields {
        self.entries.iter().flat_map(IndexEntry::columns).collect()
    }
}

/// A compile session shared between writers.
///
/// Each call resets the session and compiles one resource version while
/// holding the lock.
#[derive(Debug, Default)]
pub struct SharedIndexCompiler {
    session: Mutex<IndexCompileSession>,
}

impl SharedIndexCompiler {
    /// Creates a shared compiler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles all entries of one resource version.
    pub fn compile_version<'a, I>(&self, entries: I) -> IndexResult<IndexFields>
    where
        I: IntoIterator<Item = &'a SearchIndexEntry>,
    {
        let mut session = self.session.lock();
        session.reset();
        let result = session.compile_many(entries);
        if result.is_err() {
            session.reset();
        }
        result
    }
}

fn entry_name(base: &str, occurrence: usize) -> String {
    if occurrence == 0 {
        base.to_string()
    } else {
        format!("{}{}", base, occurrence)
    }
}

fn part_name(part: &'static str, slot: Option<usize>) -> Cow<'static, str> {
    match slot {
        Some(slot) => Cow::Owned(format!("{}{}", part, slot)),
        None => Cow::Borrowed(part),
    }
}

fn encode_value(
    entry: &mut IndexEntry,
    param_name: &str,
    value: &SearchValue,
    slot: Option<usize>,
) -> IndexResult<()> {
    let mut add = |part: &'static str, value: PropertyValue| {
        entry.add_part(part_name(part, slot), value);
    };

    match value {
        SearchValue::Date { start, end } => {
            add("Start", format_index_date(start).into());
            add("End", format_index_date(end).into());
        }
        SearchValue::Number { low, high } => {
            if let Some(low) = low {
                add("Low", (*low).into());
            }
            if let Some(high) = high {
                add("High", (*high).into());
            }
            if let (Some(low), Some(high)) = (low, high)
                && low == high
            {
                add("Number", (*low).into());
            }
        }
        SearchValue::Quantity {
            system,
            code,
            low,
            high,
        } => {
            if let Some(system) = non_empty(system) {
                add("System", system.into());
            }
            if let Some(code) = non_empty(code) {
                add("Code", code.into());
            }
            if let Some(low) = low {
                add("Low", (*low).into());
            }
            if let Some(high) = high {
                add("High", (*high).into());
            }
            if let (Some(low), Some(high)) = (low, high)
                && low == high
            {
                add("Quantity", (*low).into());
            }
        }
        SearchValue::Reference {
            base_uri,
            resource_type,
            resource_id,
        } => {
            if resource_id.is_empty() {
                return Err(IndexError::MissingField {
                    parameter: param_name.to_string(),
                    field: "ResourceId".to_string(),
                });
            }
            if let Some(base_uri) = non_empty(base_uri) {
                add("BaseUri", base_uri.into());
            }
            if let Some(resource_type) = non_empty(resource_type) {
                add("ResourceType", resource_type.into());
            }
            add("ResourceId", resource_id.as_str().into());
        }
        SearchValue::String(s) => {
            add("NormalizedString", normalize_string(s).into());
        }
        SearchValue::Token { system, code } => {
            if let Some(system) = non_empty(system) {
                add("System", system.into());
            }
            if let Some(code) = non_empty(code) {
                add("Code", code.into());
            }
        }
        SearchValue::Uri(uri) => {
            add("Uri", uri.as_str().into());
        }
        SearchValue::Composite(_) => {
            return Err(IndexError::NestedComposite {
                parameter: param_name.to_string(),
            });
        }
    }

    Ok(())
}

/// Uppercases one character at a time. Characters whose uppercase form is
/// longer than one character (`ß`) are kept as they are.
fn normalize_string(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            let mut upper = c.to_uppercase();
            match (upper.next(), upper.next()) {
                (Some(u), None) => u,
                _ => c,
            }
        })
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Expands composite components into tuples, first component varying slowest.
fn cartesian_product(components: &[Vec<SearchValue>]) -> Vec<Vec<&SearchValue>> {
    if components.is_empty() {
        return Vec::new();
    }

    let mut tuples: Vec<Vec<&SearchValue>> = vec![Vec::new()];
    for component in components {
        tuples = tuples
            .into_iter()
            .flat_map(|prefix| {
                component.iter().map(move |value| {
                    let mut tuple = prefix.clone();
                    tuple.push(value);
                    tuple
                })
            })
            .collect();
    }
    tuples
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(y, m, d, 0, 0, 0)
            .unwrap()
    }

    fn text(fields: &IndexFields, column: &str) -> Option<String> {
        fields.get(column).map(|v| v.to_string())
    }

    #[test]
    fn test_date_has_fixed_fraction_and_offset() {
        let formatted = format_index_date(&utc(2018, 1, 1));
        assert_eq!(formatted, "2018-01-01T00:00:00.0000000+00:00");

        let parsed = parse_index_date(&formatted).unwrap();
        assert_eq!(format_index_date(&parsed), formatted);
    }

    #[test]
    fn test_date_keeps_sub_second_ticks() {
        let dt = FixedOffset::east_opt(-5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2020, 6, 1, 12, 30, 15)
            .unwrap()
            + chrono::Duration::microseconds(123_456);
        assert_eq!(format_index_date(&dt), "2020-06-01T12:30:15.1234560-05:00");
    }

    #[test]
    fn test_compile_date() {
        let mut session = IndexCompileSession::new();
        let fields = session
            .compile(&SearchIndexEntry::new(
                "birthdate",
                SearchValue::date(utc(1980, 5, 1), utc(1980, 5, 2)),
            ))
            .unwrap();

        assert_eq!(
            text(&fields, "s_birthdate_Start").as_deref(),
            Some("1980-05-01T00:00:00.0000000+00:00")
        );
        assert_eq!(
            text(&fields, "s_birthdate_End").as_deref(),
            Some("1980-05-02T00:00:00.0000000+00:00")
        );
    }

    #[test]
    fn test_number_point_emits_number_field() {
        let mut session = IndexCompileSession::new();
        let fields = session
            .compile(&SearchIndexEntry::new("probability", SearchValue::number(Decimal::new(5, 1))))
            .unwrap();

        assert_eq!(fields.len(), 3);
        assert!(fields.contains("s_probability_Low"));
        assert!(fields.contains("s_probability_High"));
        assert_eq!(
            fields.get("s_probability_Number"),
            Some(&PropertyValue::Number(Decimal::new(5, 1)))
        );
    }

    #[test]
    fn test_number_range_omits_number_field() {
        let mut session = IndexCompileSession::new();
        let fields = session
            .compile(&SearchIndexEntry::new(
                "probability",
                SearchValue::number_range(Decimal::new(1, 1), Decimal::new(9, 1)),
            ))
            .unwrap();

        assert_eq!(fields.len(), 2);
        assert!(!fields.contains("s_probability_Number"));
    }

    #[test]
    fn test_quantity_fields() {
        let mut session = IndexCompileSession::new();
        let point = session
            .compile(&SearchIndexEntry::new(
                "value-quantity",
                SearchValue::quantity(
                    Some("http://unitsofmeasure.org".to_string()),
                    Some("kg".to_string()),
                    Decimal::new(70, 0),
                ),
            ))
            .unwrap();

        assert_eq!(
            text(&point, "s_valuequantity_System").as_deref(),
            Some("http://unitsofmeasure.org")
        );
        assert_eq!(text(&point, "s_valuequantity_Code").as_deref(), Some("kg"));
        assert!(point.contains("s_valuequantity_Quantity"));

        let range = session
            .compile(&SearchIndexEntry::new(
                "value-quantity",
                SearchValue::Quantity {
                    system: None,
                    code: None,
                    low: Some(Decimal::new(1, 0)),
                    high: Some(Decimal::new(2, 0)),
                },
            ))
            .unwrap();

        assert_eq!(
            range.column_names().collect::<Vec<_>>(),
            vec!["s_valuequantity1_High", "s_valuequantity1_Low"]
        );
    }

    #[test]
    fn test_reference_fields() {
        let mut session = IndexCompileSession::new();
        let fields = session
            .compile(&SearchIndexEntry::new(
                "subject",
                SearchValue::reference(None, Some("Patient".to_string()), "123"),
            ))
            .unwrap();

        assert_eq!(fields.len(), 2);
        assert_eq!(text(&fields, "s_subject_ResourceType").as_deref(), Some("Patient"));
        assert_eq!(text(&fields, "s_subject_ResourceId").as_deref(), Some("123"));
    }

    #[test]
    fn test_reference_without_id_fails() {
        let mut session = IndexCompileSession::new();
        let err = session
            .compile(&SearchIndexEntry::new(
                "subject",
                SearchValue::reference(None, Some("Patient".to_string()), ""),
            ))
            .unwrap_err();

        assert_eq!(
            err,
            IndexError::MissingField {
                parameter: "subject".to_string(),
                field: "ResourceId".to_string(),
            }
        );
    }

    #[test]
    fn test_string_is_uppercased() {
        let mut session = IndexCompileSession::new();
        let fields = session
            .compile(&SearchIndexEntry::new("name", SearchValue::string("Müller")))
            .unwrap();
        assert_eq!(text(&fields, "s_name_NormalizedString").as_deref(), Some("MÜLLER"));
    }

    #[test]
    fn test_uppercase_keeps_expanding_characters() {
        let mut session = IndexCompileSession::new();
        let fields = session
            .compile(&SearchIndexEntry::new("address", SearchValue::string("Straße")))
            .unwrap();
        assert_eq!(
            text(&fields, "s_address_NormalizedString").as_deref(),
            Some("STRAßE")
        );
    }

    #[test]
    fn test_token_and_uri() {
        let mut session = IndexCompileSession::new();
        let token = session
            .compile(&SearchIndexEntry::new("gender", SearchValue::token_code("female")))
            .unwrap();
        assert_eq!(token.column_names().collect::<Vec<_>>(), vec!["s_gender_Code"]);

        let uri = session
            .compile(&SearchIndexEntry::new("url", SearchValue::uri("http://example.org/a")))
            .unwrap();
        assert_eq!(text(&uri, "s_url_Uri").as_deref(), Some("http://example.org/a"));
    }

    #[test]
    fn test_occurrence_suffix_per_name() {
        let mut session = IndexCompileSession::new();
        session
            .compile(&SearchIndexEntry::new("given", SearchValue::string("a")))
            .unwrap();
        session
            .compile(&SearchIndexEntry::new("family", SearchValue::string("b")))
            .unwrap();
        session
            .compile(&SearchIndexEntry::new("given", SearchValue::string("c")))
            .unwrap();
        session
            .compile(&SearchIndexEntry::new("given", SearchValue::string("d")))
            .unwrap();

        let names: Vec<_> = session.entries().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["given", "family", "given1", "given2"]);
    }

    #[test]
    fn test_numbered_name_skips_taken_names() {
        let mut session = IndexCompileSession::new();
        for (name, code) in [("code1", "x"), ("code", "a"), ("code", "b")] {
            session
                .compile(&SearchIndexEntry::new(name, SearchValue::token_code(code)))
                .unwrap();
        }

        let names: Vec<_> = session.entries().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["code1", "code", "code2"]);
        assert_eq!(session.fields().len(), 3);
    }

    #[test]
    fn test_reset_clears_counters() {
        let mut session = IndexCompileSession::new();
        let entry = SearchIndexEntry::new("given", SearchValue::string("a"));
        session.compile(&entry).unwrap();
        session.reset();

        assert!(session.entries().is_empty());
        let fields = session.compile(&entry).unwrap();
        assert!(fields.contains("s_given_NormalizedString"));
    }

    #[test]
    fn test_composite_cartesian_product() {
        let mut session = IndexCompileSession::new();
        let value = SearchValue::composite(vec![
            vec![SearchValue::token_code("a"), SearchValue::token_code("b")],
            vec![
                SearchValue::number(Decimal::ONE),
                SearchValue::number(Decimal::TWO),
                SearchValue::number(Decimal::TEN),
            ],
        ]);
        session
            .compile(&SearchIndexEntry::new("code-value", value))
            .unwrap();

        let entries = session.entries();
        assert_eq!(entries.len(), 6);

        let tuples: Vec<(String, String)> = entries
            .iter()
            .map(|e| {
                (
                    e.part("Code0").unwrap().to_string(),
                    e.part("Number1").unwrap().to_string(),
                )
            })
            .collect();
        assert_eq!(
            tuples,
            vec![
                ("a".to_string(), "1".to_string()),
                ("a".to_string(), "2".to_string()),
                ("a".to_string(), "10".to_string()),
                ("b".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
                ("b".to_string(), "10".to_string()),
            ]
        );
        assert_eq!(entries[0].name(), "codevalue");
        assert_eq!(entries[5].name(), "codevalue5");
    }

    #[test]
    fn test_composite_parts_in_positional_order() {
        let mut session = IndexCompileSession::new();
        let value = SearchValue::composite(vec![
            vec![SearchValue::token(Some("http://loinc.org".to_string()), "8480-6")],
            vec![SearchValue::quantity(None, Some("mm[Hg]".to_string()), Decimal::new(120, 0))],
        ]);
        session
            .compile(&SearchIndexEntry::new("component-code-value-quantity", value))
            .unwrap();

        let parts: Vec<&str> = session.entries()[0]
            .parts()
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(
            parts,
            vec!["System0", "Code0", "Code1", "Low1", "High1", "Quantity1"]
        );
    }

    #[test]
    fn test_composite_with_empty_component_emits_nothing() {
        let mut session = IndexCompileSession::new();
        let value = SearchValue::composite(vec![vec![SearchValue::token_code("a")], vec![]]);
        let fields = session
            .compile(&SearchIndexEntry::new("code-value", value))
            .unwrap();
        assert!(fields.is_empty());
        assert!(session.entries().is_empty());
    }

    #[test]
    fn test_failed_compile_leaves_session_unchanged() {
        let mut session = IndexCompileSession::new();
        session
            .compile(&SearchIndexEntry::new("subject", SearchValue::reference(None, None, "1")))
            .unwrap();

        let broken = SearchValue::composite(vec![
            vec![SearchValue::token_code("a")],
            vec![
                SearchValue::reference(None, None, "2"),
                SearchValue::reference(None, None, ""),
            ],
        ]);
        assert!(session.compile(&SearchIndexEntry::new("subject", broken)).is_err());
        assert_eq!(session.entries().len(), 1);

        let fields = session
            .compile(&SearchIndexEntry::new("subject", SearchValue::reference(None, None, "3")))
            .unwrap();
        assert!(fields.contains("s_subject1_ResourceId"));
    }

    #[test]
    fn test_nested_composite_fails() {
        let mut session = IndexCompileSession::new();
        let nested = SearchValue::composite(vec![vec![SearchValue::composite(vec![])]]);
        assert!(matches!(
            session.compile(&SearchIndexEntry::new("x", nested)),
            Err(IndexError::NestedComposite { .. })
        ));
    }

    #[test]
    fn test_empty_parameter_name_fails() {
        let mut session = IndexCompileSession::new();
        assert_eq!(
            session.compile(&SearchIndexEntry::new("-", SearchValue::string("a"))),
            Err(IndexError::EmptyParameterName)
        );
    }

    #[test]
    fn test_compile_all_is_idempotent() {
        let entries = vec![
            SearchIndexEntry::new("name", SearchValue::string("Smith")),
            SearchIndexEntry::new("name", SearchValue::string("John")),
            SearchIndexEntry::new("birthdate", SearchValue::date_point(utc(1970, 1, 1))),
        ];

        let first = IndexCompileSession::compile_all(&entries).unwrap();
        let second = IndexCompileSession::compile_all(&entries).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_shared_compiler_resets_between_versions() {
        let compiler = SharedIndexCompiler::new();
        let entries = vec![SearchIndexEntry::new("name", SearchValue::string("Smith"))];

        let v1 = compiler.compile_version(&entries).unwrap();
        let v2 = compiler.compile_version(&entries).unwrap();
        assert_eq!(v1, v2);
        assert!(v2.contains("s_name_NormalizedString"));
    }
}
