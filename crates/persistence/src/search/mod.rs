//! Search index compilation.
//!
//! This module turns typed search values into the flat columns stored next to
//! each resource row:
//!
//! - [`compiler`] - Per-version compile session and value encoding rules
//! - [`entry`] - Index entries, index fields and column naming
//!
//! # Index Pipeline
//!
//! ```text
//! SearchIndexEntry ("code", Composite[[Token a, Token b], [Number 1]])
//!    └── IndexCompileSession::compile
//!        ├── IndexEntry "code"  { Code0: a, Low1: 1, High1: 1, Number1: 1 }
//!        └── IndexEntry "code1" { Code0: b, Low1: 1, High1: 1, Number1: 1 }
//!            └── IndexFields { s_code_Code0, s_code_Low1, ..., s_code1_Number1 }
//! ```

pub mod compiler;
pub mod entry;

pub use compiler::{
    IndexCompileSession, SharedIndexCompiler, format_index_date, parse_index_date,
    sanitize_param_name,
};
pub use entry::{
    INDEX_COLUMN_PREFIX, IndexEntry, IndexFields, MULTI_VALUE_SEPARATOR, is_index_column,
};
