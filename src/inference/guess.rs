// SPDX-License-Identifier: Apache-2.0

//! Foreign key guessing
//!
//! The heuristic core: for every column of a table, propose a target
//! table/column from naming convention and declared-type compatibility.
//! Requires the complete table list up front — guessing is strictly a second
//! pass after discovery has enumerated every table.

use crate::model::{ColumnMetadata, TableMetadata};

/// Identifier suffixes recognized as a trailing word of a column name.
const ID_SUFFIXES: [&str; 3] = ["id", "uuid", "guid"];

/// One guess result, positionally aligned with the input column list.
///
/// A column with no plausible target still gets an entry, with no target and
/// confidence 0, so `guess(columns, _).len() == columns.len()` always holds.
#[derive(Debug, Clone, PartialEq)]
pub struct FkGuess {
    pub column: String,
    pub target_table: Option<String>,
    pub target_column: Option<String>,
    pub confidence: f64,
}

impl FkGuess {
    fn no_match(column: &str) -> Self {
        Self {
            column: column.to_string(),
            target_table: None,
            target_column: None,
            confidence: 0.0,
        }
    }

    fn matched(column: &str, table: &str, target_column: &str) -> Self {
        Self {
            column: column.to_string(),
            target_table: Some(table.to_string()),
            target_column: Some(target_column.to_string()),
            // Exact-name matches are all-or-nothing; the field exists so
            // declared links and future partial scoring stay representable.
            confidence: 1.0,
        }
    }

    pub fn is_match(&self) -> bool {
        self.confidence > 0.0 && self.target_table.is_some()
    }
}

/// Strips a trailing identifier suffix from a normalized column name.
///
/// `user id` → `user`; `category uuid` → `category`; a bare `id` has nothing
/// left (it is the table's own key, not a reference) and yields `None`;
/// a name without the suffix is used whole.
fn strip_identifier_suffix(normalized: &str) -> Option<String> {
    let tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
    match tokens.split_last() {
        None => None,
        Some((last, rest)) if ID_SUFFIXES.contains(last) => {
            if rest.is_empty() {
                None
            } else {
                Some(rest.join(" "))
            }
        }
        _ => Some(normalized.to_string()),
    }
}

/// Whether a normalized column name is exactly an identifier word
/// (`id`, `uuid`, `guid`) — the shape of a table's own key column.
fn is_identifier_shaped(normalized: &str) -> bool {
    ID_SUFFIXES.contains(&normalized)
}

/// Resolves which column on the target table the guess should point at:
/// the table's own id-shaped identifier column if it has one, otherwise the
/// head of its resolved primary key.
fn resolve_target_column(target: &TableMetadata) -> Option<String> {
    let id_shaped = target
        .details
        .columns
        .values()
        .find(|c| c.column_type.is_identifier_like() && is_identifier_shaped(&c.normalized_name));
    if let Some(col) = id_shaped {
        return Some(col.name.clone());
    }
    target.details.pk.first().cloned()
}

/// Proposes a foreign-key target for every column of `source_columns`.
///
/// Eligibility gate first (identifier-like declared type), then the naming
/// heuristic against the normalized names of `all_tables`. Exact name match
/// only; when several tables share a normalized name the first in list order
/// wins.
pub fn guess(source_columns: &[ColumnMetadata], all_tables: &[TableMetadata]) -> Vec<FkGuess> {
    source_columns
        .iter()
        .map(|column| guess_column(column, all_tables))
        .collect()
}

fn guess_column(column: &ColumnMetadata, all_tables: &[TableMetadata]) -> FkGuess {
    if !column.column_type.is_identifier_like() {
        return FkGuess::no_match(&column.name);
    }
    let Some(stripped) = strip_identifier_suffix(&column.normalized_name) else {
        return FkGuess::no_match(&column.name);
    };
    let Some(target) = all_tables
        .iter()
        .find(|t| t.details.normalized_name == stripped)
    else {
        return FkGuess::no_match(&column.name);
    };
    match resolve_target_column(target) {
        Some(target_column) => FkGuess::matched(&column.name, &target.name, &target_column),
        None => FkGuess::no_match(&column.name),
    }
}
