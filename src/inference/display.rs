// SPDX-License-Identifier: Apache-2.0

//! Display column selection
//!
//! Picks the columns a row should be summarized by. Rules run in priority
//! order; the first that produces anything wins, and the primary key is the
//! last resort so the result is never empty for a non-empty table.

use crate::model::{ColumnMetadata, ColumnType};

/// Column names treated as self-evidently human-readable labels.
const LABEL_VOCABULARY: [&str; 4] = ["name", "title", "label", "description"];

/// Selects the display columns for a table, in rule priority order:
/// label vocabulary, first/last name pair, email, any non-key text column,
/// primary key head, first column.
pub fn select_display_columns(columns: &[ColumnMetadata], pk: &[String]) -> Vec<String> {
    if columns.is_empty() {
        return Vec::new();
    }

    for word in LABEL_VOCABULARY {
        if let Some(col) = columns.iter().find(|c| c.normalized_name == word) {
            return vec![col.name.clone()];
        }
    }

    let first = columns.iter().find(|c| c.normalized_name == "first name");
    let last = columns.iter().find(|c| c.normalized_name == "last name");
    if let (Some(first), Some(last)) = (first, last) {
        return vec![first.name.clone(), last.name.clone()];
    }

    if let Some(col) = columns
        .iter()
        .find(|c| c.normalized_name.starts_with("email"))
    {
        return vec![col.name.clone()];
    }

    if let Some(col) = columns.iter().find(|c| {
        c.column_type == ColumnType::Text
            && c.normalized_name != "id"
            && !pk.contains(&c.name)
    }) {
        return vec![col.name.clone()];
    }

    if let Some(head) = pk.first() {
        return vec![head.clone()];
    }

    vec![columns[0].name.clone()]
}
