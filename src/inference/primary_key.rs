// SPDX-License-Identifier: Apache-2.0

//! Primary key resolution

use crate::model::ColumnMetadata;

/// Resolves a table's primary key columns.
///
/// Declared constraint columns win verbatim (already in ordinal order from
/// the adapter). With no declared constraint the first column in declaration
/// order stands in, so every table with at least one column has a usable key.
///
/// A table with zero columns is an upstream introspection bug; callers must
/// guard before asking for a key.
pub fn resolve_primary_key(declared: &[String], columns: &[ColumnMetadata]) -> Vec<String> {
    if !declared.is_empty() {
        return declared.to_vec();
    }
    debug_assert!(
        !columns.is_empty(),
        "primary key requested for a table with no columns"
    );
    columns.first().map(|c| vec![c.name.clone()]).unwrap_or_default()
}
