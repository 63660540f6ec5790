// SPDX-License-Identifier: Apache-2.0

//! Declared/guessed foreign-key merging
//!
//! Catalog-declared constraints are ground truth and always win; guesses
//! only fill columns no constraint covers.

use crate::adapter::DeclaredForeignKey;
use crate::inference::guess::FkGuess;
use crate::model::ForeignKeyLink;

/// Merges declared constraints with heuristic guesses into the final
/// per-column link set.
///
/// Output ordering is declared links first (adapter order), then surviving
/// guesses (input order). Each column appears at most once.
pub fn merge(
    declared: &[DeclaredForeignKey],
    guessed: &[FkGuess],
) -> Vec<(String, ForeignKeyLink)> {
    let mut links: Vec<(String, ForeignKeyLink)> = declared
        .iter()
        .map(|fk| {
            (
                fk.column.clone(),
                ForeignKeyLink::declared(fk.target_table.clone(), fk.target_column.clone()),
            )
        })
        .collect();

    for guess in guessed {
        if !guess.is_match() {
            continue;
        }
        if links.iter().any(|(column, _)| *column == guess.column) {
            continue;
        }
        let (Some(table), Some(target_column)) = (&guess.target_table, &guess.target_column)
        else {
            continue;
        };
        links.push((
            guess.column.clone(),
            ForeignKeyLink::guessed(table.clone(), target_column.clone(), guess.confidence),
        ));
    }

    links
}
