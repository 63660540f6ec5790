// SPDX-License-Identifier: Apache-2.0

//! Name normalization
//!
//! Converts raw identifiers (`UserAccounts`, `user_accounts`, `user-accounts`)
//! into a canonical lowercase, space-separated, singular phrase
//! (`user account`). This phrase is the join key for foreign-key guessing,
//! so `normalize` must be idempotent: re-normalizing its own output is a
//! no-op.

use inflector::Inflector;

/// Irregular plurals that the inflector misses or mangles in database
/// naming contexts.
static IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("status", "statuses"),
    ("address", "addresses"),
    ("analysis", "analyses"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("medium", "media"),
    ("datum", "data"),
    ("criterion", "criteria"),
    ("leaf", "leaves"),
    ("life", "lives"),
];

/// Normalize a raw table or column identifier.
///
/// Tokenizes on non-alphanumeric characters and camelCase boundaries,
/// lowercases, then singularizes the trailing token (the head noun of the
/// phrase). Empty input yields an empty string.
pub fn normalize(raw: &str) -> String {
    let mut tokens = tokenize(raw);
    let Some(last) = tokens.pop() else {
        return String::new();
    };
    tokens.push(singularize(&last));
    tokens.join(" ")
}

/// Singularize a single lowercase word.
///
/// Irregulars are table-driven; everything else goes through the inflector,
/// iterated to a fixpoint so that already-singular output stays put.
pub fn singularize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    for (singular, plural) in IRREGULAR_PLURALS {
        if word == *plural || word == *singular {
            return (*singular).to_string();
        }
    }
    let mut current = word.to_string();
    // The inflector is not guaranteed stable on its own output.
    for _ in 0..3 {
        let next = current.to_singular();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Pluralize a single lowercase word (used for plural display names).
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    for (singular, plural) in IRREGULAR_PLURALS {
        if word == *singular || word == *plural {
            return (*plural).to_string();
        }
    }
    word.to_plural()
}

/// Human display name for a normalized phrase: `user account` → `User Account`.
pub fn title_case(normalized: &str) -> String {
    normalized
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(|t| {
            let mut chars = t.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn tokenize(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            if ch.is_uppercase() && prev_lower && !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            current.extend(ch.to_lowercase());
            prev_lower = ch.is_lowercase() || ch.is_numeric();
        } else {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            prev_lower = false;
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_common_shapes() {
        assert_eq!(normalize("users"), "user");
        assert_eq!(normalize("UserAccounts"), "user account");
        assert_eq!(normalize("user_accounts"), "user account");
        assert_eq!(normalize("user-accounts"), "user account");
        assert_eq!(normalize("ORDER_ITEMS"), "order item");
    }

    #[test]
    fn singularizes_the_phrase_not_each_token() {
        // "orders" stays plural when it is not the head noun
        assert_eq!(normalize("orders_queue"), "orders queue");
        assert_eq!(normalize("sales_regions"), "sales region");
    }

    #[test]
    fn handles_irregular_plurals() {
        assert_eq!(normalize("people"), "person");
        assert_eq!(normalize("sales_people"), "sales person");
        assert_eq!(normalize("statuses"), "status");
        assert_eq!(normalize("addresses"), "address");
    }

    #[test]
    fn empty_and_symbol_only_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("__"), "");
    }

    #[test]
    fn idempotent_on_a_spread_of_inputs() {
        let samples = [
            "users",
            "UserAccounts",
            "order_items",
            "people",
            "statuses",
            "addresses",
            "category",
            "categories",
            "API_Keys",
            "first_name",
            "x",
            "orders_queue",
            "id",
            "user_id",
            "analysis_results",
        ];
        for s in samples {
            let once = normalize(s);
            let twice = normalize(&once);
            assert_eq!(once, twice, "normalize not idempotent for {s:?}");
        }
    }

    #[test]
    fn title_case_display_names() {
        assert_eq!(title_case("user account"), "User Account");
        assert_eq!(title_case("order"), "Order");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn pluralize_for_display() {
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("person"), "people");
    }
}
