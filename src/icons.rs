// SPDX-License-Identifier: Apache-2.0

//! Icon-assignment capability
//!
//! The analyzer only needs "give me the best icon id for this normalized
//! name"; how icons are chosen belongs to the consuming UI. The default
//! catalog covers the common schema vocabulary and falls back to a generic
//! identifier.

/// Maps normalized names to icon identifiers
pub trait IconCatalog: Send + Sync {
    fn best_icon_for(&self, text: &str) -> String;
}

/// Keyword-driven default catalog
pub struct KeywordIcons;

const KEYWORD_ICONS: &[(&str, &str)] = &[
    ("user", "person"),
    ("person", "person"),
    ("account", "person"),
    ("customer", "person"),
    ("member", "person"),
    ("email", "mail"),
    ("mail", "mail"),
    ("message", "mail"),
    ("order", "cart"),
    ("cart", "cart"),
    ("invoice", "receipt"),
    ("payment", "credit-card"),
    ("product", "box"),
    ("item", "box"),
    ("inventory", "box"),
    ("category", "folder"),
    ("tag", "tag"),
    ("label", "tag"),
    ("comment", "chat"),
    ("post", "document"),
    ("article", "document"),
    ("page", "document"),
    ("file", "paperclip"),
    ("image", "photo"),
    ("photo", "photo"),
    ("address", "map-pin"),
    ("location", "map-pin"),
    ("country", "globe"),
    ("event", "calendar"),
    ("date", "calendar"),
    ("time", "clock"),
    ("setting", "gear"),
    ("config", "gear"),
    ("log", "list"),
    ("session", "key"),
    ("token", "key"),
    ("password", "lock"),
    ("role", "shield"),
    ("permission", "shield"),
    ("organization", "building"),
    ("company", "building"),
    ("team", "people"),
    ("group", "people"),
];

impl IconCatalog for KeywordIcons {
    fn best_icon_for(&self, text: &str) -> String {
        for (keyword, icon) in KEYWORD_ICONS {
            if text.split(' ').any(|token| token == *keyword) {
                return (*icon).to_string();
            }
        }
        "table".to_string()
    }
}
