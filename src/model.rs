// SPDX-License-Identifier: Apache-2.0

//! Data model for connections and inferred table metadata
//!
//! The `TableDetails`/`ColumnMetadata` structures double as the on-disk JSON
//! shape of the metadata store's `details` column, so their serde field names
//! (camelCase) are a compatibility surface and must not change casually.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a saved connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Supported database kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    Postgres,
    Sqlite,
}

impl ConnectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionKind::Postgres => "postgres",
            ConnectionKind::Sqlite => "sqlite",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "postgres" => Some(ConnectionKind::Postgres),
            "sqlite" => Some(ConnectionKind::Sqlite),
            _ => None,
        }
    }
}

/// Kind-specific connection parameters
///
/// Network databases carry host/credentials; embedded databases carry a
/// file path. Stored as the `details` JSON of a `connections` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConnectionParams {
    Network {
        host: String,
        port: u16,
        username: String,
        password: String,
        database: Option<String>,
        ssl: bool,
    },
    File {
        path: String,
    },
}

/// A saved database endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    pub id: ConnectionId,
    pub name: String,
    pub kind: ConnectionKind,
    pub params: ConnectionParams,
}

/// Semantic classification of a column's declared type
///
/// Computed once at introspection time; downstream code never re-inspects
/// raw type strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Numeric,
    Date,
    Boolean,
    Json,
    Uuid,
    Enum,
    Unknown,
}

impl ColumnType {
    /// Maps a raw database type name to its semantic classification.
    ///
    /// `is_user_defined_enum` comes from the adapter (catalog databases can
    /// tell enums apart from plain text; the raw name alone cannot).
    pub fn classify(raw_type: &str, is_user_defined_enum: bool) -> Self {
        if is_user_defined_enum {
            return ColumnType::Enum;
        }
        let raw = raw_type.to_lowercase();
        if raw.contains("uuid") || raw.contains("uniqueidentifier") || raw == "guid" {
            ColumnType::Uuid
        } else if raw.contains("json") {
            ColumnType::Json
        } else if raw.contains("bool") {
            ColumnType::Boolean
        } else if raw.contains("date") || raw.contains("time") {
            ColumnType::Date
        } else if raw.contains("int")
            || raw.contains("serial")
            || raw.contains("numeric")
            || raw.contains("decimal")
            || raw.contains("real")
            || raw.contains("double")
            || raw.contains("float")
            || raw.contains("money")
        {
            ColumnType::Numeric
        } else if raw.contains("char")
            || raw.contains("text")
            || raw.contains("clob")
            || raw.contains("citext")
            || raw.contains("name")
        {
            ColumnType::Text
        } else {
            ColumnType::Unknown
        }
    }

    /// Whether a column of this type can plausibly hold a row identifier.
    /// Only such columns are eligible for foreign-key guessing.
    pub fn is_identifier_like(self) -> bool {
        matches!(self, ColumnType::Numeric | ColumnType::Uuid)
    }
}

/// A foreign-key relationship attached to a column
///
/// `is_guessed` distinguishes heuristic inference from a catalog-declared
/// constraint; `confidence` is only present on guessed links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyLink {
    pub table: String,
    pub column: String,
    pub is_guessed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl ForeignKeyLink {
    pub fn declared(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            is_guessed: false,
            confidence: None,
        }
    }

    pub fn guessed(table: impl Into<String>, column: impl Into<String>, confidence: f64) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            is_guessed: true,
            confidence: Some(confidence),
        }
    }
}

/// Per-column inferred metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMetadata {
    pub name: String,
    pub normalized_name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub display_name: String,
    pub icon: String,
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyLink>,
}

/// View kinds a table can be rendered as
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Inline,
    Card,
    List,
}

impl ViewKind {
    pub const ALL: [ViewKind; 3] = [ViewKind::Inline, ViewKind::Card, ViewKind::List];
}

/// Placement of one column within a view
///
/// `order` values need not be contiguous; ties fall back to column
/// declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewColumnConfig {
    pub order: i64,
    pub hidden: bool,
}

/// Column layout for a single view kind, keyed by column name
pub type ViewConfig = BTreeMap<String, ViewColumnConfig>;

/// The analyzed details of one table, persisted as a JSON blob
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDetails {
    pub normalized_name: String,
    pub display_name: String,
    pub display_name_plural: String,
    pub icon: String,
    pub color: String,
    pub display_columns: Vec<String>,
    pub pk: Vec<String>,
    pub columns: BTreeMap<String, ColumnMetadata>,
    #[serde(default)]
    pub views: BTreeMap<ViewKind, ViewConfig>,
}

/// One analyzed table of one connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMetadata {
    pub name: String,
    #[serde(default)]
    pub schema: Option<String>,
    pub connection_id: ConnectionId,
    pub details: TableDetails,
}
