// SPDX-License-Identifier: Apache-2.0

//! Schema adapters
//!
//! One adapter per database kind, behind a common trait. Adapters only
//! introspect; they never execute user queries or mutate the target
//! database.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::MetaResult;
use crate::model::{ConnectionKind, ConnectionSettings};

pub mod postgres;
pub mod sqlite;

/// Identifies one table within a connection.
///
/// `schema` is `None` for databases without schema namespaces (SQLite).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

/// A column as the database reports it, before any inference.
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    pub raw_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub is_enum: bool,
    pub enum_values: Option<Vec<String>>,
}

/// A foreign-key constraint declared in the database catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredForeignKey {
    pub column: String,
    pub target_schema: Option<String>,
    pub target_table: String,
    pub target_column: String,
}

/// Read-only schema access for one open connection.
#[async_trait]
pub trait SchemaAdapter: Send + Sync {
    fn kind(&self) -> ConnectionKind;

    /// All user tables, in no particular order. System tables are excluded.
    async fn list_tables(&self) -> MetaResult<Vec<TableRef>>;

    /// Columns of one table in declaration order.
    async fn describe_table(&self, table: &TableRef) -> MetaResult<Vec<RawColumn>>;

    /// Declared primary key columns in constraint ordinal order.
    /// Empty when the table declares no primary key.
    async fn declared_primary_key(&self, table: &TableRef) -> MetaResult<Vec<String>>;

    /// Declared foreign-key constraints of one table.
    async fn declared_foreign_keys(&self, table: &TableRef) -> MetaResult<Vec<DeclaredForeignKey>>;

    /// Releases the underlying pool. The adapter is unusable afterwards.
    async fn close(&self);
}

/// Opens the adapter matching the settings' kind and verifies the
/// connection with a probe query before returning it.
pub async fn open_adapter(settings: &ConnectionSettings) -> MetaResult<Arc<dyn SchemaAdapter>> {
    match settings.kind {
        ConnectionKind::Postgres => {
            let adapter = postgres::PostgresAdapter::connect(&settings.params).await?;
            Ok(Arc::new(adapter))
        }
        ConnectionKind::Sqlite => {
            let adapter = sqlite::SqliteAdapter::connect(&settings.params).await?;
            Ok(Arc::new(adapter))
        }
    }
}
