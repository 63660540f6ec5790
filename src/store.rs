// SPDX-License-Identifier: Apache-2.0

//! Metadata store
//!
//! SQLite file that persists saved connections and analyzed table metadata.
//! Structured fields live in real columns for querying; everything else is
//! a JSON `details` blob so the schema does not chase the model. Rows keep
//! camelCase JSON keys, which older files already contain.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;
use uuid::Uuid;

use crate::error::{MetaError, MetaResult};
use crate::model::{
    ConnectionId, ConnectionKind, ConnectionParams, ConnectionSettings, TableDetails,
    TableMetadata,
};

pub struct MetadataStore {
    pool: SqlitePool,
}

impl MetadataStore {
    /// Opens (and if necessary creates) the store at `path`.
    pub async fn open(path: &Path) -> MetaResult<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MetaError::store(e.to_string()))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .unwrap_or_else(|_| SqliteConnectOptions::new().filename(path))
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .map_err(|e| MetaError::store(e.to_string()))?;

        let store = Self { pool };
        store.migrate().await?;
        info!(path = %path.display(), "metadata store opened");
        Ok(store)
    }

    /// Opens the store at its default per-user location.
    pub async fn open_default() -> MetaResult<Self> {
        let path = Self::default_path()?;
        Self::open(&path).await
    }

    pub fn default_path() -> MetaResult<PathBuf> {
        let base = dirs::data_dir()
            .ok_or_else(|| MetaError::store("no user data directory available"))?;
        Ok(base.join("schemalens").join("metadata.db"))
    }

    async fn migrate(&self) -> MetaResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS connections (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                type TEXT NOT NULL,
                details TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MetaError::store(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tables (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                "schema" TEXT NOT NULL DEFAULT '',
                connectionId TEXT NOT NULL,
                details TEXT NOT NULL,
                UNIQUE(connectionId, "schema", name)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MetaError::store(e.to_string()))?;

        Ok(())
    }

    // ==================== Connections ====================

    /// Inserts or replaces a saved connection.
    pub async fn save_connection(&self, settings: &ConnectionSettings) -> MetaResult<()> {
        let details = serde_json::to_string(&settings.params)
            .map_err(|e| MetaError::serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO connections (id, name, type, details)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                type = excluded.type,
                details = excluded.details
            "#,
        )
        .bind(settings.id.to_string())
        .bind(&settings.name)
        .bind(settings.kind.as_str())
        .bind(details)
        .execute(&self.pool)
        .await
        .map_err(|e| MetaError::store(e.to_string()))?;

        Ok(())
    }

    pub async fn connections(&self) -> MetaResult<Vec<ConnectionSettings>> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            "SELECT id, name, type, details FROM connections ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MetaError::store(e.to_string()))?;

        rows.into_iter().map(Self::connection_from_row).collect()
    }

    pub async fn connection(&self, id: ConnectionId) -> MetaResult<ConnectionSettings> {
        let row: Option<(String, String, String, String)> = sqlx::query_as(
            "SELECT id, name, type, details FROM connections WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MetaError::store(e.to_string()))?;

        match row {
            Some(row) => Self::connection_from_row(row),
            None => Err(MetaError::connection_not_found(id.to_string())),
        }
    }

    /// Deletes a connection and all of its analyzed tables atomically.
    pub async fn delete_connection(&self, id: ConnectionId) -> MetaResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| MetaError::store(e.to_string()))?;

        sqlx::query("DELETE FROM tables WHERE connectionId = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| MetaError::store(e.to_string()))?;

        let result = sqlx::query("DELETE FROM connections WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| MetaError::store(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(MetaError::connection_not_found(id.to_string()));
        }

        tx.commit()
            .await
            .map_err(|e| MetaError::store(e.to_string()))?;
        Ok(())
    }

    fn connection_from_row(
        (id, name, kind, details): (String, String, String, String),
    ) -> MetaResult<ConnectionSettings> {
        let id = Uuid::parse_str(&id)
            .map(ConnectionId)
            .map_err(|e| MetaError::store(format!("corrupt connection id: {e}")))?;
        let kind = ConnectionKind::parse(&kind)
            .ok_or_else(|| MetaError::store(format!("unknown connection type: {kind}")))?;
        let params: ConnectionParams = serde_json::from_str(&details)
            .map_err(|e| MetaError::serialization(e.to_string()))?;
        Ok(ConnectionSettings {
            id,
            name,
            kind,
            params,
        })
    }

    // ==================== Tables ====================

    /// Inserts or updates one table's analyzed metadata.
    pub async fn save_table(&self, table: &TableMetadata) -> MetaResult<()> {
        let details = serde_json::to_string(&table.details)
            .map_err(|e| MetaError::serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO tables (name, "schema", connectionId, details)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(connectionId, "schema", name) DO UPDATE SET
                details = excluded.details
            "#,
        )
        .bind(&table.name)
        .bind(table.schema.as_deref().unwrap_or(""))
        .bind(table.connection_id.to_string())
        .bind(details)
        .execute(&self.pool)
        .await
        .map_err(|e| MetaError::store(e.to_string()))?;

        Ok(())
    }

    pub async fn tables_for_connection(
        &self,
        connection_id: ConnectionId,
    ) -> MetaResult<Vec<TableMetadata>> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT name, "schema", details
            FROM tables
            WHERE connectionId = ?
            ORDER BY "schema", name
            "#,
        )
        .bind(connection_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MetaError::store(e.to_string()))?;

        rows.into_iter()
            .map(|row| Self::table_from_row(connection_id, row))
            .collect()
    }

    pub async fn table(
        &self,
        connection_id: ConnectionId,
        schema: Option<&str>,
        name: &str,
    ) -> MetaResult<Option<TableMetadata>> {
        let row: Option<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT name, "schema", details
            FROM tables
            WHERE connectionId = ? AND "schema" = ? AND name = ?
            "#,
        )
        .bind(connection_id.to_string())
        .bind(schema.unwrap_or(""))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MetaError::store(e.to_string()))?;

        row.map(|row| Self::table_from_row(connection_id, row))
            .transpose()
    }

    /// Removes every analyzed table of one connection. Run before a fresh
    /// analysis so tables dropped upstream do not linger.
    pub async fn clear_tables_for_connection(
        &self,
        connection_id: ConnectionId,
    ) -> MetaResult<u64> {
        let result = sqlx::query("DELETE FROM tables WHERE connectionId = ?")
            .bind(connection_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| MetaError::store(e.to_string()))?;
        Ok(result.rows_affected())
    }

    fn table_from_row(
        connection_id: ConnectionId,
        (name, schema, details): (String, String, String),
    ) -> MetaResult<TableMetadata> {
        let details: TableDetails = serde_json::from_str(&details)
            .map_err(|e| MetaError::serialization(e.to_string()))?;
        Ok(TableMetadata {
            name,
            schema: if schema.is_empty() {
                None
            } else {
                Some(schema)
            },
            connection_id,
            details,
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
