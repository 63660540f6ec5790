// SPDX-License-Identifier: Apache-2.0

//! PostgreSQL schema adapter
//!
//! Introspects through `information_schema` and the `pg_catalog` tables
//! using SQLx. User-defined enum types are resolved to their label lists so
//! downstream classification can treat them as closed vocabularies.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::adapter::{DeclaredForeignKey, RawColumn, SchemaAdapter, TableRef};
use crate::error::{MetaError, MetaResult};
use crate::model::{ConnectionKind, ConnectionParams};

pub struct PostgresAdapter {
    pool: PgPool,
}

impl PostgresAdapter {
    pub async fn connect(params: &ConnectionParams) -> MetaResult<Self> {
        let ConnectionParams::Network {
            host,
            port,
            username,
            password,
            database,
            ssl,
        } = params
        else {
            return Err(MetaError::connection_failed(
                "postgres connections require network parameters",
            ));
        };

        let db = database.as_deref().unwrap_or("postgres");
        let ssl_mode = if *ssl { "require" } else { "disable" };
        let conn_str = format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            username, password, host, port, db, ssl_mode
        );

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(std::time::Duration::from_secs(10))
            .connect(&conn_str)
            .await
            .map_err(|e| MetaError::connection_failed(e.to_string()))?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| MetaError::connection_failed(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Labels of a user-defined enum type, in declared sort order.
    /// Empty when the type is user-defined but not an enum (domain, composite).
    async fn enum_labels(&self, udt_name: &str) -> MetaResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT e.enumlabel::text
            FROM pg_enum e
            JOIN pg_type t ON t.oid = e.enumtypid
            WHERE t.typname = $1
            ORDER BY e.enumsortorder
            "#,
        )
        .bind(udt_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MetaError::introspection(e.to_string()))?;

        Ok(rows.into_iter().map(|(label,)| label).collect())
    }
}

#[async_trait]
impl SchemaAdapter for PostgresAdapter {
    fn kind(&self) -> ConnectionKind {
        ConnectionKind::Postgres
    }

    async fn list_tables(&self) -> MetaResult<Vec<TableRef>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT table_schema::text, table_name::text
            FROM information_schema.tables
            WHERE table_type = 'BASE TABLE'
              AND table_schema NOT IN ('information_schema', 'pg_catalog', 'pg_toast')
            ORDER BY table_schema, table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MetaError::introspection(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(schema, name)| TableRef {
                schema: Some(schema),
                name,
            })
            .collect())
    }

    async fn describe_table(&self, table: &TableRef) -> MetaResult<Vec<RawColumn>> {
        let schema = table.schema.as_deref().unwrap_or("public");

        let column_rows: Vec<(String, String, String, String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT
                column_name::text,
                data_type::text,
                udt_name::text,
                is_nullable::text,
                column_default::text
            FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position
            "#,
        )
        .bind(schema)
        .bind(&table.name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MetaError::introspection(e.to_string()))?;

        let mut columns = Vec::with_capacity(column_rows.len());
        for (name, data_type, udt_name, is_nullable, default) in column_rows {
            let (is_enum, enum_values) = if data_type == "USER-DEFINED" {
                let labels = self.enum_labels(&udt_name).await?;
                if labels.is_empty() {
                    (false, None)
                } else {
                    (true, Some(labels))
                }
            } else {
                (false, None)
            };

            // USER-DEFINED tells classification nothing; the udt name at
            // least distinguishes citext and friends.
            let raw_type = if data_type == "USER-DEFINED" {
                udt_name
            } else {
                data_type
            };

            columns.push(RawColumn {
                name,
                raw_type,
                nullable: is_nullable == "YES",
                default,
                is_enum,
                enum_values,
            });
        }

        Ok(columns)
    }

    async fn declared_primary_key(&self, table: &TableRef) -> MetaResult<Vec<String>> {
        let schema = table.schema.as_deref().unwrap_or("public");

        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT a.attname::text
            FROM pg_index i
            JOIN pg_attribute a ON a.attrelid = i.indrelid AND a.attnum = ANY(i.indkey)
            JOIN pg_class c ON c.oid = i.indrelid
            JOIN pg_namespace n ON n.oid = c.relnamespace
            WHERE i.indisprimary
              AND n.nspname = $1
              AND c.relname = $2
            ORDER BY array_position(i.indkey, a.attnum)
            "#,
        )
        .bind(schema)
        .bind(&table.name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MetaError::introspection(e.to_string()))?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn declared_foreign_keys(&self, table: &TableRef) -> MetaResult<Vec<DeclaredForeignKey>> {
        let schema = table.schema.as_deref().unwrap_or("public");

        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT
                kcu.column_name::text,
                ccu.table_schema::text AS foreign_table_schema,
                ccu.table_name::text AS foreign_table_name,
                ccu.column_name::text AS foreign_column_name
            FROM
                information_schema.table_constraints AS tc
                JOIN information_schema.key_column_usage AS kcu
                  ON tc.constraint_name = kcu.constraint_name
                  AND tc.table_schema = kcu.table_schema
                JOIN information_schema.constraint_column_usage AS ccu
                  ON ccu.constraint_name = tc.constraint_name
                  AND ccu.table_schema = tc.table_schema
            WHERE tc.constraint_type = 'FOREIGN KEY'
                AND tc.table_schema = $1
                AND tc.table_name = $2
            "#,
        )
        .bind(schema)
        .bind(&table.name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MetaError::introspection(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(column, target_schema, target_table, target_column)| DeclaredForeignKey {
                    column,
                    target_schema: Some(target_schema),
                    target_table,
                    target_column,
                },
            )
            .collect())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
