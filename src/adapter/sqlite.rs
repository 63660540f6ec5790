// SPDX-License-Identifier: Apache-2.0

//! SQLite schema adapter
//!
//! SQLite keeps the authoritative schema as the original `CREATE TABLE`
//! text in `sqlite_master`, so columns, primary keys and foreign keys all
//! come from parsing that DDL. A table whose DDL the parser cannot handle
//! degrades to an empty column list with a warning rather than failing the
//! whole analysis.

use async_trait::async_trait;
use sqlparser::ast::{ColumnOption, ObjectName, Statement, TableConstraint};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::warn;

use crate::adapter::{DeclaredForeignKey, RawColumn, SchemaAdapter, TableRef};
use crate::error::{MetaError, MetaResult};
use crate::model::{ConnectionKind, ConnectionParams};

pub struct SqliteAdapter {
    pool: SqlitePool,
}

/// Everything the DDL of one table yields in a single parse.
#[derive(Debug, Default)]
struct ParsedTable {
    columns: Vec<RawColumn>,
    pk: Vec<String>,
    fks: Vec<DeclaredForeignKey>,
}

impl SqliteAdapter {
    pub async fn connect(params: &ConnectionParams) -> MetaResult<Self> {
        let ConnectionParams::File { path } = params else {
            return Err(MetaError::connection_failed(
                "sqlite connections require a file path",
            ));
        };

        if path != ":memory:" && !std::path::Path::new(path).is_file() {
            return Err(MetaError::connection_failed(format!(
                "database file not found: {path}"
            )));
        }

        let conn_str = if path == ":memory:" {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{path}")
        };

        use std::str::FromStr;
        let opts = SqliteConnectOptions::from_str(&conn_str)
            .unwrap_or_else(|_| SqliteConnectOptions::new().filename(path))
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(std::time::Duration::from_secs(10))
            .connect_with(opts)
            .await
            .map_err(|e| MetaError::connection_failed(e.to_string()))?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| MetaError::connection_failed(e.to_string()))?;

        Ok(Self { pool })
    }

    async fn table_ddl(&self, table: &str) -> MetaResult<Option<String>> {
        let row: Option<(Option<String>,)> = sqlx::query_as(
            r#"
            SELECT sql
            FROM sqlite_master
            WHERE type = 'table' AND name = ?
            "#,
        )
        .bind(table)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MetaError::introspection(e.to_string()))?;

        Ok(row.and_then(|(sql,)| sql))
    }

    async fn introspect(&self, table: &TableRef) -> MetaResult<ParsedTable> {
        let Some(ddl) = self.table_ddl(&table.name).await? else {
            return Err(MetaError::introspection(format!(
                "table not found: {}",
                table.name
            )));
        };

        match parse_create_table(&ddl) {
            Ok(parsed) => Ok(parsed),
            Err(err) => {
                warn!(table = %table.name, error = %err, "unparseable table DDL, skipping columns");
                Ok(ParsedTable::default())
            }
        }
    }
}

fn object_name_tail(name: &ObjectName) -> String {
    name.0
        .last()
        .map(|ident| ident.value.clone())
        .unwrap_or_default()
}

fn parse_create_table(ddl: &str) -> Result<ParsedTable, String> {
    let statements =
        Parser::parse_sql(&SQLiteDialect {}, ddl).map_err(|e| e.to_string())?;
    let Some(Statement::CreateTable(ct)) = statements.into_iter().next() else {
        return Err("expected a single CREATE TABLE statement".to_string());
    };

    let mut parsed = ParsedTable::default();

    for col in &ct.columns {
        let name = col.name.value.clone();
        let mut nullable = true;
        let mut default = None;

        for option in &col.options {
            match &option.option {
                ColumnOption::NotNull => nullable = false,
                ColumnOption::Null => nullable = true,
                ColumnOption::Default(expr) => default = Some(expr.to_string()),
                ColumnOption::Unique { is_primary, .. } if *is_primary => {
                    nullable = false;
                    parsed.pk.push(name.clone());
                }
                ColumnOption::ForeignKey {
                    foreign_table,
                    referred_columns,
                    ..
                } => {
                    parsed.fks.push(DeclaredForeignKey {
                        column: name.clone(),
                        target_schema: None,
                        target_table: object_name_tail(foreign_table),
                        // SQLite allows omitting the referenced column,
                        // which then means the target's primary key.
                        target_column: referred_columns
                            .first()
                            .map(|c| c.value.clone())
                            .unwrap_or_else(|| "id".to_string()),
                    });
                }
                _ => {}
            }
        }

        parsed.columns.push(RawColumn {
            name,
            raw_type: col.data_type.to_string(),
            nullable,
            default,
            is_enum: false,
            enum_values: None,
        });
    }

    for constraint in &ct.constraints {
        match constraint {
            TableConstraint::PrimaryKey { columns, .. } => {
                for ident in columns {
                    parsed.pk.push(ident.value.clone());
                }
            }
            TableConstraint::ForeignKey {
                columns,
                foreign_table,
                referred_columns,
                ..
            } => {
                for (idx, ident) in columns.iter().enumerate() {
                    parsed.fks.push(DeclaredForeignKey {
                        column: ident.value.clone(),
                        target_schema: None,
                        target_table: object_name_tail(foreign_table),
                        target_column: referred_columns
                            .get(idx)
                            .map(|c| c.value.clone())
                            .unwrap_or_else(|| "id".to_string()),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(parsed)
}

#[async_trait]
impl SchemaAdapter for SqliteAdapter {
    fn kind(&self) -> ConnectionKind {
        ConnectionKind::Sqlite
    }

    async fn list_tables(&self) -> MetaResult<Vec<TableRef>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT name
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MetaError::introspection(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(name,)| TableRef { schema: None, name })
            .collect())
    }

    async fn describe_table(&self, table: &TableRef) -> MetaResult<Vec<RawColumn>> {
        Ok(self.introspect(table).await?.columns)
    }

    async fn declared_primary_key(&self, table: &TableRef) -> MetaResult<Vec<String>> {
        Ok(self.introspect(table).await?.pk)
    }

    async fn declared_foreign_keys(&self, table: &TableRef) -> MetaResult<Vec<DeclaredForeignKey>> {
        Ok(self.introspect(table).await?.fks)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_columns_keys_and_constraints() {
        let ddl = r#"
            CREATE TABLE posts (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id),
                title TEXT NOT NULL,
                body TEXT,
                published_at TEXT DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )
        "#;
        let parsed = parse_create_table(ddl).expect("parse");

        let names: Vec<&str> = parsed.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "user_id", "title", "body", "published_at"]);
        assert_eq!(parsed.pk, vec!["id"]);
        assert!(!parsed.columns[1].nullable);
        assert!(parsed.columns[3].nullable);
        assert!(parsed.columns[4].default.is_some());

        // Both the inline and the table-level constraint point at users.id
        assert!(parsed
            .fks
            .iter()
            .all(|fk| fk.column == "user_id"
                && fk.target_table == "users"
                && fk.target_column == "id"));
        assert_eq!(parsed.fks.len(), 2);
    }

    #[test]
    fn parses_composite_table_level_primary_key() {
        let ddl = r#"
            CREATE TABLE memberships (
                user_id INTEGER NOT NULL,
                team_id INTEGER NOT NULL,
                PRIMARY KEY (user_id, team_id)
            )
        "#;
        let parsed = parse_create_table(ddl).expect("parse");
        assert_eq!(parsed.pk, vec!["user_id", "team_id"]);
    }

    #[test]
    fn rejects_non_create_table_ddl() {
        assert!(parse_create_table("CREATE INDEX idx ON t(a)").is_err());
        assert!(parse_create_table("not sql at all !!").is_err());
    }
}
