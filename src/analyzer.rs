// SPDX-License-Identifier: Apache-2.0

//! Schema analyzer
//!
//! Orchestrates one full analysis of a connection: discover tables, describe
//! them concurrently, infer keys and relationships, and persist the results.
//!
//! Analysis is two-phase. Every table is described before any foreign-key
//! guessing starts, so a guess can target any table of the connection no
//! matter the discovery order. Guessing and persistence then run per table;
//! one failing table never aborts the rest.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use crate::adapter::{DeclaredForeignKey, RawColumn, SchemaAdapter, TableRef};
use crate::error::{MetaError, MetaResult};
use crate::icons::IconCatalog;
use crate::inference::{
    guess, merge, normalize, pluralize, resolve_primary_key, select_display_columns, title_case,
};
use crate::model::{
    ColumnMetadata, ColumnType, ConnectionId, TableDetails, TableMetadata, ViewColumnConfig,
    ViewConfig, ViewKind,
};
use crate::registry::ConnectionRegistry;
use crate::store::MetadataStore;

/// Audit columns hidden from views by default.
const HIDDEN_BY_DEFAULT: [&str; 3] = ["created at", "updated at", "deleted at"];

const TABLE_COLORS: [&str; 8] = [
    "blue", "green", "orange", "purple", "red", "teal", "pink", "yellow",
];

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// How many tables are described at once.
    pub max_concurrent_analyses: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_analyses: 3,
        }
    }
}

/// One table that could not be analyzed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedTable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub error: String,
}

/// Outcome of one connection analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub connection_id: ConnectionId,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub failed_tables: Vec<FailedTable>,
    pub completed_at: DateTime<Utc>,
}

/// Fully described but not yet cross-linked table.
struct DescribedTable {
    table: TableRef,
    columns: Vec<ColumnMetadata>,
    pk: Vec<String>,
    declared_fks: Vec<DeclaredForeignKey>,
}

pub struct Analyzer {
    registry: Arc<ConnectionRegistry>,
    store: Arc<MetadataStore>,
    icons: Arc<dyn IconCatalog>,
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        store: Arc<MetadataStore>,
        icons: Arc<dyn IconCatalog>,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            registry,
            store,
            icons,
            config,
        }
    }

    /// Analyzes every table of one open connection and replaces its stored
    /// metadata. Previously stored tables that no longer exist upstream are
    /// removed.
    #[instrument(skip(self), fields(connection = %connection_id))]
    pub async fn analyze_connection(
        &self,
        connection_id: ConnectionId,
    ) -> MetaResult<AnalysisSummary> {
        let adapter = self.registry.get(connection_id).await?;

        let mut refs = adapter.list_tables().await?;
        refs.sort_by(|a, b| {
            (a.schema.as_deref(), a.name.as_str()).cmp(&(b.schema.as_deref(), b.name.as_str()))
        });
        let total = refs.len();

        // Phase 1: describe everything, bounded.
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_analyses.max(1)));
        let describe_futures = refs.iter().map(|table| {
            let adapter = Arc::clone(&adapter);
            let semaphore = Arc::clone(&semaphore);
            let icons = Arc::clone(&self.icons);
            let table = table.clone();
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|_| (table.clone(), MetaError::internal("analysis cancelled")))?;
                describe_one(adapter.as_ref(), &table, icons.as_ref())
                    .await
                    .map_err(|e| (table, e))
            }
        });
        let results = futures::future::join_all(describe_futures).await;

        let mut described = Vec::new();
        let mut failed_tables = Vec::new();
        for result in results {
            match result {
                Ok(table) => described.push(table),
                Err((table, error)) => {
                    warn!(table = %table.name, error = %error, "table analysis failed");
                    failed_tables.push(FailedTable {
                        name: table.name,
                        schema: table.schema,
                        error: error.to_string(),
                    });
                }
            }
        }

        // Phase 2: cross-link against the full table set.
        let targets: Vec<TableMetadata> = described
            .iter()
            .map(|d| assemble(connection_id, d, &[], self.icons.as_ref()))
            .collect();

        let stale = self.store.clear_tables_for_connection(connection_id).await?;
        if stale > 0 {
            info!(removed = stale, "cleared previously stored tables");
        }

        let mut successful = 0usize;
        for d in &described {
            let guesses = guess(&d.columns, &targets);
            let links = merge(&d.declared_fks, &guesses);
            let table = assemble(connection_id, d, &links, self.icons.as_ref());
            match self.store.save_table(&table).await {
                Ok(()) => successful += 1,
                Err(error) => {
                    warn!(table = %d.table.name, error = %error, "failed to persist table metadata");
                    failed_tables.push(FailedTable {
                        name: d.table.name.clone(),
                        schema: d.table.schema.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }

        let summary = AnalysisSummary {
            connection_id,
            total,
            successful,
            failed: failed_tables.len(),
            failed_tables,
            completed_at: Utc::now(),
        };
        info!(
            total = summary.total,
            successful = summary.successful,
            failed = summary.failed,
            "connection analysis complete"
        );
        Ok(summary)
    }

    /// Re-analyzes a single table, guessing against the stored metadata of
    /// the connection's other tables.
    #[instrument(skip(self), fields(connection = %connection_id, table = name))]
    pub async fn analyze_table(
        &self,
        connection_id: ConnectionId,
        schema: Option<&str>,
        name: &str,
    ) -> MetaResult<TableMetadata> {
        let adapter = self.registry.get(connection_id).await?;
        let table = TableRef {
            schema: schema.map(str::to_string),
            name: name.to_string(),
        };

        let d = describe_one(adapter.as_ref(), &table, self.icons.as_ref()).await?;

        let mut targets: Vec<TableMetadata> = self
            .store
            .tables_for_connection(connection_id)
            .await?
            .into_iter()
            .filter(|t| !(t.name == table.name && t.schema == table.schema))
            .collect();
        targets.push(assemble(connection_id, &d, &[], self.icons.as_ref()));

        let guesses = guess(&d.columns, &targets);
        let links = merge(&d.declared_fks, &guesses);
        let table = assemble(connection_id, &d, &links, self.icons.as_ref());
        self.store.save_table(&table).await?;
        Ok(table)
    }
}

async fn describe_one(
    adapter: &dyn SchemaAdapter,
    table: &TableRef,
    icons: &dyn IconCatalog,
) -> Result<DescribedTable, MetaError> {
    let raw_columns = adapter.describe_table(table).await?;
    let declared_pk = adapter.declared_primary_key(table).await?;
    let declared_fks = adapter.declared_foreign_keys(table).await?;

    let columns: Vec<ColumnMetadata> = raw_columns
        .iter()
        .map(|raw| build_column(raw, icons))
        .collect();
    let pk = if columns.is_empty() {
        Vec::new()
    } else {
        resolve_primary_key(&declared_pk, &columns)
    };

    Ok(DescribedTable {
        table: table.clone(),
        columns,
        pk,
        declared_fks,
    })
}

fn build_column(raw: &RawColumn, icons: &dyn IconCatalog) -> ColumnMetadata {
    let normalized_name = normalize(&raw.name);
    let column_type = ColumnType::classify(&raw.raw_type, raw.is_enum);
    let display_name = title_case(&normalized_name);
    let icon = icons.best_icon_for(&normalized_name);
    let hidden = HIDDEN_BY_DEFAULT.contains(&normalized_name.as_str());

    ColumnMetadata {
        name: raw.name.clone(),
        normalized_name,
        column_type,
        nullable: raw.nullable,
        display_name,
        icon,
        hidden,
        enum_values: raw.enum_values.clone(),
        foreign_key: None,
    }
}

/// Builds the persisted form of one described table, attaching the given
/// foreign-key links. Column declaration order drives view ordering; the
/// column map itself is keyed by name.
fn assemble(
    connection_id: ConnectionId,
    d: &DescribedTable,
    links: &[(String, crate::model::ForeignKeyLink)],
    icons: &dyn IconCatalog,
) -> TableMetadata {
    let normalized_name = normalize(&d.table.name);
    let (display_name, display_name_plural) = display_names(&normalized_name);

    let mut columns = d.columns.clone();
    for (column_name, link) in links {
        if let Some(col) = columns.iter_mut().find(|c| c.name == *column_name) {
            col.foreign_key = Some(link.clone());
        }
    }

    let display_columns = select_display_columns(&columns, &d.pk);
    let views = seed_views(&columns);
    let icon = icons.best_icon_for(&normalized_name);
    let color = pick_color(&normalized_name);

    let column_map: BTreeMap<String, ColumnMetadata> = columns
        .into_iter()
        .map(|c| (c.name.clone(), c))
        .collect();

    TableMetadata {
        name: d.table.name.clone(),
        schema: d.table.schema.clone(),
        connection_id,
        details: TableDetails {
            normalized_name,
            display_name,
            display_name_plural,
            icon,
            color: color.to_string(),
            display_columns,
            pk: d.pk.clone(),
            columns: column_map,
            views,
        },
    }
}

fn display_names(normalized: &str) -> (String, String) {
    let display_name = title_case(normalized);
    let mut tokens: Vec<String> = normalized
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    let plural_phrase = match tokens.pop() {
        Some(last) => {
            tokens.push(pluralize(&last));
            tokens.join(" ")
        }
        None => String::new(),
    };
    (display_name, title_case(&plural_phrase))
}

fn seed_views(columns: &[ColumnMetadata]) -> BTreeMap<ViewKind, ViewConfig> {
    let mut views = BTreeMap::new();
    for kind in ViewKind::ALL {
        let config: ViewConfig = columns
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                (
                    col.name.clone(),
                    ViewColumnConfig {
                        order: idx as i64,
                        hidden: col.hidden,
                    },
                )
            })
            .collect();
        views.insert(kind, config);
    }
    views
}

fn pick_color(normalized: &str) -> &'static str {
    let sum: usize = normalized.bytes().map(|b| b as usize).sum();
    TABLE_COLORS[sum % TABLE_COLORS.len()]
}
