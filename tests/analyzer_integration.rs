// SPDX-License-Identifier: Apache-2.0

//! End-to-end analysis against throwaway SQLite fixture databases.

use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tempfile::TempDir;

use schemalens::icons::KeywordIcons;
use schemalens::{
    AnalyzerConfig, Analyzer, ConnectionId, ConnectionKind, ConnectionParams, ConnectionSettings,
    ConnectionRegistry, MetadataStore, TableMetadata,
};

struct Fixture {
    _dir: TempDir,
    analyzer: Analyzer,
    store: Arc<MetadataStore>,
    registry: Arc<ConnectionRegistry>,
    connection_id: ConnectionId,
}

async fn setup(ddl: &[&str]) -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("fixture.db");

    let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
        .expect("options")
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .expect("create fixture db");
    for statement in ddl {
        sqlx::query(statement).execute(&pool).await.expect("fixture ddl");
    }
    pool.close().await;

    let store = Arc::new(
        MetadataStore::open(&dir.path().join("metadata.db"))
            .await
            .expect("open store"),
    );
    let registry = Arc::new(ConnectionRegistry::new());

    let settings = ConnectionSettings {
        id: ConnectionId::new(),
        name: "fixture".to_string(),
        kind: ConnectionKind::Sqlite,
        params: ConnectionParams::File {
            path: db_path.display().to_string(),
        },
    };
    store.save_connection(&settings).await.expect("save connection");
    registry.open(&settings).await.expect("open connection");

    let analyzer = Analyzer::new(
        Arc::clone(&registry),
        Arc::clone(&store),
        Arc::new(KeywordIcons),
        AnalyzerConfig::default(),
    );

    Fixture {
        _dir: dir,
        analyzer,
        store,
        registry,
        connection_id: settings.id,
    }
}

async fn stored_table(fixture: &Fixture, name: &str) -> TableMetadata {
    fixture
        .store
        .table(fixture.connection_id, None, name)
        .await
        .expect("lookup")
        .unwrap_or_else(|| panic!("table {name} not stored"))
}

#[tokio::test]
async fn guesses_foreign_keys_from_naming() {
    let fixture = setup(&[
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT)",
        "CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER NOT NULL, title TEXT)",
    ])
    .await;

    let summary = fixture
        .analyzer
        .analyze_connection(fixture.connection_id)
        .await
        .expect("analyze");
    assert_eq!(summary.total, 2);
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.failed, 0);

    let posts = stored_table(&fixture, "posts").await;
    let user_id = &posts.details.columns["user_id"];
    let link = user_id.foreign_key.as_ref().expect("guessed link");
    assert_eq!(link.table, "users");
    assert_eq!(link.column, "id");
    assert!(link.is_guessed);
    assert_eq!(link.confidence, Some(1.0));

    // Bare id never links anywhere
    assert!(posts.details.columns["id"].foreign_key.is_none());

    let users = stored_table(&fixture, "users").await;
    assert_eq!(users.details.display_columns, vec!["name"]);
    assert_eq!(users.details.normalized_name, "user");
    assert_eq!(users.details.display_name, "User");
    assert_eq!(users.details.display_name_plural, "Users");
}

#[tokio::test]
async fn declared_constraints_beat_guesses() {
    let fixture = setup(&[
        "CREATE TABLE organizations (id INTEGER PRIMARY KEY, name TEXT)",
        "CREATE TABLE accounts (id INTEGER PRIMARY KEY, org_id INTEGER REFERENCES organizations(id), organization_id INTEGER)",
    ])
    .await;

    fixture
        .analyzer
        .analyze_connection(fixture.connection_id)
        .await
        .expect("analyze");

    let accounts = stored_table(&fixture, "accounts").await;

    let declared = accounts.details.columns["org_id"]
        .foreign_key
        .as_ref()
        .expect("declared link");
    assert!(!declared.is_guessed);
    assert!(declared.confidence.is_none());
    assert_eq!(declared.table, "organizations");

    let guessed = accounts.details.columns["organization_id"]
        .foreign_key
        .as_ref()
        .expect("guessed link");
    assert!(guessed.is_guessed);
    assert_eq!(guessed.table, "organizations");
    assert_eq!(guessed.column, "id");
}

#[tokio::test]
async fn table_without_declared_key_falls_back_to_first_column() {
    let fixture = setup(&[
        "CREATE TABLE widgets (sku TEXT, qty INTEGER)",
    ])
    .await;

    fixture
        .analyzer
        .analyze_connection(fixture.connection_id)
        .await
        .expect("analyze");

    let widgets = stored_table(&fixture, "widgets").await;
    assert_eq!(widgets.details.pk, vec!["sku"]);
    // No readable text column beyond the key itself
    assert_eq!(widgets.details.display_columns, vec!["sku"]);
}

#[tokio::test]
async fn reanalysis_drops_tables_removed_upstream() {
    let fixture = setup(&[
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)",
    ])
    .await;

    // A leftover from an earlier analysis of a table that no longer exists
    let ghost = TableMetadata {
        name: "ghost".to_string(),
        schema: None,
        connection_id: fixture.connection_id,
        details: stored_fixture_details(),
    };
    fixture.store.save_table(&ghost).await.expect("seed ghost");

    fixture
        .analyzer
        .analyze_connection(fixture.connection_id)
        .await
        .expect("analyze");

    let tables = fixture
        .store
        .tables_for_connection(fixture.connection_id)
        .await
        .expect("list");
    let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["users"]);
}

#[tokio::test]
async fn seeds_view_configs_and_hides_audit_columns() {
    let fixture = setup(&[
        "CREATE TABLE articles (id INTEGER PRIMARY KEY, title TEXT, created_at TEXT, updated_at TEXT)",
    ])
    .await;

    fixture
        .analyzer
        .analyze_connection(fixture.connection_id)
        .await
        .expect("analyze");

    let articles = stored_table(&fixture, "articles").await;
    assert_eq!(articles.details.views.len(), 3);
    for view in articles.details.views.values() {
        assert_eq!(view["id"].order, 0);
        assert_eq!(view["title"].order, 1);
        assert!(view["created_at"].hidden);
        assert!(view["updated_at"].hidden);
        assert!(!view["title"].hidden);
    }
    assert!(articles.details.columns["created_at"].hidden);
}

#[tokio::test]
async fn single_table_refresh_links_against_stored_metadata() {
    let fixture = setup(&[
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)",
        "CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER, title TEXT)",
    ])
    .await;

    fixture
        .analyzer
        .analyze_connection(fixture.connection_id)
        .await
        .expect("analyze");

    let refreshed = fixture
        .analyzer
        .analyze_table(fixture.connection_id, None, "posts")
        .await
        .expect("refresh");

    let link = refreshed.details.columns["user_id"]
        .foreign_key
        .as_ref()
        .expect("link survives refresh");
    assert_eq!(link.table, "users");

    let stored = stored_table(&fixture, "posts").await;
    assert!(stored.details.columns["user_id"].foreign_key.is_some());
}

#[tokio::test]
async fn analyzing_a_closed_connection_fails() {
    let fixture = setup(&["CREATE TABLE users (id INTEGER PRIMARY KEY)"]).await;

    fixture
        .registry
        .close(fixture.connection_id)
        .await
        .expect("close");

    let err = fixture
        .analyzer
        .analyze_connection(fixture.connection_id)
        .await
        .unwrap_err();
    assert!(matches!(err, schemalens::MetaError::ConnectionNotFound { .. }));
}

fn stored_fixture_details() -> schemalens::TableDetails {
    schemalens::TableDetails {
        normalized_name: "ghost".to_string(),
        display_name: "Ghost".to_string(),
        display_name_plural: "Ghosts".to_string(),
        icon: "table".to_string(),
        color: "blue".to_string(),
        display_columns: vec![],
        pk: vec![],
        columns: Default::default(),
        views: Default::default(),
    }
}
