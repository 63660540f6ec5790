// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use schemalens::model::TableDetails;
use schemalens::{
    ConnectionId, ConnectionKind, ConnectionParams, ConnectionSettings, MetaError, MetadataStore,
    TableMetadata,
};

fn settings(name: &str) -> ConnectionSettings {
    ConnectionSettings {
        id: ConnectionId::new(),
        name: name.to_string(),
        kind: ConnectionKind::Sqlite,
        params: ConnectionParams::File {
            path: "/tmp/fixture.db".to_string(),
        },
    }
}

fn table(connection_id: ConnectionId, name: &str) -> TableMetadata {
    TableMetadata {
        name: name.to_string(),
        schema: None,
        connection_id,
        details: TableDetails {
            normalized_name: name.to_string(),
            display_name: name.to_string(),
            display_name_plural: format!("{name}s"),
            icon: "table".to_string(),
            color: "blue".to_string(),
            display_columns: vec!["name".to_string()],
            pk: vec!["id".to_string()],
            columns: BTreeMap::new(),
            views: BTreeMap::new(),
        },
    }
}

async fn open_store(dir: &tempfile::TempDir) -> MetadataStore {
    MetadataStore::open(&dir.path().join("metadata.db"))
        .await
        .expect("open store")
}

#[tokio::test]
async fn connection_roundtrip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_store(&dir).await;

    let settings = settings("local fixture");
    store.save_connection(&settings).await.expect("save");

    let loaded = store.connection(settings.id).await.expect("load");
    assert_eq!(loaded.id, settings.id);
    assert_eq!(loaded.name, "local fixture");
    assert_eq!(loaded.kind, ConnectionKind::Sqlite);
    assert!(matches!(loaded.params, ConnectionParams::File { .. }));

    let all = store.connections().await.expect("list");
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn saving_a_connection_twice_updates_in_place() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_store(&dir).await;

    let mut settings = settings("before");
    store.save_connection(&settings).await.expect("first save");
    settings.name = "after".to_string();
    store.save_connection(&settings).await.expect("second save");

    let all = store.connections().await.expect("list");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "after");
}

#[tokio::test]
async fn unknown_connection_id_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_store(&dir).await;

    let err = store.connection(ConnectionId::new()).await.unwrap_err();
    assert!(matches!(err, MetaError::ConnectionNotFound { .. }));
}

#[tokio::test]
async fn table_upsert_replaces_instead_of_appending() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_store(&dir).await;
    let connection_id = ConnectionId::new();

    let mut users = table(connection_id, "users");
    store.save_table(&users).await.expect("first save");

    users.details.color = "green".to_string();
    store.save_table(&users).await.expect("second save");

    let tables = store
        .tables_for_connection(connection_id)
        .await
        .expect("list");
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].details.color, "green");
}

#[tokio::test]
async fn tables_are_scoped_to_their_connection() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_store(&dir).await;
    let first = ConnectionId::new();
    let second = ConnectionId::new();

    store.save_table(&table(first, "users")).await.expect("save");
    store.save_table(&table(second, "users")).await.expect("save");

    assert_eq!(store.tables_for_connection(first).await.expect("list").len(), 1);
    assert_eq!(store.tables_for_connection(second).await.expect("list").len(), 1);

    let loaded = store
        .table(first, None, "users")
        .await
        .expect("lookup")
        .expect("present");
    assert_eq!(loaded.connection_id, first);
    assert!(store
        .table(first, None, "missing")
        .await
        .expect("lookup")
        .is_none());
}

#[tokio::test]
async fn deleting_a_connection_removes_its_tables() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_store(&dir).await;

    let settings = settings("doomed");
    store.save_connection(&settings).await.expect("save");
    store
        .save_table(&table(settings.id, "users"))
        .await
        .expect("save table");
    store
        .save_table(&table(settings.id, "posts"))
        .await
        .expect("save table");

    store.delete_connection(settings.id).await.expect("delete");

    assert!(matches!(
        store.connection(settings.id).await,
        Err(MetaError::ConnectionNotFound { .. })
    ));
    assert!(store
        .tables_for_connection(settings.id)
        .await
        .expect("list")
        .is_empty());
}

#[tokio::test]
async fn clear_tables_reports_removed_count() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_store(&dir).await;
    let connection_id = ConnectionId::new();

    store.save_table(&table(connection_id, "a")).await.expect("save");
    store.save_table(&table(connection_id, "b")).await.expect("save");

    let removed = store
        .clear_tables_for_connection(connection_id)
        .await
        .expect("clear");
    assert_eq!(removed, 2);
    assert!(store
        .tables_for_connection(connection_id)
        .await
        .expect("list")
        .is_empty());
}

#[tokio::test]
async fn details_survive_a_store_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let connection_id = ConnectionId::new();

    {
        let store = open_store(&dir).await;
        store.save_table(&table(connection_id, "users")).await.expect("save");
        store.close().await;
    }

    let store = open_store(&dir).await;
    let tables = store
        .tables_for_connection(connection_id)
        .await
        .expect("list");
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].details.display_columns, vec!["name"]);
}
