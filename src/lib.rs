// SPDX-License-Identifier: Apache-2.0

//! SchemaLens - schema introspection and relationship inference
//!
//! Connects to PostgreSQL and SQLite databases, introspects their schemas,
//! infers primary keys, foreign keys and display metadata from naming
//! conventions, and caches the results in a local SQLite metadata store.

pub mod adapter;
pub mod analyzer;
pub mod error;
pub mod icons;
pub mod inference;
pub mod model;
pub mod observability;
pub mod registry;
pub mod store;

pub use analyzer::{AnalysisSummary, Analyzer, AnalyzerConfig, FailedTable};
pub use error::{MetaError, MetaResult};
pub use model::{
    ColumnMetadata, ColumnType, ConnectionId, ConnectionKind, ConnectionParams,
    ConnectionSettings, ForeignKeyLink, TableDetails, TableMetadata,
};
pub use registry::ConnectionRegistry;
pub use store::MetadataStore;
