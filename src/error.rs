// SPDX-License-Identifier: Apache-2.0

//! Normalized error types for schema analysis
//!
//! Adapter- and store-specific errors are mapped to these unified error
//! types so callers get consistent failure shapes regardless of which
//! database kind is being analyzed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all analysis operations
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum MetaError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Introspection query failed: {message}")]
    Introspection { message: String },

    #[error("Failed to parse table definition: {message}")]
    SchemaParse { message: String },

    #[error("No open connection with id: {connection_id}")]
    ConnectionNotFound { connection_id: String },

    #[error("Metadata store error: {message}")]
    Store { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Feature not supported: {message}")]
    NotSupported { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl MetaError {
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed { message: msg.into() }
    }

    pub fn introspection(msg: impl Into<String>) -> Self {
        Self::Introspection { message: msg.into() }
    }

    pub fn schema_parse(msg: impl Into<String>) -> Self {
        Self::SchemaParse { message: msg.into() }
    }

    pub fn connection_not_found(id: impl Into<String>) -> Self {
        Self::ConnectionNotFound { connection_id: id.into() }
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store { message: msg.into() }
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization { message: msg.into() }
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported { message: msg.into() }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal { message: msg.into() }
    }
}

/// Result type alias for analysis operations
pub type MetaResult<T> = Result<T, MetaError>;
