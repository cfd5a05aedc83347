//! Data models for the Steampipe MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod query;
pub mod schema;

// Re-export commonly used types
pub use connection::{
    ConnectionDescriptor, ConnectionState, ConnectionStatus, DatabaseType, SourceType, TlsMode,
};
pub use query::{DEFAULT_QUERY_TIMEOUT_SECS, MAX_SAFE_INTEGER, QueryParam, QueryResult, Row};
pub use schema::{
    ColumnDetail, PluginEntry, SchemaEntry, SchemaType, TableDetail, TableSummary,
};
