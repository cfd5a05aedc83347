//! Database access layer.
//!
//! This module provides database access functionality:
//! - Connection resolution (explicit, environment, argument, discovery)
//! - Connection lifecycle and pool management
//! - Transactional query execution
//! - Schema introspection
//! - Type mappings from engine values to JSON

pub mod executor;
pub mod params;
pub mod pool;
pub mod resolver;
pub mod schema;
pub mod types;

pub use executor::QueryExecutor;
pub use pool::{ConnectionManager, DbPool};
pub use resolver::{CONNECTION_ENV_VAR, ConnectionResolver};
pub use schema::{SchemaInspector, quote_ident};
