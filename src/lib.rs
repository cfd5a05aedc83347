//! Steampipe MCP Server Library
//!
//! This library exposes a Steampipe service (PostgreSQL) or a SQLite database
//! file to AI assistants as a small set of schema-validated MCP tools.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use mcp::SteampipeService;
