//! Configuration handling for the Steampipe MCP Server.
//!
//! This module provides configuration management via CLI arguments and environment variables.
//! The connection string itself is resolved separately (see `db::resolver`), because the
//! `STEAMPIPE_MCP_CONNECTION_STRING` environment variable outranks the positional argument.

use crate::models::{DEFAULT_QUERY_TIMEOUT_SECS, DatabaseType};
use clap::Parser;
use std::time::Duration;

pub const DEFAULT_STEAMPIPE_BIN: &str = "steampipe";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DISCOVERY_TIMEOUT_SECS: u64 = 15;

// Pool configuration defaults
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_MAX_CONNECTIONS_SQLITE: u32 = 1;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 30;

/// Arguments passed to the Steampipe CLI to discover the running service.
pub const DISCOVERY_ARGS: &[&str] = &["service", "status", "--output", "json"];

/// Connection pool settings shared by every pool the manager opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    /// Overrides the per-backend default (10 for PostgreSQL, 1 for SQLite)
    pub max_connections: Option<u32>,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    /// Server-side statement timeout, also used as the client-side bound
    pub statement_timeout: Duration,
}

impl PoolSettings {
    /// Get max_connections with default value based on database type.
    pub fn max_connections_for(&self, db_type: DatabaseType) -> u32 {
        self.max_connections
            .filter(|max| *max > 0)
            .unwrap_or(match db_type {
                DatabaseType::SQLite => DEFAULT_MAX_CONNECTIONS_SQLITE,
                DatabaseType::PostgreSQL => DEFAULT_MAX_CONNECTIONS,
            })
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: None,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            statement_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        }
    }
}

/// Configuration for the Steampipe MCP Server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "steampipe-mcp-server",
    about = "MCP server exposing Steampipe (or a SQLite file) as schema-validated SQL tools",
    version,
    author
)]
pub struct Config {
    /// Connection string (postgres://...) or SQLite database path.
    /// STEAMPIPE_MCP_CONNECTION_STRING takes precedence; when neither is set the
    /// running Steampipe service is discovered through the CLI.
    #[arg(value_name = "CONNECTION")]
    pub connection: Option<String>,

    /// Steampipe CLI executable used for discovery and plugin details
    #[arg(long, default_value = DEFAULT_STEAMPIPE_BIN, env = "MCP_STEAMPIPE_BIN")]
    pub steampipe_bin: String,

    /// Full discovery command line, replacing `<steampipe-bin> service status --output json`
    #[arg(long, value_name = "COMMAND", env = "MCP_DISCOVERY_COMMAND")]
    pub discovery_command: Option<String>,

    /// Statement timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_QUERY_TIMEOUT_SECS,
        env = "MCP_QUERY_TIMEOUT"
    )]
    pub query_timeout: u64,

    /// Connection timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS,
        env = "MCP_CONNECT_TIMEOUT"
    )]
    pub connect_timeout: u64,

    /// Idle timeout for pooled connections in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_IDLE_TIMEOUT_SECS,
        env = "MCP_IDLE_TIMEOUT"
    )]
    pub idle_timeout: u64,

    /// Maximum pooled connections (default: 10 for PostgreSQL, 1 for SQLite)
    #[arg(long, env = "MCP_MAX_CONNECTIONS")]
    pub max_connections: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,

    /// Enable logging output (disabled by default to avoid interfering with stdio transport)
    #[arg(long, env = "MCP_ENABLE_LOGS")]
    pub enable_logs: bool,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            connection: None,
            steampipe_bin: DEFAULT_STEAMPIPE_BIN.to_string(),
            discovery_command: None,
            query_timeout: DEFAULT_QUERY_TIMEOUT_SECS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT_SECS,
            idle_timeout: DEFAULT_IDLE_TIMEOUT_SECS,
            max_connections: None,
            log_level: "info".to_string(),
            json_logs: false,
            enable_logs: false,
        }
    }

    /// Get the query timeout as a Duration.
    pub fn query_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.query_timeout)
    }

    /// Pool settings derived from the CLI flags.
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.max_connections,
            connect_timeout: Duration::from_secs(self.connect_timeout),
            idle_timeout: Duration::from_secs(self.idle_timeout),
            statement_timeout: self.query_timeout_duration(),
        }
    }

    /// Program and arguments of the discovery command.
    pub fn discovery_command_line(&self) -> (String, Vec<String>) {
        if let Some(command) = self
            .discovery_command
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            let mut parts = command.split_whitespace().map(String::from);
            if let Some(program) = parts.next() {
                return (program, parts.collect());
            }
        }
        (
            self.steampipe_bin.clone(),
            DISCOVERY_ARGS.iter().map(|s| s.to_string()).collect(),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
