//! Connection string resolution.
//!
//! The first non-empty source wins:
//! 1. an explicit string passed by the caller (the `reconnect` tool),
//! 2. `STEAMPIPE_MCP_CONNECTION_STRING`,
//! 3. the positional process argument,
//! 4. the connection string reported by `steampipe service status --output json`.

use crate::cli::PlatformCli;
use crate::config::{Config, DEFAULT_DISCOVERY_TIMEOUT_SECS};
use crate::error::{DbError, DbResult};
use crate::models::{ConnectionDescriptor, DatabaseType, SourceType};
use serde_json::Value as JsonValue;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable holding a connection string.
pub const CONNECTION_ENV_VAR: &str = "STEAMPIPE_MCP_CONNECTION_STRING";

/// Keys searched for in the discovery command output, in order of preference.
const DISCOVERY_KEYS: &[&str] = &["connection_string", "database_url", "database_filepath"];

#[derive(Debug, Clone)]
pub struct ConnectionResolver {
    env_value: Option<String>,
    cli_arg: Option<String>,
    discovery: PlatformCli,
    discovery_args: Vec<String>,
}

impl ConnectionResolver {
    pub fn new(
        env_value: Option<String>,
        cli_arg: Option<String>,
        discovery: PlatformCli,
        discovery_args: Vec<String>,
    ) -> Self {
        Self {
            env_value,
            cli_arg,
            discovery,
            discovery_args,
        }
    }

    /// Build a resolver from the parsed configuration and the process environment.
    pub fn from_config(config: &Config) -> Self {
        let (program, args) = config.discovery_command_line();
        Self::new(
            std::env::var(CONNECTION_ENV_VAR).ok(),
            config.connection.clone(),
            PlatformCli::new(program, Duration::from_secs(DEFAULT_DISCOVERY_TIMEOUT_SECS)),
            args,
        )
    }

    /// Produce a descriptor from the highest-priority source that has a value.
    pub async fn resolve(&self, explicit: Option<&str>) -> DbResult<ConnectionDescriptor> {
        let descriptor = match self.configured(explicit) {
            Some(descriptor) => descriptor,
            None => self.discover().await?,
        };
        let descriptor = validate(descriptor)?;

        info!(
            source = %descriptor.source(),
            connection = %descriptor.redacted(),
            tls_mode = ?descriptor.tls_mode(),
            "Resolved connection"
        );
        Ok(descriptor)
    }

    /// Tiers that need no subprocess.
    fn configured(&self, explicit: Option<&str>) -> Option<ConnectionDescriptor> {
        [
            (explicit, SourceType::Explicit),
            (self.env_value.as_deref(), SourceType::Env),
            (self.cli_arg.as_deref(), SourceType::CliArg),
        ]
        .into_iter()
        .find_map(|(value, source)| {
            non_empty(value).map(|v| ConnectionDescriptor::new(v, source))
        })
    }

    async fn discover(&self) -> DbResult<ConnectionDescriptor> {
        debug!(program = %self.discovery.program(), "No connection configured, running discovery");

        let output = self
            .discovery
            .run_json(&self.discovery_args)
            .await
            .map_err(|e| DbError::resolution(format!("discovery failed: {}", e)))?;

        let address = parse_discovery_output(&output).ok_or_else(|| {
            DbError::resolution(format!(
                "'{}' output has none of the fields {}",
                self.discovery.program(),
                DISCOVERY_KEYS.join(", ")
            ))
        })?;

        Ok(ConnectionDescriptor::new(
            address,
            SourceType::PlatformDefault,
        ))
    }
}

/// Search discovery output depth-first for a connection string or database path.
pub fn parse_discovery_output(value: &JsonValue) -> Option<String> {
    for key in DISCOVERY_KEYS {
        if let Some(found) = find_key(value, key) {
            return Some(found);
        }
    }
    None
}

fn find_key(value: &JsonValue, key: &str) -> Option<String> {
    match value {
        JsonValue::Object(map) => {
            if let Some(found) = map.get(key).and_then(JsonValue::as_str).and_then(|s| non_empty(Some(s))) {
                return Some(found.to_string());
            }
            map.values().find_map(|v| find_key(v, key))
        }
        JsonValue::Array(items) => items.iter().find_map(|v| find_key(v, key)),
        _ => None,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn validate(descriptor: ConnectionDescriptor) -> DbResult<ConnectionDescriptor> {
    match descriptor.backend() {
        Some(DatabaseType::SQLite) => {
            if let Some(path) = descriptor.file_path() {
                if !Path::new(path).exists() {
                    return Err(DbError::resolution(format!(
                        "database file '{}' does not exist",
                        path
                    )));
                }
            }
        }
        Some(DatabaseType::PostgreSQL) => {}
        None if descriptor.address().contains("://") => {
            return Err(DbError::resolution(format!(
                "unsupported connection string '{}': expected postgres:// or a SQLite database path",
                descriptor.redacted()
            )));
        }
        None => {}
    }
    Ok(descriptor)
}
