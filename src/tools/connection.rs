//! Connection management tool.

use crate::db::QueryExecutor;
use crate::error::DbResult;
use crate::tools::registry::{parse_args, to_text};
use futures_util::future::BoxFuture;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::info;

/// Input for the reconnect tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ReconnectInput {
    /// New connection string or SQLite path. Omit to resolve again from the environment,
    /// the startup argument or the running Steampipe service.
    #[serde(default)]
    pub connection_string: Option<String>,
}

pub const RECONNECT_DESCRIPTION: &str = "Drop the current database connection and connect again, \
optionally to a different connection string. Use after restarting the Steampipe service or \
changing its configuration. Returns the new connection status.";

pub fn reconnect(executor: QueryExecutor, args: JsonValue) -> BoxFuture<'static, DbResult<String>> {
    Box::pin(async move {
        let input: ReconnectInput = parse_args("reconnect", args)?;
        let explicit = input
            .connection_string
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let status = executor.manager().reconnect(explicit).await?;
        info!(state = %status.status, "Reconnected");
        to_text(&status)
    })
}
