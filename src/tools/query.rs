//! Query execution tools.
//!
//! `query` runs caller SQL inside a read-only transaction; writes are refused
//! by the engine, not by inspecting the SQL. `clear_cache` is the one tool
//! that opens a writable transaction.

use crate::db::{QueryExecutor, SchemaInspector};
use crate::error::{DbError, DbResult};
use crate::models::QueryParam;
use crate::tools::format::{OutputFormat, render};
use crate::tools::registry::{parse_args, to_text};
use futures_util::future::BoxFuture;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tracing::info;

/// Input for the query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct QueryInput {
    /// SQL to execute. Runs read-only; use $1, $2, ... (or ?1, ?2, ... on SQLite) for parameters.
    #[schemars(length(min = 1))]
    pub sql: String,
    /// Positional parameter values bound to the placeholders in order
    #[serde(default)]
    pub params: Vec<JsonValue>,
    /// Output format: json (default), table or markdown
    #[serde(default)]
    pub format: OutputFormat,
}

/// Input for the clear_cache tool (no arguments).
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ClearCacheInput {}

pub const QUERY_DESCRIPTION: &str = "Run a read-only SQL query against Steampipe and return the rows.\n\
Steampipe tables are PostgreSQL (foreign) tables named <plugin>_<resource> in one schema per connection; \
use schema_list, table_list and table_show to discover them.\n\
Bind values with positional params instead of splicing them into the SQL.\n\
Integers beyond 2^53-1 are returned as strings.\n\
Output format: json (default), table or markdown.";

pub const CLEAR_CACHE_DESCRIPTION: &str = "Clear Steampipe's query result cache so the next queries fetch fresh data from the providers.";

pub fn query(executor: QueryExecutor, args: JsonValue) -> BoxFuture<'static, DbResult<String>> {
    Box::pin(async move {
        let input: QueryInput = parse_args("query", args)?;
        if input.sql.trim().is_empty() {
            return Err(DbError::validation("query", "sql must not be empty"));
        }

        let params: Vec<QueryParam> = input.params.into_iter().map(QueryParam::from).collect();
        let result = executor.query(&input.sql, &params, false).await?;

        info!(
            row_count = result.row_count,
            execution_time_ms = result.execution_time_ms,
            "Query executed"
        );
        Ok(render(&result, input.format))
    })
}

pub fn clear_cache(executor: QueryExecutor, args: JsonValue) -> BoxFuture<'static, DbResult<String>> {
    Box::pin(async move {
        let _: ClearCacheInput = parse_args("clear_cache", args)?;
        SchemaInspector::new(executor).clear_cache().await?;
        info!("Query cache cleared");
        to_text(&json!({ "cleared": true }))
    })
}
