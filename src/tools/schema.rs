//! Schema introspection tools.
//!
//! This module implements `schema_list`, `table_list` and `table_show`.

use crate::db::{QueryExecutor, SchemaInspector};
use crate::error::DbResult;
use crate::models::{SchemaEntry, TableDetail, TableSummary};
use crate::tools::registry::{parse_args, to_text};
use futures_util::future::BoxFuture;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::info;

/// Input for the schema_list tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SchemaListInput {
    /// Case-insensitive filter on the schema name; a bare word matches anywhere, or use % wildcards
    #[serde(default)]
    pub filter: Option<String>,
}

/// Input for the table_list tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TableListInput {
    /// Schema to list tables from (for Steampipe, the connection name, e.g. "aws")
    #[schemars(length(min = 1))]
    pub schema: String,
    /// Filter on the table name; a bare word matches anywhere, or use % wildcards
    #[serde(default)]
    pub filter: Option<String>,
}

/// Input for the table_show tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TableShowInput {
    /// Table name, optionally schema-qualified (aws.aws_s3_bucket)
    #[schemars(length(min = 1))]
    pub name: String,
    /// Schema to look in. Without it the default schema wins, then other schemas alphabetically
    #[serde(default)]
    pub schema: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SchemaListOutput {
    pub schemas: Vec<SchemaEntry>,
}

#[derive(Debug, Serialize)]
pub struct TableListOutput {
    pub schema: String,
    pub tables: Vec<TableSummary>,
}

#[derive(Debug, Serialize)]
pub struct TableShowOutput {
    pub table: TableDetail,
}

pub const SCHEMA_LIST_DESCRIPTION: &str = "List schemas. On Steampipe each plugin connection is a schema; \
entries show the plugin, connection, type (connection or aggregator) and state.";

pub const TABLE_LIST_DESCRIPTION: &str =
    "List the tables in a schema, with their descriptions. Optionally filter by name.";

pub const TABLE_SHOW_DESCRIPTION: &str = "Show a table's columns in ordinal order: name, type, nullability, default and description.";

/// Empty filters mean no filter.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn schema_list(executor: QueryExecutor, args: JsonValue) -> BoxFuture<'static, DbResult<String>> {
    Box::pin(async move {
        let input: SchemaListInput = parse_args("schema_list", args)?;
        let schemas = SchemaInspector::new(executor)
            .list_schemas(non_empty(input.filter).as_deref())
            .await?;
        info!(count = schemas.len(), "Schemas listed");
        to_text(&SchemaListOutput { schemas })
    })
}

pub fn table_list(executor: QueryExecutor, args: JsonValue) -> BoxFuture<'static, DbResult<String>> {
    Box::pin(async move {
        let input: TableListInput = parse_args("table_list", args)?;
        let schema = input.schema.trim().to_string();
        let tables = SchemaInspector::new(executor)
            .list_tables(&schema, non_empty(input.filter).as_deref())
            .await?;
        info!(schema = %schema, count = tables.len(), "Tables listed");
        to_text(&TableListOutput { schema, tables })
    })
}

pub fn table_show(executor: QueryExecutor, args: JsonValue) -> BoxFuture<'static, DbResult<String>> {
    Box::pin(async move {
        let input: TableShowInput = parse_args("table_show", args)?;
        let schema = non_empty(input.schema);
        let table = SchemaInspector::new(executor)
            .show_table(input.name.trim(), schema.as_deref().map(str::trim))
            .await?;
        info!(schema = %table.schema, table = %table.name, "Table described");
        to_text(&TableShowOutput { table })
    })
}
