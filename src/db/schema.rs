//! Schema introspection module.
//!
//! Catalog lookups for the Steampipe service (PostgreSQL) and for file-backed
//! SQLite databases. Every lookup goes through the [`QueryExecutor`], so it
//! runs inside a read-only transaction on a single leased connection like any
//! other statement.
//!
//! # Architecture
//!
//! SQL queries are organized in the `queries` submodule with constants for each
//! database type. Values are always bound as parameters; the only identifiers
//! spliced into SQL text are attached SQLite schema names, and those pass
//! through [`quote_ident`].

use crate::db::executor::QueryExecutor;
use crate::error::{DbError, DbResult};
use crate::models::{
    ColumnDetail, DatabaseType, PluginEntry, QueryParam, Row, SchemaEntry, SchemaType,
    TableDetail, TableSummary,
};
use serde_json::Value as JsonValue;
use tracing::debug;

/// Catalog queries over the manager's current connection.
#[derive(Debug, Clone)]
pub struct SchemaInspector {
    executor: QueryExecutor,
}

impl SchemaInspector {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    async fn backend(&self) -> DbResult<DatabaseType> {
        self.executor.manager().connected_backend().await
    }

    /// List schemas, annotated with their plugin connection where one exists.
    pub async fn list_schemas(&self, filter: Option<&str>) -> DbResult<Vec<SchemaEntry>> {
        let pattern = like_pattern(filter);
        let rows = match self.backend().await? {
            DatabaseType::PostgreSQL => {
                let present = self
                    .executor
                    .execute(queries::postgres::HAS_CONNECTION_TABLE, &[], false)
                    .await?;
                let sql = if present.first().is_some_and(|row| flag(row, "present")) {
                    queries::postgres::LIST_CONNECTION_SCHEMAS
                } else {
                    queries::postgres::LIST_SCHEMAS
                };
                self.executor.execute(sql, &[pattern], false).await?
            }
            DatabaseType::SQLite => {
                self.executor
                    .execute(queries::sqlite::LIST_SCHEMAS, &[pattern], false)
                    .await?
            }
        };

        let schemas: Vec<SchemaEntry> = rows.iter().filter_map(schema_entry).collect();
        debug!(count = schemas.len(), "Listed schemas");
        Ok(schemas)
    }

    /// List the tables of `schema`, optionally filtered by a LIKE pattern.
    pub async fn list_tables(
        &self,
        schema: &str,
        filter: Option<&str>,
    ) -> DbResult<Vec<TableSummary>> {
        let backend = self.backend().await?;
        if !self.schema_exists(backend, schema).await? {
            return Err(DbError::schema_not_found(schema));
        }

        let pattern = like_pattern(filter);
        let rows = match backend {
            DatabaseType::PostgreSQL => {
                let params = [QueryParam::String(schema.to_string()), pattern];
                self.executor
                    .execute(queries::postgres::LIST_TABLES, &params, false)
                    .await?
            }
            DatabaseType::SQLite => {
                let sql = queries::sqlite::list_tables(schema);
                self.executor.execute(&sql, &[pattern], false).await?
            }
        };

        let tables: Vec<TableSummary> = rows
            .iter()
            .filter_map(|row| {
                Some(TableSummary {
                    name: text(row, "name")?,
                    description: text(row, "description").filter(|d| !d.is_empty()),
                })
            })
            .collect();
        debug!(schema = %schema, count = tables.len(), "Listed tables");
        Ok(tables)
    }

    /// Describe one table.
    ///
    /// Without an explicit schema, a qualified `schema.table` name is split;
    /// otherwise every schema holding the table is ranked and the first wins.
    pub async fn show_table(&self, name: &str, schema: Option<&str>) -> DbResult<TableDetail> {
        let (schema, name) = match schema {
            Some(schema) => (Some(schema), name),
            None => split_qualified_name(name),
        };
        let backend = self.backend().await?;

        if let Some(schema) = schema {
            if !self.schema_exists(backend, schema).await? {
                return Err(DbError::schema_not_found(schema));
            }
        }

        let candidates = self.schemas_containing(backend, name).await?;
        let resolved = match schema {
            Some(schema) => candidates.into_iter().find(|s| s == schema),
            None => rank_schemas(candidates, backend).into_iter().next(),
        };
        let Some(resolved) = resolved else {
            return Err(DbError::table_not_found(name, schema));
        };

        let columns = self.fetch_columns(backend, &resolved, name).await?;
        debug!(schema = %resolved, table = %name, columns = columns.len(), "Described table");
        Ok(TableDetail {
            schema: resolved,
            name: name.to_string(),
            columns,
        })
    }

    /// Installed plugins and their versions.
    ///
    /// File-backed databases have no plugins and yield an empty list.
    pub async fn list_plugins(&self) -> DbResult<Vec<PluginEntry>> {
        match self.backend().await? {
            DatabaseType::PostgreSQL => {
                let rows = self
                    .executor
                    .execute(queries::postgres::LIST_PLUGINS, &[], false)
                    .await?;
                Ok(rows
                    .iter()
                    .filter_map(|row| {
                        Some(PluginEntry {
                            plugin: text(row, "plugin")?,
                            version: text(row, "version"),
                        })
                    })
                    .collect())
            }
            DatabaseType::SQLite => Ok(Vec::new()),
        }
    }

    /// Drop the service's cached query results.
    pub async fn clear_cache(&self) -> DbResult<()> {
        match self.backend().await? {
            DatabaseType::PostgreSQL => {
                self.executor
                    .execute(queries::postgres::CLEAR_CACHE, &[], true)
                    .await?;
                debug!("Cleared query cache");
                Ok(())
            }
            DatabaseType::SQLite => Err(DbError::database(
                "cache clearing needs a Steampipe service connection",
                None,
                "Reconnect to a Steampipe service and retry",
            )),
        }
    }

    async fn schema_exists(&self, backend: DatabaseType, schema: &str) -> DbResult<bool> {
        let sql = match backend {
            DatabaseType::PostgreSQL => queries::postgres::SCHEMA_EXISTS,
            DatabaseType::SQLite => queries::sqlite::SCHEMA_EXISTS,
        };
        let rows = self
            .executor
            .execute(sql, &[QueryParam::String(schema.to_string())], false)
            .await?;
        Ok(!rows.is_empty())
    }

    /// Every schema holding a table or view called `name`, unordered.
    async fn schemas_containing(&self, backend: DatabaseType, name: &str) -> DbResult<Vec<String>> {
        let param = [QueryParam::String(name.to_string())];
        match backend {
            DatabaseType::PostgreSQL => {
                let rows = self
                    .executor
                    .execute(queries::postgres::SCHEMAS_WITH_TABLE, &param, false)
                    .await?;
                Ok(rows.iter().filter_map(|row| text(row, "schema")).collect())
            }
            DatabaseType::SQLite => {
                // Attached databases each carry their own sqlite_master
                let attached = self
                    .executor
                    .execute(queries::sqlite::LIST_SCHEMAS, &[QueryParam::Null], false)
                    .await?;
                let mut found = Vec::new();
                for schema in attached.iter().filter_map(|row| text(row, "schema")) {
                    let sql = queries::sqlite::table_exists(&schema);
                    if !self.executor.execute(&sql, &param, false).await?.is_empty() {
                        found.push(schema);
                    }
                }
                Ok(found)
            }
        }
    }

    async fn fetch_columns(
        &self,
        backend: DatabaseType,
        schema: &str,
        table: &str,
    ) -> DbResult<Vec<ColumnDetail>> {
        let params = [
            QueryParam::String(schema.to_string()),
            QueryParam::String(table.to_string()),
        ];
        let sql = match backend {
            DatabaseType::PostgreSQL => queries::postgres::DESCRIBE_COLUMNS,
            DatabaseType::SQLite => queries::sqlite::DESCRIBE_COLUMNS,
        };
        let rows = self.executor.execute(sql, &params, false).await?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let name = text(row, "name")?;
                let data_type = text(row, "type").unwrap_or_default();
                Some(
                    ColumnDetail::new(name, data_type, flag(row, "nullable"))
                        .with_default(text(row, "default_value"))
                        .with_description(text(row, "description")),
                )
            })
            .collect())
    }
}

/// Quote an identifier for inclusion in SQL text.
///
/// Wraps in double quotes and doubles any embedded double quote.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Split `schema.table` into its parts. Names without a dot, or with an empty
/// side, are returned whole.
pub fn split_qualified_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once('.') {
        Some((schema, table)) if !schema.is_empty() && !table.is_empty() => (Some(schema), table),
        _ => (None, name),
    }
}

/// Catalog and internal schemas, searched last.
pub fn is_system_schema(schema: &str, backend: DatabaseType) -> bool {
    match backend {
        DatabaseType::PostgreSQL => {
            schema == "information_schema"
                || schema.starts_with("pg_")
                || schema.starts_with("steampipe_")
        }
        DatabaseType::SQLite => schema == "temp",
    }
}

/// Order schemas for an unqualified table lookup: the backend's default
/// schema, then other schemas alphabetically, then system schemas
/// alphabetically.
pub fn rank_schemas(mut schemas: Vec<String>, backend: DatabaseType) -> Vec<String> {
    let tier = |schema: &str| {
        if schema == backend.default_schema() {
            0
        } else if is_system_schema(schema, backend) {
            2
        } else {
            1
        }
    };
    schemas.sort_by(|a, b| tier(a).cmp(&tier(b)).then_with(|| a.cmp(b)));
    schemas.dedup();
    schemas
}

/// Turn a user filter into a LIKE pattern; bare words match as substrings.
fn like_pattern(filter: Option<&str>) -> QueryParam {
    match filter.map(str::trim).filter(|f| !f.is_empty()) {
        None => QueryParam::Null,
        Some(f) if f.contains('%') => QueryParam::String(f.to_string()),
        Some(f) => QueryParam::String(format!("%{}%", f)),
    }
}

fn schema_entry(row: &Row) -> Option<SchemaEntry> {
    let entry = SchemaEntry::new(text(row, "schema")?);
    let Some(connection) = text(row, "connection") else {
        return Some(entry);
    };
    let schema_type = match text(row, "type").as_deref() {
        Some("aggregator") => SchemaType::Aggregator,
        _ => SchemaType::Connection,
    };
    Some(
        entry
            .with_connection(text(row, "plugin"), connection, schema_type)
            .with_state(text(row, "state")),
    )
}

fn text(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn flag(row: &Row, column: &str) -> bool {
    match row.get(column) {
        Some(JsonValue::Bool(b)) => *b,
        Some(JsonValue::Number(n)) => n.as_i64().is_some_and(|v| v != 0),
        _ => false,
    }
}

// =============================================================================
// SQL Query Templates
// =============================================================================

mod queries {
    pub mod postgres {
        pub const HAS_CONNECTION_TABLE: &str = r#"
            SELECT to_regclass('steampipe_internal.steampipe_connection') IS NOT NULL AS present
            "#;

        pub const LIST_CONNECTION_SCHEMAS: &str = r#"
            SELECT
                n.nspname::text AS schema,
                c.plugin::text AS plugin,
                c.name::text AS connection,
                c.type::text AS type,
                c.state::text AS state
            FROM pg_catalog.pg_namespace n
            LEFT JOIN steampipe_internal.steampipe_connection c ON c.name = n.nspname::text
            WHERE n.nspname !~ '^(pg_|steampipe_)'
            AND n.nspname <> 'information_schema'
            AND ($1::text IS NULL OR n.nspname::text ILIKE $1)
            ORDER BY n.nspname
            "#;

        pub const LIST_SCHEMAS: &str = r#"
            SELECT n.nspname::text AS schema
            FROM pg_catalog.pg_namespace n
            WHERE n.nspname !~ '^(pg_|steampipe_)'
            AND n.nspname <> 'information_schema'
            AND ($1::text IS NULL OR n.nspname::text ILIKE $1)
            ORDER BY n.nspname
            "#;

        pub const SCHEMA_EXISTS: &str = r#"
            SELECT 1 AS found FROM pg_catalog.pg_namespace WHERE nspname::text = $1
            "#;

        // r: table, p: partitioned table, f: foreign table
        pub const LIST_TABLES: &str = r#"
            SELECT
                c.relname::text AS name,
                obj_description(c.oid, 'pg_class') AS description
            FROM pg_catalog.pg_class c
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            WHERE n.nspname::text = $1
            AND c.relkind IN ('r', 'p', 'f')
            AND ($2::text IS NULL OR c.relname::text ILIKE $2)
            ORDER BY c.relname
            "#;

        pub const SCHEMAS_WITH_TABLE: &str = r#"
            SELECT n.nspname::text AS schema
            FROM pg_catalog.pg_class c
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            WHERE c.relname::text = $1
            AND c.relkind IN ('r', 'p', 'f', 'v', 'm')
            "#;

        pub const DESCRIBE_COLUMNS: &str = r#"
            SELECT
                a.attname::text AS name,
                format_type(a.atttypid, a.atttypmod) AS type,
                NOT a.attnotnull AS nullable,
                pg_get_expr(d.adbin, d.adrelid) AS default_value,
                col_description(c.oid, a.attnum) AS description
            FROM pg_catalog.pg_attribute a
            JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
            JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
            LEFT JOIN pg_catalog.pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
            WHERE n.nspname::text = $1
            AND c.relname::text = $2
            AND a.attnum > 0
            AND NOT a.attisdropped
            ORDER BY a.attnum
            "#;

        pub const LIST_PLUGINS: &str = r#"
            SELECT plugin::text AS plugin, version::text AS version
            FROM steampipe_internal.steampipe_plugin
            ORDER BY plugin
            "#;

        pub const CLEAR_CACHE: &str = "SELECT FROM steampipe_internal.meta_cache('clear')";
    }

    pub mod sqlite {
        use super::super::quote_ident;

        pub const LIST_SCHEMAS: &str = r#"
            SELECT name AS schema
            FROM pragma_database_list
            WHERE (?1 IS NULL OR name LIKE ?1)
            ORDER BY seq
            "#;

        pub const SCHEMA_EXISTS: &str =
            "SELECT 1 AS found FROM pragma_database_list WHERE name = ?1";

        pub const DESCRIBE_COLUMNS: &str = r#"
            SELECT
                name,
                type,
                "notnull" = 0 AS nullable,
                dflt_value AS default_value,
                NULL AS description
            FROM pragma_table_info(?2, ?1)
            ORDER BY cid
            "#;

        pub fn list_tables(schema: &str) -> String {
            format!(
                r#"
                SELECT name, NULL AS description
                FROM {}.sqlite_master
                WHERE type = 'table'
                AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
                AND (?1 IS NULL OR name LIKE ?1)
                ORDER BY name
                "#,
                quote_ident(schema)
            )
        }

        pub fn table_exists(schema: &str) -> String {
            format!(
                "SELECT 1 AS found FROM {}.sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
                quote_ident(schema)
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("aws"), "\"aws\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_ident(""), "\"\"");
    }

    #[test]
    fn test_split_qualified_name() {
        assert_eq!(
            split_qualified_name("aws.aws_account"),
            (Some("aws"), "aws_account")
        );
        assert_eq!(split_qualified_name("aws_account"), (None, "aws_account"));
        assert_eq!(split_qualified_name(".aws_account"), (None, ".aws_account"));
        assert_eq!(split_qualified_name("aws."), (None, "aws."));
    }

    #[test]
    fn test_rank_schemas_postgres() {
        let ranked = rank_schemas(
            vec![
                "information_schema".into(),
                "zendesk".into(),
                "public".into(),
                "aws".into(),
                "pg_catalog".into(),
            ],
            DatabaseType::PostgreSQL,
        );
        assert_eq!(
            ranked,
            vec!["public", "aws", "zendesk", "information_schema", "pg_catalog"]
        );
    }

    #[test]
    fn test_rank_schemas_sqlite() {
        let ranked = rank_schemas(
            vec!["temp".into(), "other".into(), "main".into()],
            DatabaseType::SQLite,
        );
        assert_eq!(ranked, vec!["main", "other", "temp"]);
    }

    #[test]
    fn test_system_schemas() {
        assert!(is_system_schema("pg_toast", DatabaseType::PostgreSQL));
        assert!(is_system_schema("steampipe_internal", DatabaseType::PostgreSQL));
        assert!(!is_system_schema("aws", DatabaseType::PostgreSQL));
        assert!(!is_system_schema("main", DatabaseType::SQLite));
    }

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern(None), QueryParam::Null);
        assert_eq!(like_pattern(Some("  ")), QueryParam::Null);
        assert_eq!(
            like_pattern(Some("s3")),
            QueryParam::String("%s3%".into())
        );
        assert_eq!(
            like_pattern(Some("aws_%")),
            QueryParam::String("aws_%".into())
        );
    }

    #[test]
    fn test_schema_entry_from_rows() {
        let row = |v: JsonValue| v.as_object().cloned().unwrap();

        let plain = schema_entry(&row(json!({"schema": "public", "connection": null}))).unwrap();
        assert_eq!(plain.schema_type, SchemaType::Schema);
        assert!(plain.connection.is_none());

        let aggregator = schema_entry(&row(json!({
            "schema": "aws_all",
            "plugin": "hub.steampipe.io/plugins/turbot/aws@latest",
            "connection": "aws_all",
            "type": "aggregator",
            "state": "ready"
        })))
        .unwrap();
        assert_eq!(aggregator.schema_type, SchemaType::Aggregator);
        assert_eq!(aggregator.state.as_deref(), Some("ready"));

        let connection = schema_entry(&row(json!({
            "schema": "aws",
            "plugin": "aws",
            "connection": "aws",
            "type": null,
            "state": ""
        })))
        .unwrap();
        assert_eq!(connection.schema_type, SchemaType::Connection);
        assert!(connection.state.is_none());

        assert!(schema_entry(&row(json!({"connection": "x"}))).is_none());
    }

    #[test]
    fn test_flag_accepts_bool_and_integer() {
        let row = json!({"a": true, "b": 0, "c": 1, "d": "yes"})
            .as_object()
            .cloned()
            .unwrap();
        assert!(flag(&row, "a"));
        assert!(!flag(&row, "b"));
        assert!(flag(&row, "c"));
        assert!(!flag(&row, "d"));
        assert!(!flag(&row, "missing"));
    }
}
