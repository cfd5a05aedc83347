//! Read-only resources: the connection status and schema/table templates.

use crate::db::{ConnectionManager, SchemaInspector};
use crate::error::{DbError, DbResult};
use rmcp::model::{AnnotateAble, RawResource, RawResourceTemplate, Resource, ResourceTemplate};
use serde_json::json;

pub const STATUS_URI: &str = "steampipe://status";
const SCHEMA_PREFIX: &str = "steampipe://schema/";
const TABLE_PREFIX: &str = "steampipe://table/";

/// A parsed resource URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUri {
    Status,
    Schema(String),
    Table { schema: String, name: String },
}

impl ResourceUri {
    pub fn parse(uri: &str) -> Option<Self> {
        if uri == STATUS_URI {
            return Some(Self::Status);
        }
        if let Some(name) = uri.strip_prefix(SCHEMA_PREFIX) {
            return (!name.is_empty() && !name.contains('/')).then(|| Self::Schema(name.into()));
        }
        let rest = uri.strip_prefix(TABLE_PREFIX)?;
        match rest.split_once('/') {
            Some((schema, name)) if !schema.is_empty() && !name.is_empty() && !name.contains('/') => {
                Some(Self::Table {
                    schema: schema.into(),
                    name: name.into(),
                })
            }
            _ => None,
        }
    }
}

pub fn list() -> Vec<Resource> {
    let mut status = RawResource::new(STATUS_URI, "status");
    status.description = Some("Status of the database connection".to_string());
    status.mime_type = Some("application/json".to_string());
    vec![status.no_annotation()]
}

pub fn templates() -> Vec<ResourceTemplate> {
    vec![
        RawResourceTemplate {
            uri_template: format!("{}{{name}}", SCHEMA_PREFIX),
            name: "schema".to_string(),
            title: Some("Schema".to_string()),
            description: Some("Tables of one schema, with descriptions".to_string()),
            mime_type: Some("application/json".to_string()),
        }
        .no_annotation(),
        RawResourceTemplate {
            uri_template: format!("{}{{schema}}/{{name}}", TABLE_PREFIX),
            name: "table".to_string(),
            title: Some("Table".to_string()),
            description: Some("Columns of one table".to_string()),
            mime_type: Some("application/json".to_string()),
        }
        .no_annotation(),
    ]
}

/// Render the resource at `uri` as JSON text.
pub async fn read(
    manager: &ConnectionManager,
    inspector: &SchemaInspector,
    uri: &str,
) -> DbResult<String> {
    let value = match ResourceUri::parse(uri) {
        Some(ResourceUri::Status) => json!(manager.status().await),
        Some(ResourceUri::Schema(schema)) => {
            let tables = inspector.list_tables(&schema, None).await?;
            json!({ "schema": schema, "tables": tables })
        }
        Some(ResourceUri::Table { schema, name }) => {
            let table = inspector.show_table(&name, Some(&schema)).await?;
            json!({ "table": table })
        }
        None => {
            return Err(DbError::validation(
                "read_resource",
                format!(
                    "unknown resource URI '{}'; expected {}, {}{{name}} or {}{{schema}}/{{name}}",
                    uri, STATUS_URI, SCHEMA_PREFIX, TABLE_PREFIX
                ),
            ));
        }
    };
    serde_json::to_string_pretty(&value)
        .map_err(|e| DbError::internal(format!("failed to serialize resource: {}", e)))
}
