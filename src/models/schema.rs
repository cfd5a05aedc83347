//! Schema-related data models.
//!
//! This module defines the shapes returned by the introspection queries.

use serde::{Deserialize, Serialize};

/// Schema type reported by `schema_list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// Backed by a plugin connection
    Connection,
    /// Aggregates several connections
    Aggregator,
    /// Anything else (`public`, catalogs, attached SQLite databases)
    Schema,
}

/// A schema, with the plugin connection that owns it when there is one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub schema: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl SchemaEntry {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            plugin: None,
            connection: None,
            schema_type: SchemaType::Schema,
            state: None,
        }
    }

    pub fn with_connection(
        mut self,
        plugin: Option<String>,
        connection: impl Into<String>,
        schema_type: SchemaType,
    ) -> Self {
        self.plugin = plugin;
        self.connection = Some(connection.into());
        self.schema_type = schema_type;
        self
    }

    pub fn with_state(mut self, state: Option<String>) -> Self {
        self.state = state.filter(|s| !s.is_empty());
        self
    }
}

/// Row of `table_list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub name: String,
    pub description: Option<String>,
}

/// Column of `table_show`, in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDetail {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ColumnDetail {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
            default: None,
            description: None,
        }
    }

    pub fn with_default(mut self, default: Option<String>) -> Self {
        self.default = default;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.is_empty());
        self
    }
}

/// Result of `table_show`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDetail {
    pub schema: String,
    pub name: String,
    pub columns: Vec<ColumnDetail>,
}

/// Row of `plugin_list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginEntry {
    pub plugin: String,
    pub version: Option<String>,
}
