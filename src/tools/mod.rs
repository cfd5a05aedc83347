//! MCP tool implementations.
//!
//! This module contains all tool handlers:
//! - `query`: Run read-only SQL
//! - `reconnect`: Re-resolve and re-establish the database connection
//! - `schema_list`, `table_list`, `table_show`: Schema introspection
//! - `plugin_list`, `plugin_show`: Installed plugins
//! - `clear_cache`: Drop the service's query cache
//!
//! `registry` ties each tool name to its input schema and handler.

pub mod connection;
pub mod format;
pub mod plugin;
pub mod query;
pub mod registry;
pub mod schema;

pub use format::OutputFormat;
pub use registry::{
    Handler, ToolDescriptor, ToolDispatcher, ToolKind, ToolRegistry, error_text, input_schema,
};

use connection::ReconnectInput;
use plugin::{PluginListInput, PluginShowInput};
use query::{ClearCacheInput, QueryInput};
use schema::{SchemaListInput, TableListInput, TableShowInput};

impl ToolKind {
    /// The interface table entry for this tool.
    pub fn descriptor(self) -> ToolDescriptor {
        let (description, input_schema, handler) = match self {
            Self::Query => (
                query::QUERY_DESCRIPTION,
                input_schema::<QueryInput>(),
                Handler::Database(query::query),
            ),
            Self::Reconnect => (
                connection::RECONNECT_DESCRIPTION,
                input_schema::<ReconnectInput>(),
                Handler::Database(connection::reconnect),
            ),
            Self::SchemaList => (
                schema::SCHEMA_LIST_DESCRIPTION,
                input_schema::<SchemaListInput>(),
                Handler::Database(schema::schema_list),
            ),
            Self::TableList => (
                schema::TABLE_LIST_DESCRIPTION,
                input_schema::<TableListInput>(),
                Handler::Database(schema::table_list),
            ),
            Self::TableShow => (
                schema::TABLE_SHOW_DESCRIPTION,
                input_schema::<TableShowInput>(),
                Handler::Database(schema::table_show),
            ),
            Self::PluginList => (
                plugin::PLUGIN_LIST_DESCRIPTION,
                input_schema::<PluginListInput>(),
                Handler::Database(plugin::plugin_list),
            ),
            Self::PluginShow => (
                plugin::PLUGIN_SHOW_DESCRIPTION,
                input_schema::<PluginShowInput>(),
                Handler::Cli(plugin::plugin_show),
            ),
            Self::ClearCache => (
                query::CLEAR_CACHE_DESCRIPTION,
                input_schema::<ClearCacheInput>(),
                Handler::Database(query::clear_cache),
            ),
        };

        ToolDescriptor {
            name: self.name(),
            description,
            input_schema,
            handler,
        }
    }
}
