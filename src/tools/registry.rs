//! Tool registry and dispatcher.
//!
//! The registry is a static interface table: one [`ToolDescriptor`] per
//! [`ToolKind`], each carrying the JSON Schema of its input and a handler
//! tagged by the collaborator it needs. The dispatcher validates untrusted
//! arguments against that schema before the handler ever sees them, and turns
//! every outcome into exactly one result envelope.

use crate::cli::PlatformCli;
use crate::db::QueryExecutor;
use crate::error::{DbError, DbResult};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error};

/// Every tool the server exposes, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Query,
    Reconnect,
    SchemaList,
    TableList,
    TableShow,
    PluginList,
    PluginShow,
    ClearCache,
}

impl ToolKind {
    pub const ALL: [ToolKind; 8] = [
        Self::Query,
        Self::Reconnect,
        Self::SchemaList,
        Self::TableList,
        Self::TableShow,
        Self::PluginList,
        Self::PluginShow,
        Self::ClearCache,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Reconnect => "reconnect",
            Self::SchemaList => "schema_list",
            Self::TableList => "table_list",
            Self::TableShow => "table_show",
            Self::PluginList => "plugin_list",
            Self::PluginShow => "plugin_show",
            Self::ClearCache => "clear_cache",
        }
    }
}

pub type DatabaseHandler = fn(QueryExecutor, JsonValue) -> BoxFuture<'static, DbResult<String>>;
pub type CliHandler = fn(PlatformCli, JsonValue) -> BoxFuture<'static, DbResult<String>>;

/// Handler tagged by the collaborator it receives.
#[derive(Debug, Clone, Copy)]
pub enum Handler {
    /// Runs against the database through the executor
    Database(DatabaseHandler),
    /// Runs the Steampipe CLI only
    Cli(CliHandler),
}

#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Arc<JsonObject>,
    pub handler: Handler,
}

impl ToolDescriptor {
    pub fn requires_database(&self) -> bool {
        matches!(self.handler, Handler::Database(_))
    }

    /// The protocol-level tool definition.
    pub fn to_tool(&self) -> Tool {
        Tool::new(self.name, self.description, self.input_schema.clone())
    }
}

/// JSON Schema for a tool input type, as the object the protocol expects.
pub fn input_schema<T: JsonSchema>() -> Arc<JsonObject> {
    match serde_json::to_value(schemars::schema_for!(T)) {
        Ok(JsonValue::Object(mut schema)) => {
            // Draft marker only; validators and hosts assume the current draft
            schema.remove("$schema");
            // Field-less inputs come out without `properties`; with it the
            // validator names the offending field instead of reporting a bare
            // `false` schema
            schema
                .entry("properties")
                .or_insert_with(|| JsonValue::Object(JsonObject::new()));
            Arc::new(schema)
        }
        _ => Arc::new(JsonObject::new()),
    }
}

/// Decode already-validated arguments into the tool's input type.
pub fn parse_args<T: DeserializeOwned>(tool: &str, args: JsonValue) -> DbResult<T> {
    serde_json::from_value(args).map_err(|e| DbError::validation(tool, e.to_string()))
}

/// Render a tool's successful output as the envelope text.
pub fn to_text<T: serde::Serialize>(value: &T) -> DbResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| DbError::internal(format!("failed to serialize tool output: {}", e)))
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    validator: jsonschema::Validator,
}

/// Immutable table of tools, built once at startup.
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<&'static str, usize>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    /// Build a registry, rejecting duplicate names and schemas that do not compile.
    pub fn new(descriptors: Vec<ToolDescriptor>) -> DbResult<Self> {
        let mut tools = Vec::with_capacity(descriptors.len());
        let mut index = HashMap::with_capacity(descriptors.len());

        for descriptor in descriptors {
            if index.contains_key(descriptor.name) {
                return Err(DbError::internal(format!(
                    "tool '{}' is registered twice",
                    descriptor.name
                )));
            }
            let schema = JsonValue::Object((*descriptor.input_schema).clone());
            let validator = jsonschema::validator_for(&schema).map_err(|e| {
                DbError::internal(format!(
                    "input schema of '{}' is invalid: {}",
                    descriptor.name, e
                ))
            })?;
            index.insert(descriptor.name, tools.len());
            tools.push(RegisteredTool {
                descriptor,
                validator,
            });
        }

        Ok(Self { tools, index })
    }

    /// Registry with every built-in tool.
    pub fn builtin() -> DbResult<Self> {
        Self::new(ToolKind::ALL.iter().map(|kind| kind.descriptor()).collect())
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&i| &self.tools[i].descriptor)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.descriptor.name).collect()
    }

    /// Protocol tool definitions, in registration order.
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(|t| t.descriptor.to_tool()).collect()
    }

    /// Check `args` against the tool's input schema.
    pub fn validate(&self, name: &str, args: &JsonValue) -> DbResult<()> {
        let tool = self
            .index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| DbError::unknown_tool(name))?;

        let problems: Vec<String> = tool
            .validator
            .iter_errors(args)
            .map(|e| e.to_string())
            .collect();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(DbError::validation(name, problems.join("; ")))
        }
    }
}

/// Routes validated invocations to their handlers.
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    executor: QueryExecutor,
    cli: PlatformCli,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>, executor: QueryExecutor, cli: PlatformCli) -> Self {
        Self {
            registry,
            executor,
            cli,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    pub fn list_tools(&self) -> Vec<Tool> {
        self.registry.list_tools()
    }

    /// Invoke a tool and wrap the outcome in a result envelope.
    ///
    /// Never fails: unknown tools, invalid arguments, handler errors and
    /// handler panics all come back as `isError` envelopes.
    pub async fn invoke(&self, name: &str, arguments: Option<JsonObject>) -> CallToolResult {
        let args = JsonValue::Object(arguments.unwrap_or_default());
        match self.dispatch(name, args).await {
            Ok(text) => {
                debug!(tool = %name, "Tool invocation succeeded");
                CallToolResult::success(vec![Content::text(text)])
            }
            Err(err) => {
                error!(tool = %name, kind = %err.kind(), error = %err, "Tool invocation failed");
                CallToolResult::error(vec![Content::text(error_text(&err))])
            }
        }
    }

    async fn dispatch(&self, name: &str, args: JsonValue) -> DbResult<String> {
        let handler = self
            .registry
            .get(name)
            .map(|tool| tool.handler)
            .ok_or_else(|| DbError::unknown_tool(name))?;
        self.registry.validate(name, &args)?;

        let future = match handler {
            Handler::Database(handler) => handler(self.executor.clone(), args),
            Handler::Cli(handler) => handler(self.cli.clone(), args),
        };
        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(DbError::internal(format!(
                "tool '{}' panicked: {}",
                name,
                panic_message(panic.as_ref())
            ))),
        }
    }
}

/// Envelope text for a failed invocation: the message, then any suggestion.
pub fn error_text(err: &DbError) -> String {
    match err.suggestion() {
        Some(suggestion) if !err.to_string().contains(suggestion) => {
            format!("{}\n\nSuggestion: {}", err, suggestion)
        }
        _ => err.to_string(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
