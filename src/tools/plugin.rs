//! Plugin tools.
//!
//! `plugin_list` reads the service's plugin catalog table; `plugin_show` asks
//! the Steampipe CLI, so it works even while the service is down.

use crate::cli::PlatformCli;
use crate::db::{QueryExecutor, SchemaInspector};
use crate::error::{DbError, DbResult};
use crate::models::PluginEntry;
use crate::tools::registry::{parse_args, to_text};
use futures_util::future::BoxFuture;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use tracing::info;

/// Arguments for `steampipe plugin list`.
const PLUGIN_LIST_ARGS: &[&str] = &["plugin", "list", "--output", "json"];

/// Input for the plugin_list tool (no arguments).
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PluginListInput {}

/// Input for the plugin_show tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PluginShowInput {
    /// Plugin name: short ("aws"), org-qualified ("turbot/aws") or a full image reference
    #[schemars(length(min = 1))]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct PluginListOutput {
    pub plugins: Vec<PluginEntry>,
}

pub const PLUGIN_LIST_DESCRIPTION: &str = "List installed Steampipe plugins and their versions.";

pub const PLUGIN_SHOW_DESCRIPTION: &str =
    "Show details of one installed Steampipe plugin, including the connections that use it.";

pub fn plugin_list(executor: QueryExecutor, args: JsonValue) -> BoxFuture<'static, DbResult<String>> {
    Box::pin(async move {
        let _: PluginListInput = parse_args("plugin_list", args)?;
        let plugins = SchemaInspector::new(executor).list_plugins().await?;
        info!(count = plugins.len(), "Plugins listed");
        to_text(&PluginListOutput { plugins })
    })
}

pub fn plugin_show(cli: PlatformCli, args: JsonValue) -> BoxFuture<'static, DbResult<String>> {
    Box::pin(async move {
        let input: PluginShowInput = parse_args("plugin_show", args)?;
        let name = input.name.trim();
        let cli_args: Vec<String> = PLUGIN_LIST_ARGS.iter().map(|s| s.to_string()).collect();
        let listing = cli.run_json(&cli_args).await?;

        let plugin = find_plugin(&listing, name).ok_or_else(|| DbError::plugin_not_found(name))?;
        info!(plugin = %name, "Plugin shown");
        to_text(&json!({ "plugin": plugin }))
    })
}

/// Find `wanted` among the installed plugins of a `plugin list` listing.
///
/// Accepts the `{"installed": [...]}` shape of current CLI versions and a bare
/// array from older ones.
pub fn find_plugin<'a>(listing: &'a JsonValue, wanted: &str) -> Option<&'a JsonValue> {
    let entries = match listing {
        JsonValue::Array(entries) => entries,
        JsonValue::Object(map) => map.get("installed")?.as_array()?,
        _ => return None,
    };
    entries.iter().find(|entry| {
        entry
            .get("name")
            .or_else(|| entry.get("plugin"))
            .and_then(JsonValue::as_str)
            .is_some_and(|name| plugin_matches(name, wanted))
    })
}

/// Compare plugin references ignoring registry prefix and version tag.
fn plugin_matches(reference: &str, wanted: &str) -> bool {
    if reference == wanted {
        return true;
    }
    let image = reference.split('@').next().unwrap_or(reference);
    let wanted = wanted.split('@').next().unwrap_or(wanted);
    !wanted.is_empty() && (image == wanted || image.ends_with(&format!("/{}", wanted)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> JsonValue {
        json!({
            "installed": [
                {
                    "name": "hub.steampipe.io/plugins/turbot/aws@latest",
                    "version": "0.118.1",
                    "connections": ["aws", "aws_dev"]
                },
                {
                    "name": "hub.steampipe.io/plugins/turbot/net@latest",
                    "version": "0.12.0",
                    "connections": ["net"]
                }
            ],
            "failed": [],
            "warnings": []
        })
    }

    #[test]
    fn test_find_plugin_by_short_name() {
        let listing = listing();
        let plugin = find_plugin(&listing, "aws").unwrap();
        assert_eq!(plugin["version"], "0.118.1");
        assert_eq!(plugin["connections"][1], "aws_dev");
    }

    #[test]
    fn test_find_plugin_by_qualified_name() {
        let listing = listing();
        assert!(find_plugin(&listing, "turbot/net").is_some());
        assert!(find_plugin(&listing, "hub.steampipe.io/plugins/turbot/net@latest").is_some());
        assert!(find_plugin(&listing, "net@latest").is_some());
    }

    #[test]
    fn test_find_plugin_does_not_match_suffixes() {
        let listing = listing();
        assert!(find_plugin(&listing, "ws").is_none());
        assert!(find_plugin(&listing, "gcp").is_none());
    }

    #[test]
    fn test_find_plugin_in_bare_array() {
        let listing = json!([{"name": "turbot/csv@latest", "version": "1.0.0"}]);
        assert!(find_plugin(&listing, "csv").is_some());
    }

    /// Executable script that prints `output` whatever its arguments.
    #[cfg(unix)]
    fn fake_cli(dir: &tempfile::TempDir, output: &JsonValue) -> PlatformCli {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Duration;

        let path = dir.path().join("steampipe");
        std::fs::write(&path, format!("#!/bin/sh\necho '{}'\n", output)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        PlatformCli::new(path.to_string_lossy(), Duration::from_secs(5))
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_plugin_show_through_cli() {
        let dir = tempfile::tempdir().unwrap();
        let cli = fake_cli(&dir, &listing());

        let text = plugin_show(cli.clone(), json!({"name": "aws"})).await.unwrap();
        let value: JsonValue = serde_json::from_str(&text).unwrap();
        assert_eq!(value["plugin"]["version"], "0.118.1");

        let err = plugin_show(cli, json!({"name": "gcp"})).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::PluginNotFound);
        assert_eq!(err.to_string(), "Plugin 'gcp' not found");
    }
}
