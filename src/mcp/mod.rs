//! MCP server integration module.
//!
//! This module connects the MCP protocol to the tool dispatcher and exposes
//! the status resource, the schema/table resource templates and the prompts.

pub mod prompts;
pub mod resources;
pub mod service;

pub use service::SteampipeService;
