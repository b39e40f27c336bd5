//! Tool trait and registry — the operations the model may call.
//!
//! Tools are registered by name. The agent loop never branches on tool
//! names or tool failures: `dispatch` folds every outcome, success or
//! error, into a JSON payload that goes straight back into the transcript.

use crate::error::{CatalogError, ToolError};
use crate::model::ToolDefinition;
use crate::sanitize::sanitize_value;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::{debug, error, warn};

/// The core Tool trait.
///
/// Each tool implements this and gets registered in the ToolRegistry. The
/// registry hands the definitions to the model and executes calls when the
/// model requests them.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "search_items").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with parsed, sanitised arguments.
    async fn execute(&self, arguments: Value) -> std::result::Result<Value, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Get all tool definitions (for sending to the model).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Execute a named tool with already-parsed arguments.
    pub async fn execute(
        &self,
        name: &str,
        arguments: Value,
    ) -> std::result::Result<Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.execute(arguments).await
    }

    /// Dispatch one model-requested call. Never fails.
    ///
    /// Parses the raw argument text (malformed JSON degrades to an empty
    /// object), sanitises it, runs the tool, and folds any error into a
    /// result payload the model can read and react to.
    pub async fn dispatch(&self, name: &str, raw_arguments: &str) -> Value {
        let arguments = parse_arguments(raw_arguments);
        debug!(tool = name, args = %arguments, "Executing tool call");

        let result = match self.execute(name, arguments).await {
            Ok(payload) => payload,
            Err(err) => error_payload(name, err),
        };

        debug!(tool = name, result = %result, "Tool call finished");
        result
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Parse the model's raw argument text. A malformed payload must not
/// crash the run; it degrades to an empty argument object and the call
/// proceeds (the tool reports its own missing fields).
fn parse_arguments(raw: &str) -> Value {
    if raw.is_empty() {
        return json!({});
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => sanitize_value(value),
        Err(err) => {
            warn!(error = %err, "Invalid JSON payload received from model");
            json!({})
        }
    }
}

/// Render a tool failure as the payload fed back to the model.
fn error_payload(name: &str, err: ToolError) -> Value {
    match err {
        ToolError::NotFound(tool_name) => {
            error!(tool = %tool_name, "Unknown tool requested by model");
            json!({ "error": format!("unknown function {tool_name}") })
        }
        ToolError::Catalog(catalog_err) => {
            warn!(tool = name, error = %catalog_err, "Catalog error while executing tool");
            match catalog_err {
                CatalogError::Api { status, message } => json!({
                    "error": "spotify_api_error",
                    "status": status,
                    "message": message,
                }),
                other => json!({
                    "error": "spotify_api_error",
                    "message": other.to_string(),
                }),
            }
        }
        other => {
            warn!(tool = name, error = %other, "Tool execution failed");
            json!({ "error": other.to_string() })
        }
    }
}
