//! ModelClient trait — the abstraction over the tool-calling model endpoint.
//!
//! A ModelClient sends the full transcript plus the tool definitions and
//! returns the model's next output items (text messages and/or tool-call
//! requests). Implementations live in the providers crate.

use crate::error::ModelError;
use crate::transcript::{Role, TranscriptItem};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Configuration for a single model invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    /// The model to use (e.g., "gpt-5-mini")
    pub model: String,

    /// The full transcript so far, replayed on every invocation
    pub input: Vec<TranscriptItem>,

    /// Tools the model may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    1.0
}

/// A tool definition sent to the model so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A complete response from the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Output items in model order: text messages and tool-call requests
    /// interleaved as the model produced them.
    pub output: Vec<TranscriptItem>,

    /// Token usage statistics
    pub usage: Option<Usage>,
}

impl ModelResponse {
    /// The text contents of this turn's assistant messages, in order.
    pub fn text_chunks(&self) -> Vec<String> {
        self.output
            .iter()
            .filter_map(|item| match item {
                TranscriptItem::Message {
                    role: Role::Assistant,
                    content,
                } => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    /// Whether this turn requested any tool calls.
    pub fn has_function_calls(&self) -> bool {
        self.output
            .iter()
            .any(|item| matches!(item, TranscriptItem::FunctionCall { .. }))
    }
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

/// The core ModelClient trait.
///
/// The agent loop calls `respond()` without knowing which backend is in
/// use, which keeps the loop testable against scripted fakes.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// A human-readable name for this client (e.g., "openai").
    fn name(&self) -> &str;

    /// Send the transcript and get the model's next output items.
    async fn respond(
        &self,
        request: ModelRequest,
    ) -> std::result::Result<ModelResponse, ModelError>;
}
