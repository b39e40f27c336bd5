//! OpenAI Responses API client.
//!
//! Sends the full transcript as Responses-API input items and maps the
//! returned output items back into transcript items. The wire-level item
//! shapes stay private here; the rest of the system only sees
//! `TranscriptItem`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use setlist_core::error::ModelError;
use setlist_core::model::{ModelClient, ModelRequest, ModelResponse, ToolDefinition, Usage};
use setlist_core::transcript::{Role, TranscriptItem};
use tracing::{debug, trace, warn};

/// A client for the OpenAI `/responses` endpoint.
pub struct OpenAiResponsesClient {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiResponsesClient {
    /// Create a new Responses API client.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create an OpenAI client (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Convert transcript items to Responses API input items.
    fn to_api_items(items: &[TranscriptItem]) -> Vec<ApiInputItem> {
        items
            .iter()
            .map(|item| match item {
                TranscriptItem::Message { role, content } => ApiInputItem::Message {
                    role: match role {
                        Role::System => "system".into(),
                        Role::User => "user".into(),
                        Role::Assistant => "assistant".into(),
                    },
                    content: content.clone(),
                },
                TranscriptItem::FunctionCall {
                    call_id,
                    name,
                    arguments,
                } => ApiInputItem::FunctionCall {
                    item_type: "function_call".into(),
                    call_id: call_id.clone(),
                    name: name.clone(),
                    arguments: arguments.clone(),
                },
                TranscriptItem::FunctionCallOutput { call_id, output } => {
                    ApiInputItem::FunctionCallOutput {
                        item_type: "function_call_output".into(),
                        call_id: call_id.clone(),
                        output: output.clone(),
                    }
                }
            })
            .collect()
    }

    /// Convert tool definitions to the Responses API's flat function shape.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                tool_type: "function".into(),
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.parameters.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl ModelClient for OpenAiResponsesClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let url = format!("{}/responses", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "input": Self::to_api_items(&request.input),
            "temperature": request.temperature,
        });

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        debug!(
            client = %self.name,
            model = %request.model,
            items = request.input.len(),
            "Sending model request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ModelError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(ModelError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Model endpoint returned error");
            return Err(ModelError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ModelError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let usage = api_response.usage.map(|u| Usage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ModelResponse {
            output: to_transcript_items(api_response.output),
            usage,
        })
    }
}

/// Map output items into transcript items, tolerantly.
///
/// Message items flatten their `output_text` blocks; function calls carry
/// through; anything else (reasoning traces, future item types) is
/// skipped rather than failing the turn.
fn to_transcript_items(output: Vec<ApiOutputItem>) -> Vec<TranscriptItem> {
    let mut items = Vec::new();
    for item in output {
        match item.item_type.as_str() {
            "message" => {
                let text = item
                    .content
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|block| block.block_type == "output_text")
                    .filter_map(|block| block.text)
                    .collect::<Vec<_>>()
                    .join("\n");
                items.push(TranscriptItem::Message {
                    role: Role::Assistant,
                    content: text,
                });
            }
            "function_call" => match (item.call_id, item.name) {
                (Some(call_id), Some(name)) => items.push(TranscriptItem::FunctionCall {
                    call_id,
                    name,
                    arguments: item.arguments.unwrap_or_default(),
                }),
                _ => warn!("Function call item missing call_id or name, skipping"),
            },
            other => {
                trace!(item_type = other, "Skipping unsupported output item");
            }
        }
    }
    items
}

// --- Responses API types (internal) ---

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ApiInputItem {
    Message {
        role: String,
        content: String,
    },
    FunctionCall {
        #[serde(rename = "type")]
        item_type: String,
        call_id: String,
        name: String,
        arguments: String,
    },
    FunctionCallOutput {
        #[serde(rename = "type")]
        item_type: String,
        call_id: String,
        output: String,
    },
}

#[derive(Debug, Serialize)]
struct ApiToolDefinition {
    #[serde(rename = "type")]
    tool_type: String,
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    output: Vec<ApiOutputItem>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiOutputItem {
    #[serde(rename = "type")]
    item_type: String,
    #[serde(default)]
    content: Option<Vec<ApiContentBlock>>,
    #[serde(default)]
    call_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_constructor() {
        let client = OpenAiResponsesClient::openai("sk-test");
        assert_eq!(client.name(), "openai");
        assert_eq!(client.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn constructor_trims_trailing_slash() {
        let client = OpenAiResponsesClient::new("proxy", "https://proxy.test/v1/", "k");
        assert_eq!(client.base_url, "https://proxy.test/v1");
    }

    #[test]
    fn message_items_serialize_without_type_tag() {
        let items = OpenAiResponsesClient::to_api_items(&[TranscriptItem::system("policy")]);
        let json = serde_json::to_value(&items).unwrap();
        assert_eq!(json[0]["role"], "system");
        assert_eq!(json[0]["content"], "policy");
        assert!(json[0].get("type").is_none());
    }

    #[test]
    fn function_call_items_serialize_with_type_tag() {
        let items = OpenAiResponsesClient::to_api_items(&[
            TranscriptItem::function_call("call_1", "add_tracks", "{\"uris\":[]}"),
            TranscriptItem::function_call_output("call_1", "{\"added\":0}"),
        ]);
        let json = serde_json::to_value(&items).unwrap();
        assert_eq!(json[0]["type"], "function_call");
        assert_eq!(json[0]["call_id"], "call_1");
        assert_eq!(json[0]["name"], "add_tracks");
        assert_eq!(json[1]["type"], "function_call_output");
        assert_eq!(json[1]["output"], "{\"added\":0}");
    }

    #[test]
    fn tool_definitions_use_flat_function_shape() {
        let tools = vec![ToolDefinition {
            name: "search_items".into(),
            description: "Search the catalog".into(),
            parameters: serde_json::json!({"type": "object"}),
        }];
        let api_tools = OpenAiResponsesClient::to_api_tools(&tools);
        let json = serde_json::to_value(&api_tools).unwrap();
        assert_eq!(json[0]["type"], "function");
        assert_eq!(json[0]["name"], "search_items");
        // flat: no nested "function" object like chat completions
        assert!(json[0].get("function").is_none());
    }

    #[test]
    fn parse_message_output_joins_text_blocks() {
        let data = r#"{
            "output": [
                {
                    "type": "message",
                    "id": "msg_1",
                    "role": "assistant",
                    "content": [
                        {"type": "output_text", "text": "Voici ta playlist.", "annotations": []},
                        {"type": "output_text", "text": "Bonne écoute !", "annotations": []}
                    ]
                }
            ],
            "usage": {"input_tokens": 12, "output_tokens": 7, "total_tokens": 19}
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        let items = to_transcript_items(parsed.output);
        assert_eq!(
            items,
            vec![TranscriptItem::assistant("Voici ta playlist.\nBonne écoute !")]
        );
    }

    #[test]
    fn parse_function_call_output_item() {
        let data = r#"{
            "output": [
                {
                    "type": "function_call",
                    "id": "fc_1",
                    "call_id": "call_abc",
                    "name": "create_playlist",
                    "arguments": "{\"name\":\"Mix\",\"description\":\"d\",\"public\":true}",
                    "status": "completed"
                }
            ]
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        let items = to_transcript_items(parsed.output);
        match &items[0] {
            TranscriptItem::FunctionCall { call_id, name, arguments } => {
                assert_eq!(call_id, "call_abc");
                assert_eq!(name, "create_playlist");
                assert!(arguments.contains("Mix"));
            }
            other => panic!("unexpected item: {other:?}"),
        }
    }

    #[test]
    fn reasoning_items_are_skipped() {
        let data = r#"{
            "output": [
                {"type": "reasoning", "id": "rs_1", "summary": []},
                {"type": "message", "role": "assistant", "content": [{"type": "output_text", "text": "ok"}]}
            ]
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        let items = to_transcript_items(parsed.output);
        assert_eq!(items, vec![TranscriptItem::assistant("ok")]);
    }

    #[test]
    fn non_text_blocks_are_filtered() {
        let data = r#"{
            "output": [
                {"type": "message", "role": "assistant", "content": [
                    {"type": "refusal", "refusal": "no"},
                    {"type": "output_text", "text": "yes"}
                ]}
            ]
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        let items = to_transcript_items(parsed.output);
        assert_eq!(items, vec![TranscriptItem::assistant("yes")]);
    }

    #[test]
    fn malformed_function_call_is_dropped() {
        let data = r#"{"output": [{"type": "function_call", "name": "search_items"}]}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert!(to_transcript_items(parsed.output).is_empty());
    }

    #[test]
    fn parse_usage() {
        let data = r#"{"output": [], "usage": {"input_tokens": 100, "output_tokens": 20, "total_tokens": 120}}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        let usage = parsed.usage.unwrap();
        assert_eq!(usage.input_tokens, 100);
        assert_eq!(usage.output_tokens, 20);
        assert_eq!(usage.total_tokens, 120);
    }

    #[test]
    fn parse_response_without_usage() {
        let parsed: ApiResponse = serde_json::from_str(r#"{"output": []}"#).unwrap();
        assert!(parsed.usage.is_none());
        assert!(parsed.output.is_empty());
    }
}
