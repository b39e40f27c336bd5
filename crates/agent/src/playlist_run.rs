//! The playlist-generation loop.
//!
//! Drives a model through tool calls until it stops requesting them,
//! pairing every function call with exactly one output item before the
//! next model invocation. The loop is bounded: hitting the turn limit
//! terminates with a degraded result instead of erroring out.

use std::sync::Arc;

use serde::Serialize;
use setlist_core::catalog::{CatalogApi, Playlist};
use setlist_core::error::Error;
use setlist_core::model::{ModelClient, ModelRequest};
use setlist_core::tool::ToolRegistry;
use setlist_core::transcript::TranscriptItem;
use tracing::{debug, info, warn};

use crate::prompt::SYSTEM_PROMPT;

/// Summary used when the terminal model turn carried no text.
const EMPTY_SUMMARY_PLACEHOLDER: &str = "(aucun texte du modèle)";

const DEFAULT_MAX_TURNS: u32 = 25;
const DEFAULT_TEMPERATURE: f32 = 1.0;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The model produced a turn with no function calls.
    Completed,
    /// The turn limit forced termination.
    TurnLimitReached,
}

/// Outcome of one run. `playlist_url` and `playlist_name` are empty
/// strings when no playlist was created.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub summary: String,
    pub playlist_url: String,
    pub playlist_name: String,
    pub status: RunStatus,
}

/// Agent bound to one model and one tool registry.
pub struct PlaylistAgent {
    model: Arc<dyn ModelClient>,
    model_name: String,
    temperature: f32,
    tools: Arc<ToolRegistry>,
    max_turns: u32,
}

impl PlaylistAgent {
    pub fn new(
        model: Arc<dyn ModelClient>,
        model_name: impl Into<String>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            model,
            model_name: model_name.into(),
            temperature: DEFAULT_TEMPERATURE,
            tools,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    /// Cap the number of model turns before forced termination.
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Run the loop for one user prompt.
    ///
    /// Tool failures are folded into function call outputs and fed back
    /// to the model; only model transport errors surface as `Err`.
    pub async fn run(&self, user_prompt: &str) -> Result<RunResult, Error> {
        let mut transcript = vec![
            TranscriptItem::system(SYSTEM_PROMPT),
            TranscriptItem::user(user_prompt),
        ];
        let tool_definitions = self.tools.definitions();

        let mut playlist: Option<Playlist> = None;
        let mut last_text_chunks: Vec<String> = Vec::new();
        let mut turn = 0u32;

        loop {
            turn += 1;
            if turn > self.max_turns {
                warn!(
                    max_turns = self.max_turns,
                    "Turn limit reached, terminating run"
                );
                return Ok(finish(
                    last_text_chunks,
                    playlist,
                    RunStatus::TurnLimitReached,
                ));
            }

            info!(turn, "Starting agent turn");

            let request = ModelRequest {
                model: self.model_name.clone(),
                input: transcript.clone(),
                tools: tool_definitions.clone(),
                temperature: self.temperature,
            };
            let response = self.model.respond(request).await?;

            if let Some(usage) = &response.usage {
                debug!(
                    input_tokens = usage.input_tokens,
                    output_tokens = usage.output_tokens,
                    "Model turn usage"
                );
            }

            // All output items enter the transcript before any tool runs,
            // so every function call the model sees again is its own.
            transcript.extend(response.output.iter().cloned());

            let text_chunks = response.text_chunks();
            if !response.has_function_calls() {
                return Ok(finish(text_chunks, playlist, RunStatus::Completed));
            }
            last_text_chunks = text_chunks;

            for item in &response.output {
                let TranscriptItem::FunctionCall {
                    call_id,
                    name,
                    arguments,
                } = item
                else {
                    continue;
                };

                let payload = self.tools.dispatch(name, arguments).await;

                // The first successful create_playlist becomes the run's
                // playlist reference; later creations are ignored.
                if name == "create_playlist" && playlist.is_none() {
                    if let Ok(created) = serde_json::from_value::<Playlist>(payload.clone()) {
                        info!(url = %created.url, "Created playlist");
                        playlist = Some(created);
                    }
                }

                transcript.push(TranscriptItem::function_call_output(
                    call_id,
                    payload.to_string(),
                ));
            }
        }
    }
}

fn finish(text_chunks: Vec<String>, playlist: Option<Playlist>, status: RunStatus) -> RunResult {
    let summary = text_chunks.join("\n").trim().to_string();
    let summary = if summary.is_empty() {
        EMPTY_SUMMARY_PLACEHOLDER.to_string()
    } else {
        summary
    };
    RunResult {
        summary,
        playlist_url: playlist
            .as_ref()
            .map(|p| p.url.clone())
            .unwrap_or_default(),
        playlist_name: playlist.map(|p| p.name).unwrap_or_default(),
        status,
    }
}

/// Run one playlist generation for an authenticated catalog account.
///
/// Resolves the account once, binds the tool registry to it, and drives
/// the loop with default settings.
pub async fn run_agent_for_user(
    user_prompt: &str,
    catalog: Arc<dyn CatalogApi>,
    model: Arc<dyn ModelClient>,
    model_name: &str,
) -> Result<RunResult, Error> {
    let registry = setlist_tools::registry_for(catalog).await?;
    let agent = PlaylistAgent::new(model, model_name, Arc::new(registry));
    agent.run(user_prompt).await
}
