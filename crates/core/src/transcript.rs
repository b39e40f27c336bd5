//! Transcript item types.
//!
//! A run's conversation with the model is a flat, ordered list of items:
//! plain messages, tool-call requests emitted by the model, and the tool
//! outputs paired back to them. Items are append-only for the lifetime of
//! a run and are replayed in full on every model invocation.

use serde::{Deserialize, Serialize};

/// The role of a plain message in the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (agent policy)
    System,
    /// The end user's request
    User,
    /// Model-generated text
    Assistant,
}

/// One entry in the model transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptItem {
    /// A plain message with a role and text content.
    Message { role: Role, content: String },

    /// A tool invocation requested by the model.
    ///
    /// `arguments` is the raw JSON string exactly as the model produced
    /// it; parsing is deferred to the dispatcher.
    FunctionCall {
        call_id: String,
        name: String,
        arguments: String,
    },

    /// The result paired to a prior `FunctionCall` via `call_id`.
    ///
    /// `output` is the serialized result payload. Every function call in
    /// the transcript must be answered by exactly one of these before the
    /// model is invoked again.
    FunctionCallOutput { call_id: String, output: String },
}

impl TranscriptItem {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        TranscriptItem::Message {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        TranscriptItem::Message {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        TranscriptItem::Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a tool-call request item.
    pub fn function_call(
        call_id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        TranscriptItem::FunctionCall {
            call_id: call_id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Create a tool-result item answering `call_id`.
    pub fn function_call_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        TranscriptItem::FunctionCallOutput {
            call_id: call_id.into(),
            output: output.into(),
        }
    }
}
