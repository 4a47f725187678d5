// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Core data model: the conversation transcript, tool call/result shapes,
//! and the [`Provider`] trait every LLM backend implements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Who produced a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Never placed in the transcript; routed out-of-band as the system
    /// instruction by [`Provider::chat`].
    System,
}

/// A unit of content within a [`Message`].
///
/// The three transcript shapes (plain user/assistant text, an assistant
/// turn with tool calls, a batch of tool results) are all encoded as a
/// `Message` whose content is one or more `ContentBlock`s, built from
/// `ContentBlock::text` / `tool_use` / `tool_result`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        ContentBlock::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>, is_error: bool) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error,
        }
    }
}

/// The content carried by a [`Message`]: either plain text (the common case
/// for a user turn) or a sequence of content blocks (assistant turns with
/// tool calls, and tool-result batches).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// An element of the ordered conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }

    /// `true` iff this is an Assistant message with at least one `ToolUse` block.
    pub fn has_tool_calls(&self) -> bool {
        matches!(self.role, Role::Assistant)
            && matches!(&self.content, MessageContent::Blocks(blocks)
                if blocks.iter().any(|b| matches!(b, ContentBlock::ToolUse { .. })))
    }

    /// `true` iff this is a ToolResultBatch: a User message whose content is
    /// entirely `ToolResult` blocks.
    pub fn is_tool_result_batch(&self) -> bool {
        matches!(self.role, Role::User)
            && matches!(&self.content, MessageContent::Blocks(blocks)
                if !blocks.is_empty() && blocks.iter().all(|b| matches!(b, ContentBlock::ToolResult { .. })))
    }

    /// Tool result blocks, if this message is a ToolResultBatch.
    pub fn tool_results(&self) -> Option<Vec<&ContentBlock>> {
        if !self.is_tool_result_batch() {
            return None;
        }
        match &self.content {
            MessageContent::Blocks(blocks) => Some(blocks.iter().collect()),
            _ => None,
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

/// The outcome of executing a [`ToolCall`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_use_id: String,
    pub content: String,
    pub is_error: bool,
}

/// A `(name, description, JSON-Schema parameters)` triple describing an
/// effect the model may invoke. The schema subset is translated per-vendor
/// by [`crate::providers::schema::translate_schema`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Why a [`CompletionResponse`] terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    ToolCalls,
    MaxTokens,
    Error,
}

/// Token usage reported by a vendor for a single [`Provider::chat`] call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Default for FinishReason {
    fn default() -> Self {
        FinishReason::Stop
    }
}

/// The normalized response from a [`Provider::chat`] call.
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<Usage>,
    pub finish_reason: FinishReason,
}

/// Uniform request/response contract over any LLM vendor.
///
/// Implementations translate the canonical transcript and tool definitions
/// into the vendor's native shape, request automatic tool selection, and
/// map the response back.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name, e.g. `"Anthropic"`.
    fn name(&self) -> &str;

    /// The model identifier this provider instance talks to.
    fn model(&self) -> &str;

    /// Whether this provider/model combination supports tool use.
    fn supports_tool_use(&self) -> bool {
        true
    }

    async fn chat(
        &self,
        transcript: &[Message],
        tools: Option<&[ToolDefinition]>,
        system_instruction: Option<&str>,
    ) -> std::result::Result<CompletionResponse, ProviderError>;
}

/// A type-erased [`Provider`], used wherever the concrete backend is chosen
/// at runtime (CLI provider selection, the Summarizer).
pub type BoxedProvider = Box<dyn Provider>;

/// Configuration needed to construct a concrete provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            model: Some(model.into()),
            base_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_is_text() {
        let m = Message::user("hi");
        assert!(matches!(m.content, MessageContent::Text(ref s) if s == "hi"));
        assert!(!m.has_tool_calls());
        assert!(!m.is_tool_result_batch());
    }

    #[test]
    fn assistant_with_tool_calls_is_detected() {
        let m = Message {
            role: Role::Assistant,
            content: MessageContent::Blocks(vec![ContentBlock::tool_use(
                "1",
                "echo",
                serde_json::json!({}),
            )]),
        };
        assert!(m.has_tool_calls());
    }

    #[test]
    fn tool_result_batch_is_detected() {
        let m = Message {
            role: Role::User,
            content: MessageContent::Blocks(vec![ContentBlock::tool_result("1", "ok", false)]),
        };
        assert!(m.is_tool_result_batch());
        assert_eq!(m.tool_results().unwrap().len(), 1);
    }
}
