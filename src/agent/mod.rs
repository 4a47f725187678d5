// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Agent module - the core agentic control loop.
//!
//! A turn on user input `U`: append `User(U)` to the transcript, then loop
//! calling the provider, recording usage, and dispatching any tool calls
//! until the model returns plain text, a repetition brake engages, or
//! `max_tool_rounds` is exhausted. See [`Agent::chat`].
//!
//! # Example
//!
//! ```rust,ignore
//! use forgehand::agent::{Agent, AgentConfig, AgentOptions, AgentCallbacks};
//! use forgehand::tools::ToolRegistry;
//! use forgehand::safety::{deny_all, SafetyLayer};
//! use std::sync::Arc;
//!
//! let safety = Arc::new(SafetyLayer::new(".", deny_all()));
//! let registry = Arc::new(ToolRegistry::with_defaults(safety));
//!
//! let mut agent = Agent::new(AgentOptions {
//!     provider,
//!     tool_registry: registry,
//!     summarizer: None,
//!     system_prompt: Some("You are a helpful assistant.".to_string()),
//!     config: AgentConfig::default(),
//!     callbacks: AgentCallbacks::default(),
//! });
//!
//! let response = agent.chat("Hello!").await?;
//! ```

mod types;

pub use types::{AgentCallbacks, AgentConfig, AgentOptions, AgentState, TurnStats, TurnToolCall};

use std::time::Instant;

use serde_json::Value;

use crate::cost::CostLedger;
use crate::error::Result;
use crate::types::{
    BoxedProvider, ContentBlock, FinishReason, Message, MessageContent, Role, ToolCall, ToolDefinition,
};
use crate::tools::ToolRegistry;
use std::sync::Arc;

const MAX_ROUNDS_MESSAGE: &str =
    "Maximum tool rounds reached without a final response. Stopping this turn.";

const REPETITION_NUDGE: &str =
    "You have called the same tool with the same arguments repeatedly. Stop calling tools and respond with a summary of what you have learned so far.";

const SUMMARIZER_SYSTEM_PROMPT: &str =
    "Summarize the following conversation excerpt in 2-3 sentences. State only facts established in the excerpt; do not speculate, do not include code.";

/// The Agent orchestrates the conversation between the operator, the model,
/// and the tool registry.
pub struct Agent {
    provider: BoxedProvider,
    tool_registry: Arc<ToolRegistry>,
    summarizer: Option<BoxedProvider>,
    system_prompt: String,
    config: AgentConfig,
    callbacks: AgentCallbacks,
    state: AgentState,
    ledger: CostLedger,
}

impl Agent {
    pub fn new(options: AgentOptions) -> Self {
        let system_prompt = options
            .system_prompt
            .unwrap_or_else(|| "You are a helpful AI coding assistant.".to_string());
        let model = options.provider.model().to_string();

        Self {
            provider: options.provider,
            tool_registry: options.tool_registry,
            summarizer: options.summarizer,
            system_prompt,
            config: options.config,
            callbacks: options.callbacks,
            state: AgentState::default(),
            ledger: CostLedger::new(model),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.state.messages
    }

    pub fn clear(&mut self) {
        self.state = AgentState::default();
    }

    pub fn ledger(&self) -> &CostLedger {
        &self.ledger
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = prompt.into();
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tool_registry.definitions()
    }

    /// Dump the request payload of a provider call at `debug` level when
    /// `DEBUG_PROMPTS=1` (`AgentConfig::debug_prompts`). A no-op otherwise.
    fn debug_dump_prompt(&self, transcript: &[Message], tools: Option<&[ToolDefinition]>, system: &str) {
        if !self.config.debug_prompts {
            return;
        }
        let payload = serde_json::json!({
            "system": system,
            "tools": tools,
            "messages": transcript,
        });
        tracing::debug!(target: "forgehand::prompt", %payload, "provider request payload");
    }

    /// A turn: steps (a)-(h) of the agent loop, run until a final text
    /// response, the repetition brake fires, or rounds are exhausted.
    pub async fn chat(&mut self, user_message: &str) -> Result<String> {
        let start = Instant::now();
        let mut turn_stats = TurnStats::default();

        self.state.messages.push(Message::user(user_message));

        let mut tool_round = 0usize;
        let mut last_fingerprint = String::new();
        let mut repetition_count = 0usize;

        let final_text = loop {
            if tool_round >= self.config.max_tool_rounds {
                break MAX_ROUNDS_MESSAGE.to_string();
            }

            let tools = self.tool_definitions();
            self.debug_dump_prompt(&self.state.messages, Some(&tools), &self.system_prompt);
            let response = self
                .provider
                .chat(&self.state.messages, Some(&tools), Some(&self.system_prompt))
                .await?;

            if let Some(usage) = response.usage {
                let entry = self.ledger.record_usage(usage.input_tokens, usage.output_tokens);
                turn_stats.input_tokens += entry.input_tokens;
                turn_stats.output_tokens += entry.output_tokens;
                turn_stats.cost += entry.cost;
            }

            if response.finish_reason != FinishReason::ToolCalls || response.tool_calls.is_empty() {
                self.state.messages.push(Message::assistant(response.content.clone()));
                if let Some(on_text) = &self.callbacks.on_text {
                    on_text(&response.content);
                }
                break response.content;
            }

            tool_round += 1;
            let fingerprint = fingerprint_round(&response.tool_calls);

            if fingerprint == last_fingerprint {
                repetition_count += 1;
                if repetition_count >= self.config.max_repetitions {
                    if let Some(on_repetition) = &self.callbacks.on_repetition {
                        on_repetition(repetition_count);
                    }
                    self.state.messages.push(Message::user(REPETITION_NUDGE));
                    self.debug_dump_prompt(&self.state.messages, None, &self.system_prompt);
                    let nudged = self
                        .provider
                        .chat(&self.state.messages, None, Some(&self.system_prompt))
                        .await?;
                    self.state.messages.push(Message::assistant(nudged.content.clone()));
                    if let Some(on_text) = &self.callbacks.on_text {
                        on_text(&nudged.content);
                    }
                    break nudged.content;
                }
            } else {
                last_fingerprint = fingerprint;
                repetition_count = 0;
            }

            let mut assistant_blocks: Vec<ContentBlock> = Vec::new();
            if !response.content.is_empty() {
                assistant_blocks.push(ContentBlock::text(&response.content));
            }
            for call in &response.tool_calls {
                assistant_blocks.push(ContentBlock::tool_use(&call.id, &call.name, call.input.clone()));
            }
            self.state.messages.push(Message {
                role: Role::Assistant,
                content: MessageContent::Blocks(assistant_blocks),
            });

            let mut result_blocks = Vec::with_capacity(response.tool_calls.len());
            for call in &response.tool_calls {
                if let Some(on_tool_call) = &self.callbacks.on_tool_call {
                    on_tool_call(&call.name, &call.input);
                }
                let tool_start = Instant::now();
                let result = self
                    .tool_registry
                    .execute(call.id.clone(), &call.name, call.input.clone())
                    .await;
                let duration_ms = tool_start.elapsed().as_millis() as u64;

                if let Some(on_tool_result) = &self.callbacks.on_tool_result {
                    on_tool_result(&call.name, &result.content, result.is_error);
                }

                turn_stats.tool_call_count += 1;
                turn_stats.tool_calls.push(TurnToolCall {
                    name: call.name.clone(),
                    duration_ms,
                    is_error: result.is_error,
                });

                result_blocks.push(ContentBlock::tool_result(
                    &result.tool_use_id,
                    &result.content,
                    result.is_error,
                ));
            }
            self.state.messages.push(Message {
                role: Role::User,
                content: MessageContent::Blocks(result_blocks),
            });

            self.compact_history().await;
        };

        turn_stats.duration_ms = start.elapsed().as_millis() as u64;
        if let Some(on_turn_complete) = &self.callbacks.on_turn_complete {
            on_turn_complete(&turn_stats);
        }

        Ok(final_text)
    }

    /// Once the full-detail ToolResultBatch window is exceeded, replace the
    /// oldest excess with either a Summarizer-produced synopsis or a
    /// truncated rendering.
    async fn compact_history(&mut self) {
        let batch_indices: Vec<usize> = self
            .state
            .messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_tool_result_batch())
            .map(|(i, _)| i)
            .collect();

        let excess = batch_indices.len() as i64 - self.config.history_window_size as i64;
        if excess <= 0 {
            return;
        }
        let excess = excess as usize;
        let cutoff = batch_indices[excess - 1] + 1;

        if let Some(on_compaction) = &self.callbacks.on_compaction {
            on_compaction(true);
        }

        if let Some(summarizer) = &self.summarizer {
            let rendered = render_transcript_plain(&self.state.messages[..cutoff]);
            let summarizer_transcript = [Message::user(rendered)];
            self.debug_dump_prompt(&summarizer_transcript, None, SUMMARIZER_SYSTEM_PROMPT);
            let summary_call = summarizer
                .chat(&summarizer_transcript, None, Some(SUMMARIZER_SYSTEM_PROMPT))
                .await;
            if let Ok(summary) = summary_call {
                let replacement = Message::user(format!(
                    "[Context from earlier in this conversation: {}]",
                    summary.content.trim()
                ));
                self.state.messages.splice(0..cutoff, [replacement]);
                if let Some(on_compaction) = &self.callbacks.on_compaction {
                    on_compaction(false);
                }
                return;
            }
            tracing::warn!("summarizer failed during history compaction; falling back to truncation");
        }

        for &idx in batch_indices.iter().take(excess) {
            if let Some(message) = self.state.messages.get_mut(idx) {
                truncate_tool_result_batch(message);
            }
        }

        if let Some(on_compaction) = &self.callbacks.on_compaction {
            on_compaction(false);
        }
    }
}

/// Canonical-JSON fingerprint of a round's tool calls: `name::json` joined
/// by `|`, with object keys sorted lexicographically so argument order never
/// spuriously breaks repetition detection.
fn fingerprint_round(calls: &[ToolCall]) -> String {
    calls
        .iter()
        .map(|c| format!("{}::{}", c.name, canonical_json(&c.input)))
        .collect::<Vec<_>>()
        .join("|")
}

fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let parts: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}:{}", serde_json::to_string(k).unwrap_or_default(), canonical_json(&map[k])))
                .collect();
            format!("{{{}}}", parts.join(","))
        }
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", parts.join(","))
        }
        other => other.to_string(),
    }
}

const TRUNCATE_MARKER: &str = " …[truncated for context compaction]";
const TRUNCATE_LIMIT: usize = 200;

fn truncate_tool_result_batch(message: &mut Message) {
    if let MessageContent::Blocks(blocks) = &mut message.content {
        for block in blocks.iter_mut() {
            if let ContentBlock::ToolResult { content, .. } = block {
                if content.len() > TRUNCATE_LIMIT {
                    content.truncate(TRUNCATE_LIMIT);
                    content.push_str(TRUNCATE_MARKER);
                }
            }
        }
    }
}

fn render_transcript_plain(messages: &[Message]) -> String {
    let mut out = String::new();
    for message in messages {
        match (&message.role, &message.content) {
            (Role::User, MessageContent::Text(text)) => {
                out.push_str("User: ");
                out.push_str(text);
                out.push('\n');
            }
            (Role::Assistant, MessageContent::Text(text)) => {
                out.push_str("Agent: ");
                out.push_str(text);
                out.push('\n');
            }
            (Role::Assistant, MessageContent::Blocks(blocks)) => {
                let mut text = String::new();
                let mut calls = Vec::new();
                for block in blocks {
                    match block {
                        ContentBlock::Text { text: t } => text.push_str(t),
                        ContentBlock::ToolUse { name, input, .. } => {
                            calls.push(format!("{name}({input})"));
                        }
                        _ => {}
                    }
                }
                out.push_str("Agent: ");
                out.push_str(&text);
                if !calls.is_empty() {
                    out.push_str(" [called: ");
                    out.push_str(&calls.join(", "));
                    out.push(']');
                }
                out.push('\n');
            }
            (Role::User, MessageContent::Blocks(blocks)) => {
                out.push_str("Tool results: ");
                let previews: Vec<String> = blocks
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::ToolResult { content, .. } => {
                            Some(content.chars().take(80).collect::<String>())
                        }
                        _ => None,
                    })
                    .collect();
                out.push_str(&previews.join(" | "));
                out.push('\n');
            }
            _ => {}
        }
    }
    out
}
