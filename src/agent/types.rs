// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Agent types and configuration.

use crate::types::BoxedProvider;
use crate::tools::ToolRegistry;
use std::sync::Arc;

/// Statistics for a single turn (user message -> final response).
#[derive(Debug, Clone, Default)]
pub struct TurnStats {
    /// Number of tool calls executed.
    pub tool_call_count: usize,
    /// Input tokens used this turn.
    pub input_tokens: u64,
    /// Output tokens generated this turn.
    pub output_tokens: u64,
    /// Estimated cost of this turn in USD.
    pub cost: f64,
    /// Duration of the turn in milliseconds.
    pub duration_ms: u64,
    /// Individual tool call stats, in execution order.
    pub tool_calls: Vec<TurnToolCall>,
}

/// Statistics for a single tool call within a turn.
#[derive(Debug, Clone)]
pub struct TurnToolCall {
    pub name: String,
    pub duration_ms: u64,
    pub is_error: bool,
}

/// Logging/progress callbacks for agent events, invoked at well-defined
/// points in the control loop rather than interleaved with its logic.
/// Production wires coloured stdout; tests wire a capture buffer.
pub struct AgentCallbacks {
    /// Called when the model produces the final text of a turn.
    pub on_text: Option<Box<dyn Fn(&str) + Send + Sync>>,
    /// Called immediately before a tool call is dispatched.
    pub on_tool_call: Option<Box<dyn Fn(&str, &serde_json::Value) + Send + Sync>>,
    /// Called after a tool call completes.
    pub on_tool_result: Option<Box<dyn Fn(&str, &str, bool) + Send + Sync>>,
    /// Called when history compaction starts (`true`) and finishes (`false`).
    pub on_compaction: Option<Box<dyn Fn(bool) + Send + Sync>>,
    /// Called when the repetition brake engages, with the repetition count.
    pub on_repetition: Option<Box<dyn Fn(usize) + Send + Sync>>,
    /// Called when a turn completes with its stats.
    pub on_turn_complete: Option<Box<dyn Fn(&TurnStats) + Send + Sync>>,
}

impl Default for AgentCallbacks {
    fn default() -> Self {
        Self {
            on_text: None,
            on_tool_call: None,
            on_tool_result: None,
            on_compaction: None,
            on_repetition: None,
            on_turn_complete: None,
        }
    }
}

impl std::fmt::Debug for AgentCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentCallbacks")
            .field("on_text", &self.on_text.is_some())
            .field("on_tool_call", &self.on_tool_call.is_some())
            .field("on_tool_result", &self.on_tool_result.is_some())
            .field("on_compaction", &self.on_compaction.is_some())
            .field("on_repetition", &self.on_repetition.is_some())
            .field("on_turn_complete", &self.on_turn_complete.is_some())
            .finish()
    }
}

/// Tunable bounds for the agent loop.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Upper bound on tool-calling rounds within a single turn.
    pub max_tool_rounds: usize,
    /// Consecutive identical fingerprints before the repetition brake engages.
    pub max_repetitions: usize,
    /// Full-detail ToolResultBatch window before compaction kicks in.
    pub history_window_size: usize,
    /// Dump the full request payload (transcript, tools, system prompt) of
    /// every provider call at `debug` level. Set from `DEBUG_PROMPTS=1`.
    pub debug_prompts: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: 50,
            max_repetitions: 3,
            history_window_size: 6,
            debug_prompts: false,
        }
    }
}

/// Options for creating an [`super::Agent`].
pub struct AgentOptions {
    pub provider: BoxedProvider,
    pub tool_registry: Arc<ToolRegistry>,
    /// An optional cheaper Provider used for history-compaction summaries.
    /// Absence selects the truncation fallback.
    pub summarizer: Option<BoxedProvider>,
    pub system_prompt: Option<String>,
    pub config: AgentConfig,
    pub callbacks: AgentCallbacks,
}

/// Session-persistent agent state.
#[derive(Debug, Default)]
pub struct AgentState {
    pub messages: Vec<crate::types::Message>,
}
