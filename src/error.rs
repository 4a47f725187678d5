// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types shared across the agent loop, providers, tools, and safety layer.
//!
//! Each concern gets its own `thiserror` enum so call sites can match on the
//! failure kind; the agent loop never lets a tool- or safety-path error
//! escape as a panic or exception (see [`crate::tools::ToolRegistry::execute`]).

use thiserror::Error;

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Top-level error returned by the agent loop and REPL.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Safety(#[from] SafetyError),

    #[error("maximum tool rounds reached")]
    MaxToolRoundsReached,

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AgentError {
    pub fn config(msg: impl Into<String>) -> Self {
        AgentError::Config(msg.into())
    }
}

/// Errors raised by a [`crate::types::Provider`] implementation.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned an error response: {message}")]
    Api { provider: String, message: String },

    #[error("{provider} response could not be decoded: {message}")]
    Decode { provider: String, message: String },

    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("operation not supported: {0}")]
    UnsupportedOperation(String),
}

/// Errors raised while executing a single tool call.
///
/// Domain-shaped failures (an `edit_file` with zero or multiple matches, an
/// out-of-range line number) are distinguished from I/O failures, but both
/// are turned into `ToolResult { is_error: true, .. }` by the registry; this
/// type never unwinds across the dispatch boundary. Unknown tool names and
/// executor failures both surface as error results, not crashes.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("{0}")]
    InvalidArgs(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Io(String),

    #[error("{0}")]
    Denied(String),

    #[error("command failed (exit code: {code}):\n{output}")]
    CommandFailed { code: i32, output: String },

    #[error("command timed out after {timeout_ms}ms\n{partial_output}")]
    Timeout {
        timeout_ms: u64,
        partial_output: String,
    },
}

impl From<SafetyError> for ToolError {
    fn from(e: SafetyError) -> Self {
        ToolError::Denied(e.to_string())
    }
}

/// Errors raised by the safety layer's checkers and confirmation handler.
#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Denied: command matches dangerous pattern ({label}): {command}")]
    CommandDenied { label: String, command: String },

    #[error("Denied: path '{path}' is outside project root '{root}'")]
    PathDenied { path: String, root: String },

    #[error("Denied: '{path}' is a protected file; prefer edit_file for surgical changes")]
    ProtectedOverwrite { path: String },
}
