// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tool registry: named, self-describing effects the model may invoke.
//!
//! Registration order is preserved for the system prompt, and dispatch
//! never lets an executor's error escape as anything other than an error
//! [`ToolResult`].

pub mod handlers;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::safety::SafetyLayer;
use crate::types::{ToolDefinition, ToolResult};

/// A tool's executable half. Implementors type-check their own arguments
/// at the top of `execute` and return a domain error on mismatch; tool
/// parameters stay an opaque JSON value at this boundary.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    async fn execute(&self, input: serde_json::Value) -> (String, bool);
}

struct RegisteredTool {
    definition: ToolDefinition,
    handler: Arc<dyn ToolHandler>,
}

/// Name -> (definition, executor) map, plus dispatch.
///
/// Registration order is enumeration order (stable for the system prompt);
/// re-registering a name replaces the previous entry.
pub struct ToolRegistry {
    order: Vec<String>,
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            tools: HashMap::new(),
        }
    }

    /// Registers the eight built-in tools, sandboxed against `safety`.
    pub fn with_defaults(safety: Arc<SafetyLayer>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(handlers::ReadFileHandler));
        registry.register(Arc::new(handlers::WriteFileHandler::new(safety.clone())));
        registry.register(Arc::new(handlers::EditFileHandler::new(safety.clone())));
        registry.register(Arc::new(handlers::InsertLinesHandler::new(safety.clone())));
        registry.register(Arc::new(handlers::DeleteLinesHandler::new(safety.clone())));
        registry.register(Arc::new(handlers::GrepSearchHandler));
        registry.register(Arc::new(handlers::ListDirHandler));
        registry.register(Arc::new(handlers::RunCommandHandler::new(safety)));
        registry
    }

    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        let definition = handler.definition();
        let name = definition.name.clone();
        if !self.tools.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.tools.insert(name, RegisteredTool { definition, handler });
    }

    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name).map(|t| t.definition.clone()))
            .collect()
    }

    /// Dispatch by name. `tool_use_id` is carried through unchanged so the
    /// caller can pair this result back to the originating call. Unknown
    /// names and executor panics never escape: both become an
    /// `isError=true` result.
    pub async fn execute(
        &self,
        tool_use_id: impl Into<String>,
        name: &str,
        input: serde_json::Value,
    ) -> ToolResult {
        let tool_use_id = tool_use_id.into();
        let Some(tool) = self.tools.get(name) else {
            let known = self.order.join(", ");
            return ToolResult {
                tool_use_id,
                content: format!("Unknown tool '{name}'. Registered tools: {known}"),
                is_error: true,
            };
        };

        let handler = tool.handler.clone();
        let name_owned = name.to_string();

        // `tokio::spawn` catches panics in the task and reports them via
        // `JoinError`, which is how an executor bug surfaces as an error
        // result instead of taking down the whole process.
        match tokio::spawn(async move { handler.execute(input).await }).await {
            Ok((content, is_error)) => ToolResult {
                tool_use_id,
                content,
                is_error,
            },
            Err(join_err) => ToolResult {
                tool_use_id,
                content: format!("Tool '{name_owned}' failed: {join_err}"),
                is_error: true,
            },
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::{deny_all, SafetyLayer};

    struct EchoHandler;

    #[async_trait]
    impl ToolHandler for EchoHandler {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "echo".to_string(),
                description: "Echoes the message".to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {"message": {"type": "string"}},
                    "required": ["message"],
                }),
            }
        }

        async fn execute(&self, input: serde_json::Value) -> (String, bool) {
            let message = input.get("message").and_then(|v| v.as_str()).unwrap_or("");
            (format!("Echo: {message}"), false)
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_error_not_panic() {
        let registry = ToolRegistry::new();
        let result = registry.execute("call_1", "nope", serde_json::json!({})).await;
        assert!(result.is_error);
        assert!(result.content.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn registered_tool_dispatches() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoHandler));
        let result = registry
            .execute("call_1", "echo", serde_json::json!({"message": "x"}))
            .await;
        assert!(!result.is_error);
        assert_eq!(result.content, "Echo: x");
    }

    #[tokio::test]
    async fn tool_use_id_is_carried_through_to_the_result() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoHandler));
        let result = registry
            .execute("call_42", "echo", serde_json::json!({"message": "x"}))
            .await;
        assert_eq!(result.tool_use_id, "call_42");

        let unknown = registry.execute("call_43", "nope", serde_json::json!({})).await;
        assert_eq!(unknown.tool_use_id, "call_43");
    }

    #[test]
    fn registration_order_is_enumeration_order() {
        let safety = Arc::new(SafetyLayer::new(std::env::temp_dir(), deny_all()));
        let registry = ToolRegistry::with_defaults(safety);
        assert_eq!(
            registry.names(),
            vec![
                "read_file",
                "write_file",
                "edit_file",
                "insert_lines",
                "delete_lines",
                "grep_search",
                "list_dir",
                "run_command",
            ]
        );
    }

    #[test]
    fn re_register_replaces_without_duplicating_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoHandler));
        registry.register(Arc::new(EchoHandler));
        assert_eq!(registry.names(), vec!["echo"]);
    }
}
