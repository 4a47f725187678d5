// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! `write_file`: creates parent directories as needed and writes content
//! verbatim. Subject to write-safety (sandbox + protected-overwrite).

use std::sync::Arc;

use async_trait::async_trait;

use crate::safety::SafetyLayer;
use crate::tools::handlers::{resolve_path, split_lines};
use crate::tools::ToolHandler;
use crate::types::ToolDefinition;

pub struct WriteFileHandler {
    safety: Arc<SafetyLayer>,
}

impl WriteFileHandler {
    pub fn new(safety: Arc<SafetyLayer>) -> Self {
        Self { safety }
    }
}

#[async_trait]
impl ToolHandler for WriteFileHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "write_file".to_string(),
            description: "Write content to a file, creating parent directories as needed".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "content": {"type": "string"},
                },
                "required": ["path", "content"],
            }),
        }
    }

    async fn execute(&self, input: serde_json::Value) -> (String, bool) {
        let Some(path_str) = input.get("path").and_then(|v| v.as_str()) else {
            return ("Missing required argument 'path'".to_string(), true);
        };
        let Some(content) = input.get("content").and_then(|v| v.as_str()) else {
            return ("Missing required argument 'content'".to_string(), true);
        };
        let path = resolve_path(path_str);

        if let Err(e) = self.safety.check_write_safety(&path) {
            return (e.to_string(), true);
        }

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                return (format!("Failed to create parent directories: {e}"), true);
            }
        }

        if let Err(e) = std::fs::write(&path, content) {
            return (format!("Failed to write '{}': {e}", path.display()), true);
        }

        let line_count = split_lines(content).len();
        (
            format!("Wrote {line_count} lines to {}", path.display()),
            false,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::{deny_all, SafetyLayer};

    fn handler_for(root: &std::path::Path) -> WriteFileHandler {
        WriteFileHandler::new(Arc::new(SafetyLayer::new(root, deny_all())))
    }

    #[tokio::test]
    async fn writes_and_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler_for(dir.path());
        let path = dir.path().join("nested/dir/file.txt");

        let (out, is_error) = handler
            .execute(serde_json::json!({"path": path.to_str().unwrap(), "content": "a\nb\n"}))
            .await;
        assert!(!is_error, "{out}");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nb\n");
    }

    #[tokio::test]
    async fn protected_file_denied_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler_for(dir.path());
        let path = dir.path().join("package.json");

        let (out, is_error) = handler
            .execute(serde_json::json!({"path": path.to_str().unwrap(), "content": "{}"}))
            .await;
        assert!(is_error);
        assert!(out.contains("Denied") || out.contains("protected"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn outside_sandbox_denied_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler_for(dir.path());
        let outside = std::env::temp_dir().join("not-in-sandbox-xyz.txt");

        let (_, is_error) = handler
            .execute(serde_json::json!({"path": outside.to_str().unwrap(), "content": "x"}))
            .await;
        assert!(is_error);
    }
}
