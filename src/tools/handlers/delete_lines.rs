// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! `delete_lines`: delete a 1-indexed inclusive line range. Subject to
//! edit-safety (sandbox only).

use std::sync::Arc;

use async_trait::async_trait;

use crate::safety::SafetyLayer;
use crate::tools::handlers::{had_trailing_newline, join_lines, resolve_path, split_lines};
use crate::tools::ToolHandler;
use crate::types::ToolDefinition;

pub struct DeleteLinesHandler {
    safety: Arc<SafetyLayer>,
}

impl DeleteLinesHandler {
    pub fn new(safety: Arc<SafetyLayer>) -> Self {
        Self { safety }
    }
}

#[async_trait]
impl ToolHandler for DeleteLinesHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "delete_lines".to_string(),
            description: "Delete a 1-indexed inclusive line range".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "start_line": {"type": "integer"},
                    "end_line": {"type": "integer"},
                },
                "required": ["path", "start_line", "end_line"],
            }),
        }
    }

    async fn execute(&self, input: serde_json::Value) -> (String, bool) {
        let Some(path_str) = input.get("path").and_then(|v| v.as_str()) else {
            return ("Missing required argument 'path'".to_string(), true);
        };
        let Some(start) = input.get("start_line").and_then(|v| v.as_i64()) else {
            return ("Missing required argument 'start_line'".to_string(), true);
        };
        let Some(end) = input.get("end_line").and_then(|v| v.as_i64()) else {
            return ("Missing required argument 'end_line'".to_string(), true);
        };
        let path = resolve_path(path_str);

        if let Err(e) = self.safety.check_edit_safety(&path) {
            return (e.to_string(), true);
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => return (format!("Failed to read '{}': {e}", path.display()), true),
        };

        let trailing_newline = had_trailing_newline(&content);
        let mut lines = split_lines(&content);
        let total = lines.len() as i64;

        if start < 1 || end < start || start > total {
            return (
                format!("Invalid line range {start}-{end} for a {total}-line file"),
                true,
            );
        }
        let end = end.min(total);

        let deleted_count = (end - start + 1) as usize;
        lines.drain((start - 1) as usize..end as usize);

        let updated = join_lines(&lines, trailing_newline);
        if let Err(e) = std::fs::write(&path, &updated) {
            return (format!("Failed to write '{}': {e}", path.display()), true);
        }

        (
            format!("Deleted {deleted_count} lines; file now has {} lines", lines.len()),
            false,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::{deny_all, SafetyLayer};

    fn handler_for(root: &std::path::Path) -> DeleteLinesHandler {
        DeleteLinesHandler::new(Arc::new(SafetyLayer::new(root, deny_all())))
    }

    #[tokio::test]
    async fn deletes_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "one\ntwo\nthree\n").unwrap();

        let handler = handler_for(dir.path());
        let (_, is_error) = handler
            .execute(serde_json::json!({"path": path.to_str().unwrap(), "start_line": 1, "end_line": 2}))
            .await;
        assert!(!is_error);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "three\n");
    }

    #[tokio::test]
    async fn clamps_end_to_total() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "one\ntwo\n").unwrap();

        let handler = handler_for(dir.path());
        let (out, is_error) = handler
            .execute(serde_json::json!({"path": path.to_str().unwrap(), "start_line": 1, "end_line": 100}))
            .await;
        assert!(!is_error, "{out}");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[tokio::test]
    async fn start_past_end_of_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "one\n").unwrap();

        let handler = handler_for(dir.path());
        let (_, is_error) = handler
            .execute(serde_json::json!({"path": path.to_str().unwrap(), "start_line": 5, "end_line": 6}))
            .await;
        assert!(is_error);
    }

    #[tokio::test]
    async fn outside_sandbox_denied_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let handler = handler_for(dir.path());
        let outside = std::env::temp_dir().join("not-in-sandbox-delete-xyz.txt");
        std::fs::write(&outside, "one\ntwo\n").unwrap();

        let (_, is_error) = handler
            .execute(serde_json::json!({"path": outside.to_str().unwrap(), "start_line": 1, "end_line": 1}))
            .await;
        assert!(is_error);
        assert_eq!(std::fs::read_to_string(&outside).unwrap(), "one\ntwo\n");
    }
}
