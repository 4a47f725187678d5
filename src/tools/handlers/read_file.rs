// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! `read_file`: returns a numbered-line view of a file, optionally a range.

use async_trait::async_trait;

use crate::tools::handlers::{resolve_path, split_lines};
use crate::tools::ToolHandler;
use crate::types::ToolDefinition;

pub struct ReadFileHandler;

#[async_trait]
impl ToolHandler for ReadFileHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "read_file".to_string(),
            description: "Read a file, optionally a 1-indexed inclusive line range".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "Path to the file"},
                    "start_line": {"type": "integer", "description": "1-indexed start line"},
                    "end_line": {"type": "integer", "description": "1-indexed end line"},
                },
                "required": ["path"],
            }),
        }
    }

    async fn execute(&self, input: serde_json::Value) -> (String, bool) {
        let Some(path_str) = input.get("path").and_then(|v| v.as_str()) else {
            return ("Missing required argument 'path'".to_string(), true);
        };
        let path = resolve_path(path_str);

        if path.is_dir() {
            return (format!("'{}' is a directory, not a file", path.display()), true);
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => return (format!("Failed to read '{}': {e}", path.display()), true),
        };

        let lines = split_lines(&content);
        let total = lines.len();

        let start = input
            .get("start_line")
            .and_then(|v| v.as_i64())
            .unwrap_or(1)
            .max(1) as usize;
        let end = input
            .get("end_line")
            .and_then(|v| v.as_i64())
            .map(|e| e.max(1) as usize)
            .unwrap_or(total)
            .min(total.max(1));

        if total == 0 {
            return (
                format!("File: {} (0 lines total, showing 0-0)", path.display()),
                false,
            );
        }

        let start = start.min(total);
        let end = end.max(start);

        let mut out = format!(
            "File: {} ({total} lines total, showing {start}-{end})\n",
            path.display()
        );
        for (i, line) in lines.iter().enumerate().take(end).skip(start - 1) {
            out.push_str(&format!("{}: {}\n", i + 1, line));
        }
        (out, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "one\ntwo\nthree\n").unwrap();

        let handler = ReadFileHandler;
        let (out, is_error) = handler
            .execute(serde_json::json!({"path": path.to_str().unwrap()}))
            .await;
        assert!(!is_error);
        assert!(out.contains("3 lines total, showing 1-3"));
        assert!(out.contains("1: one"));
        assert!(out.contains("3: three"));
    }

    #[tokio::test]
    async fn clamps_range_to_file_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "one\ntwo\n").unwrap();

        let handler = ReadFileHandler;
        let (out, is_error) = handler
            .execute(serde_json::json!({"path": path.to_str().unwrap(), "start_line": 0, "end_line": 100}))
            .await;
        assert!(!is_error);
        assert!(out.contains("showing 1-2"));
    }

    #[tokio::test]
    async fn missing_file_is_error() {
        let handler = ReadFileHandler;
        let (_, is_error) = handler
            .execute(serde_json::json!({"path": "/nonexistent/path/xyz.txt"}))
            .await;
        assert!(is_error);
    }

    #[tokio::test]
    async fn directory_target_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let handler = ReadFileHandler;
        let (_, is_error) = handler
            .execute(serde_json::json!({"path": dir.path().to_str().unwrap()}))
            .await;
        assert!(is_error);
    }
}
