// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! `edit_file`: search-and-replace (mode A, preferred) or 1-indexed line
//! range replace (mode B). Subject to edit-safety (sandbox only).

use std::sync::Arc;

use async_trait::async_trait;

use crate::safety::SafetyLayer;
use crate::tools::handlers::{had_trailing_newline, join_lines, resolve_path, split_lines};
use crate::tools::ToolHandler;
use crate::types::ToolDefinition;

pub struct EditFileHandler {
    safety: Arc<SafetyLayer>,
}

impl EditFileHandler {
    pub fn new(safety: Arc<SafetyLayer>) -> Self {
        Self { safety }
    }
}

#[async_trait]
impl ToolHandler for EditFileHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "edit_file".to_string(),
            description: "Replace the unique occurrence of old_text with new_text, or replace a 1-indexed inclusive line range".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "new_text": {"type": "string"},
                    "old_text": {"type": "string", "description": "Unique substring to replace (mode A)"},
                    "start_line": {"type": "integer", "description": "1-indexed start line (mode B)"},
                    "end_line": {"type": "integer", "description": "1-indexed end line (mode B)"},
                },
                "required": ["path", "new_text"],
            }),
        }
    }

    async fn execute(&self, input: serde_json::Value) -> (String, bool) {
        let Some(path_str) = input.get("path").and_then(|v| v.as_str()) else {
            return ("Missing required argument 'path'".to_string(), true);
        };
        let Some(new_text) = input.get("new_text").and_then(|v| v.as_str()) else {
            return ("Missing required argument 'new_text'".to_string(), true);
        };
        let path = resolve_path(path_str);

        if let Err(e) = self.safety.check_edit_safety(&path) {
            return (e.to_string(), true);
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => return (format!("Failed to read '{}': {e}", path.display()), true),
        };

        if let Some(old_text) = input.get("old_text").and_then(|v| v.as_str()) {
            return self.edit_search_replace(&path, &content, old_text, new_text);
        }

        let (Some(start), Some(end)) = (
            input.get("start_line").and_then(|v| v.as_i64()),
            input.get("end_line").and_then(|v| v.as_i64()),
        ) else {
            return (
                "edit_file requires either 'old_text' or both 'start_line' and 'end_line'".to_string(),
                true,
            );
        };

        self.edit_line_range(&path, &content, start, end, new_text)
    }
}

impl EditFileHandler {
    fn edit_search_replace(
        &self,
        path: &std::path::Path,
        content: &str,
        old_text: &str,
        new_text: &str,
    ) -> (String, bool) {
        let count = content.matches(old_text).count();
        if count == 0 {
            return (format!("'old_text' not found in {}", path.display()), true);
        }
        if count >= 2 {
            return (
                format!("'old_text' occurs {count} times in {}; it must be unique", path.display()),
                true,
            );
        }

        let updated = content.replacen(old_text, new_text, 1);
        if let Err(e) = std::fs::write(path, &updated) {
            return (format!("Failed to write '{}': {e}", path.display()), true);
        }

        let delta = split_lines(&updated).len() as i64 - split_lines(content).len() as i64;
        (format!("Replaced 1 occurrence ({delta:+} lines)"), false)
    }

    fn edit_line_range(
        &self,
        path: &std::path::Path,
        content: &str,
        start: i64,
        end: i64,
        new_text: &str,
    ) -> (String, bool) {
        let trailing_newline = had_trailing_newline(content);
        let lines = split_lines(content);
        let total = lines.len() as i64;

        if start < 1 || end < start || start > total.max(1) {
            return (
                format!("Invalid line range {start}-{end} for a {total}-line file"),
                true,
            );
        }
        let end = end.min(total);

        let mut new_lines = lines[..(start - 1) as usize].to_vec();
        if !new_text.is_empty() {
            new_lines.extend(split_lines(new_text));
        }
        new_lines.extend(lines[end as usize..].to_vec());

        let updated = join_lines(&new_lines, trailing_newline);
        if let Err(e) = std::fs::write(path, &updated) {
            return (format!("Failed to write '{}': {e}", path.display()), true);
        }

        let delta = new_lines.len() as i64 - lines.len() as i64;
        (
            format!("Replaced lines {start}-{end} ({delta:+} lines)"),
            false,
        )
    }
}
