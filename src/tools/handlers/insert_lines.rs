// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! `insert_lines`: insert content before a given 1-indexed line, or at the
//! start (`line=0`) / end (`line=-1`). Subject to edit-safety (sandbox only).

use std::sync::Arc;

use async_trait::async_trait;

use crate::safety::SafetyLayer;
use crate::tools::handlers::{had_trailing_newline, join_lines, resolve_path, split_lines};
use crate::tools::ToolHandler;
use crate::types::ToolDefinition;

pub struct InsertLinesHandler {
    safety: Arc<SafetyLayer>,
}

impl InsertLinesHandler {
    pub fn new(safety: Arc<SafetyLayer>) -> Self {
        Self { safety }
    }
}

#[async_trait]
impl ToolHandler for InsertLinesHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "insert_lines".to_string(),
            description: "Insert content before a 1-indexed line (0 prepends, -1 appends)".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "line": {"type": "integer"},
                    "content": {"type": "string"},
                },
                "required": ["path", "line", "content"],
            }),
        }
    }

    async fn execute(&self, input: serde_json::Value) -> (String, bool) {
        let Some(path_str) = input.get("path").and_then(|v| v.as_str()) else {
            return ("Missing required argument 'path'".to_string(), true);
        };
        let Some(line) = input.get("line").and_then(|v| v.as_i64()) else {
            return ("Missing required argument 'line'".to_string(), true);
        };
        let Some(content) = input.get("content").and_then(|v| v.as_str()) else {
            return ("Missing required argument 'content'".to_string(), true);
        };
        let path = resolve_path(path_str);

        if let Err(e) = self.safety.check_edit_safety(&path) {
            return (e.to_string(), true);
        }

        let existing = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => return (format!("Failed to read '{}': {e}", path.display()), true),
        };

        let trailing_newline = had_trailing_newline(&existing);
        let mut lines = split_lines(&existing);
        let total = lines.len() as i64;

        let index = if line == 0 {
            0
        } else if line == -1 {
            lines.len()
        } else if (1..=total + 1).contains(&line) {
            (line - 1) as usize
        } else {
            return (
                format!("line {line} is out of range for a {total}-line file"),
                true,
            );
        };

        let inserted = split_lines(content);
        let inserted_count = inserted.len();
        for (offset, l) in inserted.into_iter().enumerate() {
            lines.insert(index + offset, l);
        }

        let updated = join_lines(&lines, trailing_newline);
        if let Err(e) = std::fs::write(&path, &updated) {
            return (format!("Failed to write '{}': {e}", path.display()), true);
        }

        (
            format!("Inserted {inserted_count} lines; file now has {} lines", lines.len()),
            false,
        )
    }
}
