// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! `list_dir`: lists a directory's entries, directories-first then
//! lexicographic, annotating files with a human-readable size.

use async_trait::async_trait;

use crate::tools::handlers::resolve_path;
use crate::tools::ToolHandler;
use crate::types::ToolDefinition;

const IGNORED_NAMES: &[&str] = &["node_modules", ".git", "dist"];

pub struct ListDirHandler;

#[async_trait]
impl ToolHandler for ListDirHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_dir".to_string(),
            description: "List a directory's entries".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "show_hidden": {"type": "boolean"},
                },
                "required": ["path"],
            }),
        }
    }

    async fn execute(&self, input: serde_json::Value) -> (String, bool) {
        let Some(path_str) = input.get("path").and_then(|v| v.as_str()) else {
            return ("Missing required argument 'path'".to_string(), true);
        };
        let show_hidden = input.get("show_hidden").and_then(|v| v.as_bool()).unwrap_or(false);
        let path = resolve_path(path_str);

        let entries = match std::fs::read_dir(&path) {
            Ok(e) => e,
            Err(e) => return (format!("Failed to list '{}': {e}", path.display()), true),
        };

        let mut dirs = Vec::new();
        let mut files = Vec::new();

        for entry in entries.filter_map(|e| e.ok()) {
            let name = entry.file_name().to_string_lossy().to_string();
            if !show_hidden && name.starts_with('.') {
                continue;
            }
            if !show_hidden && IGNORED_NAMES.contains(&name.as_str()) {
                continue;
            }
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if metadata.is_dir() {
                dirs.push(format!("{name}/"));
            } else {
                files.push(format!("{name} ({})", human_size(metadata.len())));
            }
        }

        dirs.sort();
        files.sort();

        if dirs.is_empty() && files.is_empty() {
            return (format!("{} (empty)", path.display()), false);
        }

        let mut lines = vec![format!("{}:", path.display())];
        lines.extend(dirs);
        lines.extend(files);
        (lines.join("\n"), false)
    }
}

fn human_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f < KB {
        format!("{bytes}B")
    } else if bytes_f < MB {
        format!("{:.1}KB", bytes_f / KB)
    } else {
        format!("{:.1}MB", bytes_f / MB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_directories_before_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("zz_dir")).unwrap();
        std::fs::write(dir.path().join("aa_file.txt"), "hi").unwrap();

        let handler = ListDirHandler;
        let (out, is_error) = handler
            .execute(serde_json::json!({"path": dir.path().to_str().unwrap()}))
            .await;
        assert!(!is_error);
        let dir_pos = out.find("zz_dir/").unwrap();
        let file_pos = out.find("aa_file.txt").unwrap();
        assert!(dir_pos < file_pos);
    }

    #[tokio::test]
    async fn hides_ignored_and_hidden_by_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("node_modules")).unwrap();
        std::fs::write(dir.path().join(".hidden"), "x").unwrap();
        std::fs::write(dir.path().join("visible.txt"), "x").unwrap();

        let handler = ListDirHandler;
        let (out, _) = handler
            .execute(serde_json::json!({"path": dir.path().to_str().unwrap()}))
            .await;
        assert!(!out.contains("node_modules"));
        assert!(!out.contains(".hidden"));
        assert!(out.contains("visible.txt"));
    }

    #[tokio::test]
    async fn human_readable_sizes_above_1kb_have_one_decimal() {
        assert_eq!(human_size(500), "500B");
        assert_eq!(human_size(2048), "2.0KB");
        assert_eq!(human_size(2 * 1024 * 1024), "2.0MB");
    }
}
