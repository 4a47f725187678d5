// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! `grep_search`: recursive pattern search with a fixed ignore set and a
//! 50-match cap, built on `walkdir`-based directory traversal.

use async_trait::async_trait;
use regex::RegexBuilder;
use walkdir::WalkDir;

use crate::tools::handlers::resolve_path;
use crate::tools::ToolHandler;
use crate::types::ToolDefinition;

const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    ".next",
    "__pycache__",
    ".venv",
    "venv",
    ".agent",
];

const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "woff", "woff2", "ttf", "eot", "zip", "tar", "gz",
    "bz2", "pdf", "doc", "docx", "exe", "dll", "so", "dylib",
];

const MAX_FILE_BYTES: u64 = 1024 * 1024;
const MAX_MATCHES: usize = 50;

pub struct GrepSearchHandler;

#[async_trait]
impl ToolHandler for GrepSearchHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "grep_search".to_string(),
            description: "Recursively search files for a pattern".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "pattern": {"type": "string"},
                    "path": {"type": "string"},
                    "is_regex": {"type": "boolean"},
                    "case_insensitive": {"type": "boolean"},
                },
                "required": ["pattern"],
            }),
        }
    }

    async fn execute(&self, input: serde_json::Value) -> (String, bool) {
        let Some(pattern) = input.get("pattern").and_then(|v| v.as_str()) else {
            return ("Missing required argument 'pattern'".to_string(), true);
        };
        let is_regex = input.get("is_regex").and_then(|v| v.as_bool()).unwrap_or(false);
        let case_insensitive = input
            .get("case_insensitive")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let root = input
            .get("path")
            .and_then(|v| v.as_str())
            .map(resolve_path)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

        let pattern_source = if is_regex {
            pattern.to_string()
        } else {
            regex::escape(pattern)
        };

        let regex = match RegexBuilder::new(&pattern_source)
            .case_insensitive(case_insensitive)
            .build()
        {
            Ok(r) => r,
            Err(e) => return (format!("Invalid pattern: {e}"), true),
        };

        let mut matches = Vec::new();
        let mut capped = false;

        'walk: for entry in WalkDir::new(&root)
            .into_iter()
            .filter_entry(|e| !is_ignored_dir(e))
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            if is_binary_extension(entry.path()) {
                continue;
            }
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if metadata.len() > MAX_FILE_BYTES {
                continue;
            }

            let Ok(content) = std::fs::read_to_string(entry.path()) else {
                continue;
            };

            for (line_no, line) in content.lines().enumerate() {
                if regex.is_match(line) {
                    let rel = entry
                        .path()
                        .strip_prefix(&root)
                        .unwrap_or(entry.path())
                        .display();
                    matches.push(format!("{rel}:{}: {}", line_no + 1, line.trim()));
                    if matches.len() >= MAX_MATCHES {
                        capped = true;
                        break 'walk;
                    }
                }
            }
        }

        if matches.is_empty() {
            return ("No matches found".to_string(), false);
        }

        let mut out = matches.join("\n");
        if capped {
            out.push_str("\n50+ matches (capped)");
        }
        (out, false)
    }
}

fn is_ignored_dir(entry: &walkdir::DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let Some(name) = entry.file_name().to_str() else {
        return false;
    };
    if entry.depth() == 0 {
        return false;
    }
    IGNORED_DIRS.contains(&name) || name.starts_with('.')
}

fn is_binary_extension(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| BINARY_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finds_literal_matches() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello world\nfoo\n").unwrap();
        std::fs::write(dir.path().join("b.txt"), "nothing here\n").unwrap();

        let handler = GrepSearchHandler;
        let (out, is_error) = handler
            .execute(serde_json::json!({"pattern": "hello", "path": dir.path().to_str().unwrap()}))
            .await;
        assert!(!is_error);
        assert!(out.contains("a.txt:1: hello world"));
    }

    #[tokio::test]
    async fn skips_ignored_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        std::fs::write(dir.path().join("node_modules/x.txt"), "needle\n").unwrap();
        std::fs::write(dir.path().join("top.txt"), "needle\n").unwrap();

        let handler = GrepSearchHandler;
        let (out, _) = handler
            .execute(serde_json::json!({"pattern": "needle", "path": dir.path().to_str().unwrap()}))
            .await;
        assert!(out.contains("top.txt"));
        assert!(!out.contains("node_modules"));
    }

    #[tokio::test]
    async fn literal_pattern_is_escaped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a.b\nacb\n").unwrap();

        let handler = GrepSearchHandler;
        let (out, _) = handler
            .execute(serde_json::json!({"pattern": "a.b", "path": dir.path().to_str().unwrap()}))
            .await;
        assert!(out.contains("a.b"));
        assert!(!out.contains("acb"));
    }

    #[tokio::test]
    async fn caps_at_fifty_matches() {
        let dir = tempfile::tempdir().unwrap();
        let body: String = (0..60).map(|_| "needle\n").collect();
        std::fs::write(dir.path().join("a.txt"), body).unwrap();

        let handler = GrepSearchHandler;
        let (out, _) = handler
            .execute(serde_json::json!({"pattern": "needle", "path": dir.path().to_str().unwrap()}))
            .await;
        assert!(out.contains("50+"));
    }
}
