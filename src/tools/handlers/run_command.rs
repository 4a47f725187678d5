// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! `run_command`: runs a shell command via the host shell, merging
//! stdout/stderr, capped output, and a per-call timeout. Subject to
//! command-safety.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::safety::SafetyLayer;
use crate::tools::ToolHandler;
use crate::types::ToolDefinition;

const DEFAULT_TIMEOUT_MS: u64 = 120_000;
const CAPTURE_BUFFER_BYTES: usize = 100 * 1024;
const DISPLAY_BYTES: usize = 50 * 1024;

pub struct RunCommandHandler {
    safety: Arc<SafetyLayer>,
}

impl RunCommandHandler {
    pub fn new(safety: Arc<SafetyLayer>) -> Self {
        Self { safety }
    }
}

#[async_trait]
impl ToolHandler for RunCommandHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "run_command".to_string(),
            description: "Run a shell command and return its merged stdout/stderr".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "command": {"type": "string"},
                    "cwd": {"type": "string"},
                    "timeout_ms": {"type": "integer"},
                },
                "required": ["command"],
            }),
        }
    }

    async fn execute(&self, input: serde_json::Value) -> (String, bool) {
        let Some(command) = input.get("command").and_then(|v| v.as_str()) else {
            return ("Missing required argument 'command'".to_string(), true);
        };

        if let Err(e) = self.safety.check_command_safety(command) {
            return (e.to_string(), true);
        }

        let cwd = input.get("cwd").and_then(|v| v.as_str()).map(String::from);
        let timeout_ms = input
            .get("timeout_ms")
            .and_then(|v| v.as_u64())
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .env("PAGER", "cat")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }

        let mut child = match cmd.spawn() {
            Ok(c) => c,
            Err(e) => return (format!("Failed to spawn command: {e}"), true),
        };

        let mut stdout = child.stdout.take().expect("piped stdout");
        let mut stderr = child.stderr.take().expect("piped stderr");

        let collect = async {
            let (out, err) = tokio::join!(
                read_capped(&mut stdout, CAPTURE_BUFFER_BYTES),
                read_capped(&mut stderr, CAPTURE_BUFFER_BYTES),
            );
            let status = child.wait().await;
            (out, err, status)
        };

        match tokio::time::timeout(Duration::from_millis(timeout_ms), collect).await {
            Ok((out, err, status)) => {
                let merged = merge_output(&out, &err);
                let display = cap_for_display(&merged);

                match status {
                    Ok(status) if status.success() => (display, false),
                    Ok(status) => (
                        format!(
                            "Command failed (exit code: {}):\n{display}",
                            status.code().unwrap_or(-1)
                        ),
                        true,
                    ),
                    Err(e) => (format!("Failed to wait on command: {e}"), true),
                }
            }
            Err(_) => {
                let _ = child.start_kill();
                (
                    format!(
                        "Command timed out after {timeout_ms}ms. Tip: retry with a larger timeout_ms budget."
                    ),
                    true,
                )
            }
        }
    }
}

async fn read_capped<R: AsyncRead + Unpin>(reader: &mut R, cap: usize) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.len() >= cap {
                    buf.truncate(cap);
                    break;
                }
            }
            Err(_) => break,
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn merge_output(stdout: &str, stderr: &str) -> String {
    let mut out = stdout.to_string();
    if !stderr.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("[stderr]\n");
        out.push_str(stderr);
    }
    out
}

fn cap_for_display(output: &str) -> String {
    if output.len() <= DISPLAY_BYTES {
        return output.to_string();
    }
    let mut truncated = output.as_bytes()[..DISPLAY_BYTES].to_vec();
    while std::str::from_utf8(&truncated).is_err() {
        truncated.pop();
    }
    format!(
        "{}\n...[truncated, {} bytes total]",
        String::from_utf8_lossy(&truncated),
        output.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::{deny_all, SafetyLayer};

    fn handler() -> RunCommandHandler {
        RunCommandHandler::new(Arc::new(SafetyLayer::new(std::env::temp_dir(), deny_all())))
    }

    #[tokio::test]
    async fn runs_safe_command() {
        let (out, is_error) = handler()
            .execute(serde_json::json!({"command": "echo hello"}))
            .await;
        assert!(!is_error);
        assert!(out.contains("hello"));
    }

    #[tokio::test]
    async fn non_zero_exit_is_error() {
        let (out, is_error) = handler()
            .execute(serde_json::json!({"command": "exit 3"}))
            .await;
        assert!(is_error);
        assert!(out.contains("exit code: 3"));
    }

    #[tokio::test]
    async fn dangerous_command_denied_by_default() {
        let (out, is_error) = handler()
            .execute(serde_json::json!({"command": "rm -rf /tmp/should-not-run"}))
            .await;
        assert!(is_error);
        assert!(out.contains("Denied"));
    }

    #[tokio::test]
    async fn timeout_reports_partial_and_tip() {
        let (out, is_error) = handler()
            .execute(serde_json::json!({"command": "sleep 5", "timeout_ms": 50}))
            .await;
        assert!(is_error);
        assert!(out.contains("timed out"));
        assert!(out.contains("Tip"));
    }
}
