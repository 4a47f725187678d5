// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! End-to-end safety scenarios exercised through the public tool-registry
//! surface rather than the safety layer's internals directly.

use std::sync::Arc;

use forgehand::safety::{deny_all, SafetyLayer};
use forgehand::tools::ToolRegistry;

#[tokio::test]
async fn dangerous_run_command_is_denied_and_filesystem_is_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let victim = dir.path().join("src");
    std::fs::create_dir(&victim).unwrap();
    std::fs::write(victim.join("keep.txt"), "do not delete me").unwrap();

    let safety = Arc::new(SafetyLayer::new(dir.path(), deny_all()));
    let registry = ToolRegistry::with_defaults(safety);

    let result = registry
        .execute(
            "call_1",
            "run_command",
            serde_json::json!({"command": "rm -rf src", "cwd": dir.path().to_str().unwrap()}),
        )
        .await;

    assert!(result.is_error);
    assert!(result.content.contains("Denied"));
    assert!(victim.join("keep.txt").exists());
}

#[tokio::test]
async fn write_file_outside_project_root_is_denied() {
    let project = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    let target = outside.path().join("escape.txt");

    let safety = Arc::new(SafetyLayer::new(project.path(), deny_all()));
    let registry = ToolRegistry::with_defaults(safety);

    let result = registry
        .execute(
            "call_1",
            "write_file",
            serde_json::json!({"path": target.to_str().unwrap(), "content": "pwned"}),
        )
        .await;

    assert!(result.is_error);
    assert!(!target.exists());
}

#[tokio::test]
async fn write_file_inside_project_root_succeeds() {
    let project = tempfile::tempdir().unwrap();
    let target = project.path().join("notes.txt");

    let safety = Arc::new(SafetyLayer::new(project.path(), deny_all()));
    let registry = ToolRegistry::with_defaults(safety);

    let result = registry
        .execute(
            "call_1",
            "write_file",
            serde_json::json!({"path": target.to_str().unwrap(), "content": "hello"}),
        )
        .await;

    assert!(!result.is_error, "{}", result.content);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "hello");
}

#[tokio::test]
async fn overwriting_a_protected_file_is_denied() {
    let project = tempfile::tempdir().unwrap();
    let package_json = project.path().join("package.json");
    std::fs::write(&package_json, "{}").unwrap();

    let safety = Arc::new(SafetyLayer::new(project.path(), deny_all()));
    let registry = ToolRegistry::with_defaults(safety);

    let result = registry
        .execute(
            "call_1",
            "write_file",
            serde_json::json!({"path": package_json.to_str().unwrap(), "content": "{\"evil\": true}"}),
        )
        .await;

    assert!(result.is_error);
    assert_eq!(std::fs::read_to_string(&package_json).unwrap(), "{}");
}
