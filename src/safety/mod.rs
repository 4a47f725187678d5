// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Safety layer: dangerous-command detection, path sandboxing, and the
//! protected-overwrite policy, all gated by a single confirmation handler.
//! A check either passes or asks the handler; there is deliberately no
//! hard-block mode here.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SafetyError;

/// A replaceable `prompt -> approved?` function.
///
/// Process-wide by convention (the loop is strictly serial, so there is
/// never more than one confirmation in flight), but held as a value rather
/// than a true global so tests can construct their own handler.
pub type ConfirmationHandler = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// The default handler: deny everything. Production wires a REPL prompt;
/// tests install a stub.
pub fn deny_all() -> ConfirmationHandler {
    Arc::new(|_prompt: &str| false)
}

/// `(regex, human label)` pairs identifying destructive shell patterns.
static DANGEROUS_COMMAND_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"\brm\b").unwrap(), "rm"),
        (Regex::new(r"\bunlink\b").unwrap(), "unlink"),
        (Regex::new(r"\brmdir\b").unwrap(), "rmdir"),
        (Regex::new(r"\bshred\b").unwrap(), "shred"),
        (Regex::new(r"\btruncate\b").unwrap(), "truncate"),
        (Regex::new(r">\s*/dev/null").unwrap(), "redirect to /dev/null"),
        (
            Regex::new(r">\s*\S+\.(ts|json)\b").unwrap(),
            "redirect overwriting a .ts/.json file",
        ),
        (Regex::new(r"\bgit\s+clean\b").unwrap(), "git clean"),
        (
            Regex::new(r"\bgit\s+checkout\s+--\s+\.").unwrap(),
            "git checkout -- .",
        ),
        (
            Regex::new(r"\bgit\s+reset\s+--hard\b").unwrap(),
            "git reset --hard",
        ),
    ]
});

/// Relative paths that may not be blind-overwritten by `write_file`.
pub const PROTECTED_PATHS: &[&str] = &[
    "package.json",
    "package-lock.json",
    "tsconfig.json",
    ".gitignore",
    ".env",
    ".env.example",
    "node_modules",
];

/// Owns the project root and confirmation handler; exposes the three pure
/// checkers (command safety, sandbox containment, protected overwrite)
/// plus the write/edit compositions.
#[derive(Clone)]
pub struct SafetyLayer {
    project_root: PathBuf,
    confirm: Arc<Mutex<ConfirmationHandler>>,
}

impl SafetyLayer {
    /// Captures `project_root` (canonicalized) at construction; this is
    /// treated as immutable for the process lifetime.
    pub fn new(project_root: impl Into<PathBuf>, confirm: ConfirmationHandler) -> Self {
        let project_root = project_root.into();
        let project_root = project_root.canonicalize().unwrap_or(project_root);
        Self {
            project_root,
            confirm: Arc::new(Mutex::new(confirm)),
        }
    }

    /// Atomically replace the confirmation handler.
    pub fn set_confirmation_handler(&self, handler: ConfirmationHandler) {
        *self.confirm.lock().unwrap() = handler;
    }

    fn ask(&self, prompt: &str) -> bool {
        let handler = self.confirm.lock().unwrap().clone();
        handler(prompt)
    }

    /// Command safety: deny destructive shell patterns unless confirmed.
    pub fn check_command_safety(&self, command: &str) -> Result<(), SafetyError> {
        for (pattern, label) in DANGEROUS_COMMAND_PATTERNS.iter() {
            if pattern.is_match(command) {
                let prompt = format!("Run potentially dangerous command ({label}): {command}?");
                if self.ask(&prompt) {
                    return Ok(());
                }
                return Err(SafetyError::CommandDenied {
                    label: label.to_string(),
                    command: command.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Path sandbox: a path is inside the project iff, after absolute
    /// normalization, it is equal to or a descendant of the project root.
    pub fn check_path_sandbox(&self, path: &Path) -> Result<(), SafetyError> {
        let normalized = normalize(path);
        if normalized.starts_with(&self.project_root) {
            return Ok(());
        }
        let prompt = format!(
            "Access path outside the project ({} vs {})?",
            normalized.display(),
            self.project_root.display()
        );
        if self.ask(&prompt) {
            return Ok(());
        }
        Err(SafetyError::PathDenied {
            path: normalized.display().to_string(),
            root: self.project_root.display().to_string(),
        })
    }

    /// Protected overwrite: `write_file` may not blind-overwrite a fixed
    /// list of relative paths without confirmation.
    pub fn check_protected_overwrite(&self, path: &Path) -> Result<(), SafetyError> {
        let Ok(relative) = path.strip_prefix(&self.project_root) else {
            return Ok(());
        };
        let relative_str = relative.to_string_lossy();
        let is_protected = PROTECTED_PATHS.iter().any(|p| {
            relative_str == *p || relative_str.starts_with(&format!("{p}/"))
        });
        if !is_protected {
            return Ok(());
        }
        let prompt = format!("Overwrite protected file '{relative_str}'?");
        if self.ask(&prompt) {
            return Ok(());
        }
        Err(SafetyError::ProtectedOverwrite {
            path: relative_str.to_string(),
        })
    }

    /// Write-tool safety = sandbox then protected-overwrite.
    pub fn check_write_safety(&self, path: &Path) -> Result<(), SafetyError> {
        let normalized = normalize(path);
        self.check_path_sandbox(&normalized)?;
        self.check_protected_overwrite(&normalized)
    }

    /// Edit-tool safety = sandbox only.
    pub fn check_edit_safety(&self, path: &Path) -> Result<(), SafetyError> {
        let normalized = normalize(path);
        self.check_path_sandbox(&normalized)
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

/// Absolute-path normalization without requiring the path to exist:
/// resolve `.`/`..` components against cwd, but tolerate missing files
/// (unlike `Path::canonicalize`, which requires existence).
fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        use std::path::Component;
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn always_approve() -> ConfirmationHandler {
        Arc::new(|_| true)
    }

    #[test]
    fn safe_command_never_asks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let handler: ConfirmationHandler = Arc::new(move |_| {
            calls2.fetch_add(1, Ordering::SeqCst);
            true
        });
        let layer = SafetyLayer::new(std::env::temp_dir(), handler);
        layer.check_command_safety("ls -la").unwrap();
        layer.check_command_safety("cargo build").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dangerous_command_always_asks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let handler: ConfirmationHandler = Arc::new(move |_| {
            calls2.fetch_add(1, Ordering::SeqCst);
            true
        });
        let layer = SafetyLayer::new(std::env::temp_dir(), handler);
        layer.check_command_safety("rm -rf src").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dangerous_command_denied_by_default() {
        let layer = SafetyLayer::new(std::env::temp_dir(), deny_all());
        let err = layer.check_command_safety("git reset --hard").unwrap_err();
        assert!(err.to_string().contains("Denied"));
    }

    #[test]
    fn sandbox_admits_descendants_and_rejects_others() {
        let root = std::env::temp_dir().join("sandbox-test-root");
        std::fs::create_dir_all(&root).unwrap();
        let layer = SafetyLayer::new(&root, deny_all());

        layer.check_path_sandbox(&root.join("src/main.rs")).unwrap();
        layer.check_path_sandbox(&root.join("a/../b.rs")).unwrap();

        let outside = std::env::temp_dir().join("elsewhere/file.rs");
        assert!(layer.check_path_sandbox(&outside).is_err());
    }

    #[test]
    fn protected_overwrite_requires_confirmation() {
        let root = std::env::temp_dir().join("protected-test-root");
        std::fs::create_dir_all(&root).unwrap();
        let layer = SafetyLayer::new(&root, deny_all());
        let err = layer
            .check_protected_overwrite(&root.join("package.json"))
            .unwrap_err();
        assert!(err.to_string().contains("protected"));

        let approved = SafetyLayer::new(&root, always_approve());
        approved
            .check_protected_overwrite(&root.join("package.json"))
            .unwrap();
    }

    #[test]
    fn non_protected_paths_pass_without_confirmation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let root = std::env::temp_dir().join("nonprotected-test-root");
        std::fs::create_dir_all(&root).unwrap();
        let handler: ConfirmationHandler = Arc::new(move |_| {
            calls2.fetch_add(1, Ordering::SeqCst);
            true
        });
        let layer = SafetyLayer::new(&root, handler);
        layer.check_protected_overwrite(&root.join("src/lib.rs")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
