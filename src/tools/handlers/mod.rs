// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tool handler implementations: the eight built-in tools.
//!
//! One file per tool: `read_file`, `write_file`, `edit_file`,
//! `insert_lines`, `delete_lines`, `list_dir`, `grep_search`, `run_command`.

mod delete_lines;
mod edit_file;
mod grep_search;
mod insert_lines;
mod list_dir;
mod read_file;
mod run_command;
mod write_file;

pub use delete_lines::DeleteLinesHandler;
pub use edit_file::EditFileHandler;
pub use grep_search::GrepSearchHandler;
pub use insert_lines::InsertLinesHandler;
pub use list_dir::ListDirHandler;
pub use read_file::ReadFileHandler;
pub use run_command::RunCommandHandler;
pub use write_file::WriteFileHandler;

/// Split file content into the lines the line-numbered tools operate on:
/// no special handling for a trailing newline beyond the fact that
/// `str::lines()` does not yield a final empty element for one.
pub(crate) fn split_lines(content: &str) -> Vec<String> {
    content.lines().map(|l| l.to_string()).collect()
}

/// Re-join lines with `\n`, adding a trailing newline iff the original
/// content had one. This is how `read_file` -> `write_file` round-trips
/// stay byte-identical.
pub(crate) fn join_lines(lines: &[String], trailing_newline: bool) -> String {
    let mut out = lines.join("\n");
    if trailing_newline && !lines.is_empty() {
        out.push('\n');
    }
    out
}

pub(crate) fn had_trailing_newline(content: &str) -> bool {
    content.ends_with('\n')
}

/// Resolve a possibly-relative path against the process cwd.
pub(crate) fn resolve_path(path: &str) -> std::path::PathBuf {
    let p = std::path::Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(p)
    }
}
