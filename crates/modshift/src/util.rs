//! Small shared helpers: text edits, path arithmetic, file operations.

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// A single text replacement, expressed as a byte span in the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub start: usize,
    pub len: usize,
    pub new_text: String,
}

impl TextEdit {
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            start: at,
            len: 0,
            new_text: text.into(),
        }
    }

    pub fn replace(start: usize, len: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            len,
            new_text: text.into(),
        }
    }
}

/// Apply a set of edits to `text`.
///
/// Edits are applied in reverse span order so that earlier edits' offsets stay
/// valid while later ones are applied. Overlapping edits are a caller bug.
pub fn apply_text_edits(text: &str, edits: &[TextEdit]) -> String {
    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by_key(|e| e.start);

    let mut updated = text.to_owned();
    for edit in sorted.iter().rev() {
        let before = &updated[..edit.start];
        let after = &updated[edit.start + edit.len..];
        updated = format!("{before}{}{after}", edit.new_text);
    }
    updated
}

/// Strip a single layer of matching quotes from a literal's raw text.
pub fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if value.len() >= 2 {
        let first = bytes[0];
        let last = bytes[value.len() - 1];
        if first == last && (first == b'\'' || first == b'"' || first == b'`') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Whether a raw argument text is a quoted string literal (as opposed to an
/// identifier or other expression).
pub fn is_string_literal(value: &str) -> bool {
    value.starts_with('\'') || value.starts_with('"') || value.starts_with('`')
}

/// Compute the import specifier for `target` relative to the directory of
/// `from`, using the longest common ancestor of the two paths. The `.ts`
/// extension is stripped; same-directory targets get a `./` prefix.
pub fn relative_import_path(from: &Path, target: &Path) -> String {
    let from_dir: Vec<Component<'_>> = from
        .parent()
        .map(|p| p.components().collect())
        .unwrap_or_default();
    let target_comps: Vec<Component<'_>> = target.components().collect();

    let mut common = 0;
    while common < from_dir.len()
        && common < target_comps.len()
        && from_dir[common] == target_comps[common]
    {
        common += 1;
    }

    let mut segments: Vec<String> = Vec::new();
    for _ in common..from_dir.len() {
        segments.push("..".to_owned());
    }
    if segments.is_empty() {
        segments.push(".".to_owned());
    }
    for comp in &target_comps[common..] {
        segments.push(comp.as_os_str().to_string_lossy().into_owned());
    }

    let mut joined = segments.join("/");
    if let Some(stripped) = joined.strip_suffix(".ts") {
        joined = stripped.to_owned();
    }
    joined
}

/// Relative path from one directory to another, `/`-joined. Used for the
/// generated project-configuration path mappings.
pub fn relative_dir_path(from: &Path, target: &Path) -> String {
    let from_comps: Vec<Component<'_>> = from.components().collect();
    let target_comps: Vec<Component<'_>> = target.components().collect();

    let mut common = 0;
    while common < from_comps.len()
        && common < target_comps.len()
        && from_comps[common] == target_comps[common]
    {
        common += 1;
    }

    let mut segments: Vec<String> = Vec::new();
    for _ in common..from_comps.len() {
        segments.push("..".to_owned());
    }
    for comp in &target_comps[common..] {
        segments.push(comp.as_os_str().to_string_lossy().into_owned());
    }
    if segments.is_empty() {
        return ".".to_owned();
    }
    segments.join("/")
}

/// Write `text` to `path`, creating parent directories as needed.
pub fn save_file(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

/// Remove a file if it exists; directories are left alone.
pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        if path.is_dir() {
            log::error!("cannot remove, is a directory: {}", path.display());
            return Ok(());
        }
        fs::remove_file(path)
            .with_context(|| format!("failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Recursively copy `source` into `target`, preserving the directory layout.
pub fn copy_dir_recursive(source: &Path, target: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.with_context(|| format!("failed to walk {}", source.display()))?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .expect("walkdir yields paths under its root");
        let dest = target.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)
                .with_context(|| format!("failed to create {}", dest.display()))?;
        } else {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &dest).with_context(|| {
                format!("failed to copy {} to {}", entry.path().display(), dest.display())
            })?;
        }
    }
    Ok(())
}

/// Resolve an import specifier back to an absolute path, for round-trip
/// verification in tests.
pub fn resolve_import_path(from: &Path, specifier: &str) -> PathBuf {
    let mut dir = from.parent().map(Path::to_path_buf).unwrap_or_default();
    for segment in specifier.split('/') {
        match segment {
            "." => {}
            ".." => {
                dir.pop();
            }
            other => dir.push(other),
        }
    }
    dir
}
