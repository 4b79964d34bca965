//! Versioned file tracking and the name-resolution oracle.
//!
//! The project owns the in-memory text of every file participating in a unit
//! migration (the unit's own files plus dependency-unit files, which are
//! consulted for exports but never modified). Analyses are cached per file
//! version; any text update invalidates the cache for that file only.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result, bail};
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use rustc_hash::FxHasher;

use crate::{
    syntax::{self, Program, StmtKind, TokenKind, tokenize},
    util::{self, TextEdit},
};

type FxIndexMap<K, V> = IndexMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

/// Globals that never need an import. Covers the framework accessor, the
/// runtime environment, and the built-in types the legacy sources lean on.
const KNOWN_GLOBALS: &[&str] = &[
    "registrar",
    "window",
    "document",
    "console",
    "undefined",
    "Math",
    "JSON",
    "Date",
    "Promise",
    "Array",
    "Object",
    "String",
    "Number",
    "Boolean",
    "Function",
    "RegExp",
    "Error",
    "TypeError",
    "Map",
    "Set",
    "Infinity",
    "NaN",
    "Partial",
    "Readonly",
    "Record",
    "Pick",
    "Omit",
];

/// Keywords that introduce the identifier they are followed by, so that
/// identifier is a declaration site, not a reference.
const DECL_INTRODUCERS: &[&str] = &[
    "class",
    "interface",
    "function",
    "enum",
    "namespace",
    "module",
    "type",
    "as",
    "let",
    "const",
    "var",
    "import",
];

/// An unresolved capitalized identifier reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub name: String,
    pub offset: usize,
}

/// One applicable remedy for a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFix {
    pub description: String,
    pub edits: Vec<TextEdit>,
}

#[derive(Debug)]
struct Analysis {
    version: u32,
    /// Names bound in this file: imports, declarations, raw-scanned decls.
    declared: IndexSet<String>,
    exported: IndexSet<String>,
}

#[derive(Debug)]
struct TrackedFile {
    unit: String,
    unit_root: PathBuf,
    text: String,
    version: u32,
    dirty: bool,
    analysis: Option<Analysis>,
}

#[derive(Debug, Default)]
pub struct Project {
    files: FxIndexMap<PathBuf, TrackedFile>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a file from disk. `unit_root` is the source root the file's
    /// module specifiers are computed against.
    pub fn add_file(&mut self, unit: &str, unit_root: &Path, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        self.add_file_with_text(unit, unit_root, path, text);
        Ok(())
    }

    pub fn add_file_with_text(&mut self, unit: &str, unit_root: &Path, path: &Path, text: String) {
        self.files.insert(
            path.to_path_buf(),
            TrackedFile {
                unit: unit.to_owned(),
                unit_root: unit_root.to_path_buf(),
                text,
                version: 1,
                dirty: false,
                analysis: None,
            },
        );
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn text(&self, path: &Path) -> Option<&str> {
        self.files.get(path).map(|f| f.text.as_str())
    }

    pub fn version(&self, path: &Path) -> Option<u32> {
        self.files.get(path).map(|f| f.version)
    }

    /// Replace a file's text, bumping its version and invalidating cached
    /// analysis. Identical text is a no-op. Returns whether the text changed.
    pub fn update_file(&mut self, path: &Path, text: String) -> Result<bool> {
        let Some(file) = self.files.get_mut(path) else {
            bail!("untracked file {}", path.display());
        };
        if file.text == text {
            return Ok(false);
        }
        file.text = text;
        file.version += 1;
        file.dirty = true;
        file.analysis = None;
        Ok(true)
    }

    pub fn parse(&self, path: &Path) -> Result<Program> {
        let Some(file) = self.files.get(path) else {
            bail!("untracked file {}", path.display());
        };
        syntax::parse_program(&file.text)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Names exported from a file.
    pub fn exports_of(&mut self, path: &Path) -> Result<IndexSet<String>> {
        self.ensure_analysis(path)?;
        let file = &self.files[path];
        Ok(file
            .analysis
            .as_ref()
            .map(|a| a.exported.clone())
            .unwrap_or_default())
    }

    /// Capitalized identifiers used but neither declared, imported, nor
    /// global. One diagnostic per distinct name, at its first use.
    pub fn diagnostics(&mut self, path: &Path) -> Result<Vec<Diagnostic>> {
        self.ensure_analysis(path)?;
        let file = &self.files[path];
        let Some(analysis) = file.analysis.as_ref() else {
            return Ok(Vec::new());
        };

        let tokens = tokenize(&file.text)?;
        let mut diagnostics = Vec::new();
        let mut seen: IndexSet<&str> = IndexSet::new();
        let mut prev_text: Option<&str> = None;
        let mut prev_punct: Option<&str> = None;

        for token in &tokens {
            if token.kind == TokenKind::Comment {
                continue;
            }
            let text = token.text(&file.text);
            if token.kind != TokenKind::Ident {
                prev_punct = (token.kind == TokenKind::Punct).then_some(text);
                prev_text = None;
                continue;
            }
            let after_dot = prev_punct == Some(".");
            let introduced = prev_text.is_some_and(|p| DECL_INTRODUCERS.contains(&p));
            prev_punct = None;
            prev_text = Some(text);

            if after_dot || introduced || !looks_like_type_name(text) {
                continue;
            }
            if analysis.declared.contains(text) || KNOWN_GLOBALS.contains(&text) {
                continue;
            }
            if seen.insert(text) {
                diagnostics.push(Diagnostic {
                    name: text.to_owned(),
                    offset: token.start,
                });
            }
        }
        Ok(diagnostics)
    }

    /// Candidate import fixes for a diagnostic: one per tracked file that
    /// exports the missing name. Same-unit candidates use a relative
    /// specifier, cross-unit candidates the `@<unit>/...` path alias.
    pub fn fixes_for(&mut self, path: &Path, diagnostic: &Diagnostic) -> Result<Vec<CodeFix>> {
        let candidates: Vec<PathBuf> = self
            .files
            .keys()
            .filter(|p| p.as_path() != path)
            .cloned()
            .collect();

        let Some(from) = self.files.get(path) else {
            bail!("untracked file {}", path.display());
        };
        let from_unit = from.unit.clone();
        let insert_at = self.import_insert_offset(path)?;

        let mut fixes = Vec::new();
        for candidate in candidates {
            // a candidate that cannot be analyzed exports nothing
            let exports = match self.exports_of(&candidate) {
                Ok(exports) => exports,
                Err(error) => {
                    log::debug!(
                        "skipping candidate {}: {error:#}",
                        candidate.display()
                    );
                    continue;
                }
            };
            if !exports.contains(&diagnostic.name) {
                continue;
            }
            let other = &self.files[&candidate];
            let specifier = if other.unit == from_unit {
                util::relative_import_path(path, &candidate)
            } else {
                cross_unit_specifier(&other.unit, &other.unit_root, &candidate)
            };
            fixes.push(CodeFix {
                description: format!("import '{}' from '{specifier}'", diagnostic.name),
                edits: vec![TextEdit::insert(
                    insert_at,
                    format!("import {{ {} }} from '{specifier}';\n", diagnostic.name),
                )],
            });
        }
        Ok(fixes)
    }

    /// Edits that merge, sort, and deduplicate a file's import declarations
    /// into one block at the first import's position. `None` when the file
    /// has no imports or they are already organized.
    pub fn organize_import_edits(&mut self, path: &Path) -> Result<Option<Vec<TextEdit>>> {
        let program = self.parse(path)?;
        let Some(file) = self.files.get(path) else {
            bail!("untracked file {}", path.display());
        };

        let mut spans = Vec::new();
        let mut merged: FxIndexMap<String, IndexSet<(String, Option<String>)>> =
            FxIndexMap::default();
        for stmt in &program.statements {
            let StmtKind::Import(import) = &stmt.node else {
                continue;
            };
            if import.default_name.is_some() || import.namespace_alias.is_some() {
                // merging would drop the clause; leave such files alone
                return Ok(None);
            }
            spans.push(stmt.span);
            let names = merged.entry(import.module.clone()).or_default();
            for name in &import.names {
                names.insert((name.name.clone(), name.alias.clone()));
            }
        }
        if spans.is_empty() {
            return Ok(None);
        }

        merged.sort_keys();
        let mut block = String::new();
        for (module, names) in &merged {
            let mut sorted: Vec<&(String, Option<String>)> = names.iter().collect();
            sorted.sort();
            let rendered: Vec<String> = sorted
                .iter()
                .map(|(name, alias)| match alias {
                    Some(alias) => format!("{name} as {alias}"),
                    None => name.clone(),
                })
                .collect();
            block.push_str(&format!(
                "import {{ {} }} from '{module}';\n",
                rendered.join(", ")
            ));
        }

        // the first import span absorbs the merged block; the rest (plus
        // their trailing newline) are deleted
        let mut edits = Vec::new();
        let (first_start, first_end) = spans[0];
        let first_end = skip_newline(&file.text, first_end);
        edits.push(TextEdit::replace(
            first_start,
            first_end - first_start,
            block.clone(),
        ));
        for &(start, end) in &spans[1..] {
            let end = skip_newline(&file.text, end);
            edits.push(TextEdit::replace(start, end - start, String::new()));
        }

        let current = &file.text[first_start..skip_newline(&file.text, spans[0].1)];
        if spans.len() == 1 && current == block {
            return Ok(None);
        }
        Ok(Some(edits))
    }

    /// Byte offset where a new import should be inserted: after the last
    /// existing top-level import, else at the start of the file.
    pub fn import_insert_offset(&self, path: &Path) -> Result<usize> {
        let program = self.parse(path)?;
        let Some(file) = self.files.get(path) else {
            bail!("untracked file {}", path.display());
        };
        let last_import = program
            .statements
            .iter()
            .rev()
            .find(|stmt| matches!(stmt.node, StmtKind::Import(_)));
        Ok(match last_import {
            Some(stmt) => skip_newline(&file.text, stmt.span.1),
            None => 0,
        })
    }

    /// Write every dirty file back to disk. Returns the written paths.
    pub fn persist_all(&mut self) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for (path, file) in &mut self.files {
            if !file.dirty {
                continue;
            }
            util::save_file(path, &file.text)?;
            file.dirty = false;
            written.push(path.clone());
        }
        Ok(written)
    }

    fn ensure_analysis(&mut self, path: &Path) -> Result<()> {
        let Some(file) = self.files.get(path) else {
            bail!("untracked file {}", path.display());
        };
        if file
            .analysis
            .as_ref()
            .is_some_and(|a| a.version == file.version)
        {
            return Ok(());
        }
        let analysis = analyze(&file.text, file.version)
            .with_context(|| format!("failed to analyze {}", path.display()))?;
        if let Some(file) = self.files.get_mut(path) {
            file.analysis = Some(analysis);
        }
        Ok(())
    }
}

fn analyze(text: &str, version: u32) -> Result<Analysis> {
    let program = syntax::parse_program(text)?;
    let mut declared = IndexSet::new();
    let mut exported = IndexSet::new();

    for stmt in &program.statements {
        match &stmt.node {
            StmtKind::Import(import) => {
                if let Some(default) = &import.default_name {
                    declared.insert(default.clone());
                }
                if let Some(alias) = &import.namespace_alias {
                    declared.insert(alias.clone());
                }
                for name in &import.names {
                    declared.insert(name.local().to_owned());
                }
            }
            StmtKind::Class(class) => {
                declared.insert(class.name.clone());
                if class.exported {
                    exported.insert(class.name.clone());
                }
            }
            StmtKind::Function(function) => {
                declared.insert(function.name.clone());
                if function.exported {
                    exported.insert(function.name.clone());
                }
            }
            StmtKind::Interface(interface) => {
                declared.insert(interface.name.clone());
                if interface.exported {
                    exported.insert(interface.name.clone());
                }
            }
            StmtKind::Var(var) => {
                declared.insert(var.name.clone());
                if var.exported {
                    exported.insert(var.name.clone());
                }
            }
            StmtKind::Raw(raw) => scan_raw_declarations(raw, &mut declared, &mut exported),
            _ => {}
        }
    }
    Ok(Analysis {
        version,
        declared,
        exported,
    })
}

/// Declarations inside raw statements (enums, type aliases, anything the
/// statement parser passed through) still count as bound names.
fn scan_raw_declarations(raw: &str, declared: &mut IndexSet<String>, exported: &mut IndexSet<String>) {
    static DECL_RE: OnceLock<Regex> = OnceLock::new();
    let re = DECL_RE.get_or_init(|| {
        Regex::new(
            r"(?m)^\s*(export\s+)?(?:declare\s+)?(?:abstract\s+)?(?:class|interface|enum|type|function|const|let|var)\s+([A-Za-z_$][A-Za-z0-9_$]*)",
        )
        .unwrap()
    });
    for captures in re.captures_iter(raw) {
        if let Some(name) = captures.get(2) {
            declared.insert(name.as_str().to_owned());
            if captures.get(1).is_some() {
                exported.insert(name.as_str().to_owned());
            }
        }
    }
}

fn looks_like_type_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(char::is_uppercase) && name.chars().any(char::is_lowercase)
}

fn skip_newline(text: &str, offset: usize) -> usize {
    if text.as_bytes().get(offset) == Some(&b'\n') {
        offset + 1
    } else {
        offset
    }
}

/// Module specifier for an import that crosses unit boundaries, using the
/// `@<unit>/...` path alias wired up in the generated project configuration.
fn cross_unit_specifier(unit: &str, unit_root: &Path, target: &Path) -> String {
    let relative = target.strip_prefix(unit_root).unwrap_or(target);
    let mut joined = String::new();
    for component in relative.components() {
        if !joined.is_empty() {
            joined.push('/');
        }
        joined.push_str(&component.as_os_str().to_string_lossy());
    }
    let trimmed = joined.strip_suffix(".ts").unwrap_or(&joined);
    format!("@{unit}/{trimmed}")
}
