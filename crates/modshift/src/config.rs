//! Run configuration and repository-layout detection.
//!
//! The tool runs from a repository root. The main repository is recognized by
//! its directory name and by hosting the base unit; a sub-repository is
//! recognized by its `parent-repos.json`, whose keys (in declaration order)
//! name the sibling repositories that are searched when a dependency unit is
//! not found locally. Anything else is a fatal configuration error before any
//! file is touched.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

pub const DEFAULT_NAMESPACE_PREFIX: &str = "co.acme";
pub const DEFAULT_BASE_UNIT: &str = "platform";
pub const DEFAULT_MAX_IMPORT_ROUNDS: u32 = 8;
/// File that marks a sub-repository and lists its sibling repositories.
pub const PARENT_REPOS_FILE: &str = "parent-repos.json";
/// Directory name of the main repository, as checked out next to sub-repos.
pub const MAIN_REPO_DIR: &str = "main";

/// Caller-supplied knobs, before repository detection.
#[derive(Debug, Clone)]
pub struct Options {
    /// Units to migrate; empty means every unit in the repository.
    pub units: Vec<String>,
    pub add_imports: bool,
    pub add_exports: bool,
    pub namespace_prefix: String,
    pub base_unit: String,
    pub max_import_rounds: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            units: Vec::new(),
            add_imports: true,
            add_exports: true,
            namespace_prefix: DEFAULT_NAMESPACE_PREFIX.to_owned(),
            base_unit: DEFAULT_BASE_UNIT.to_owned(),
            max_import_rounds: DEFAULT_MAX_IMPORT_ROUNDS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Repository the tool was started in.
    pub repo_root: PathBuf,
    /// The main repository (equal to `repo_root` when not in a sub-repo).
    pub main_repo_path: PathBuf,
    pub is_sub_repo: bool,
    /// Sibling repositories in declaration order, searched after `repo_root`.
    pub sibling_repos: Vec<PathBuf>,
    pub units: Vec<String>,
    pub add_imports: bool,
    pub add_exports: bool,
    pub namespace_prefix: String,
    pub base_unit: String,
    pub max_import_rounds: u32,
}

impl Config {
    pub fn detect(options: Options, cwd: &Path) -> Result<Self> {
        let repo_root = cwd.to_path_buf();
        let is_main = repo_root.file_name().is_some_and(|n| n == MAIN_REPO_DIR)
            && repo_root.join(&options.base_unit).is_dir();

        let (main_repo_path, is_sub_repo, sibling_repos) = if is_main {
            (repo_root.clone(), false, Vec::new())
        } else if repo_root.join(PARENT_REPOS_FILE).is_file() {
            let siblings = read_sibling_repos(&repo_root.join(PARENT_REPOS_FILE), &repo_root)?;
            let main = repo_root.join("..").join(MAIN_REPO_DIR);
            if !main.join(&options.base_unit).is_dir() {
                bail!(
                    "expected the main repository with the '{}' unit at {}",
                    options.base_unit,
                    main.display()
                );
            }
            (main, true, siblings)
        } else {
            bail!(
                "{} is neither the main repository nor a sub-repository \
                 (no {PARENT_REPOS_FILE} found)",
                repo_root.display()
            );
        };

        Ok(Self {
            repo_root,
            main_repo_path,
            is_sub_repo,
            sibling_repos,
            units: options.units,
            add_imports: options.add_imports,
            add_exports: options.add_exports,
            namespace_prefix: options.namespace_prefix,
            base_unit: options.base_unit,
            max_import_rounds: options.max_import_rounds,
        })
    }

    /// The ambient type declarations every migrated unit imports from must be
    /// installed in the main repository; without them nothing compiles.
    pub fn ambient_types_installed(&self) -> bool {
        self.main_repo_path
            .join("node_modules")
            .join("@types")
            .join("registrar")
            .join("index.d.ts")
            .is_file()
    }
}

/// Sibling repositories from the parent-repos file, in declaration order.
/// Each key names a repository checked out next to the current one.
fn read_sibling_repos(parent_repos: &Path, repo_root: &Path) -> Result<Vec<PathBuf>> {
    let content = std::fs::read_to_string(parent_repos)
        .with_context(|| format!("failed to read {}", parent_repos.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", parent_repos.display()))?;
    let Some(object) = value.as_object() else {
        bail!("{} must contain a JSON object", parent_repos.display());
    };
    Ok(object
        .keys()
        .map(|name| repo_root.join("..").join(name))
        .collect())
}
