//! Build units and their on-disk layout.
//!
//! A unit lives at `<repo>/<name>/`, carries a descriptor `<name>.iml`, and
//! keeps its migratable sources under `assets/ts/`. The presence of the
//! generated project configuration inside the source subtree is the marker
//! that a unit has already been migrated.

use std::path::{Path, PathBuf};

use crate::descriptor;

pub const ASSETS_DIR: &str = "assets";
pub const SOURCE_DIR: &str = "ts";
/// Written at the end of a successful migration; its presence short-circuits
/// later runs.
pub const MIGRATED_MARKER: &str = "tsconfig.json";

#[derive(Debug, Clone)]
pub struct BuildUnit {
    pub name: String,
    pub repo_root: PathBuf,
    pub assets_path: PathBuf,
    pub source_path: PathBuf,
    migrated: bool,
    dependencies: Vec<String>,
}

impl BuildUnit {
    pub fn new(name: &str, repo_root: &Path) -> Self {
        let unit_dir = repo_root.join(name);
        let assets_path = unit_dir.join(ASSETS_DIR);
        let source_path = assets_path.join(SOURCE_DIR);
        let migrated = source_path.join(MIGRATED_MARKER).is_file();
        let dependencies = descriptor::referenced_units(&unit_dir.join(format!("{name}.iml")));
        Self {
            name: name.to_owned(),
            repo_root: repo_root.to_path_buf(),
            assets_path,
            source_path,
            migrated,
            dependencies,
        }
    }

    /// Whether `repo_root` hosts a unit of this name (its descriptor exists).
    pub fn exists_in(repo_root: &Path, name: &str) -> bool {
        repo_root.join(name).join(format!("{name}.iml")).is_file()
    }

    pub fn has_source(&self) -> bool {
        self.source_path.is_dir()
    }

    pub fn is_migrated(&self) -> bool {
        self.migrated
    }

    /// Marking is monotone within a run; the on-disk marker makes it stick
    /// across runs.
    pub fn set_migrated(&mut self) {
        self.migrated = true;
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// The namespace root this unit's legacy sources nest under. A dotted
    /// unit name is already fully qualified; a bare name nests under the
    /// configured prefix.
    pub fn root_namespace(&self, prefix: &str) -> String {
        if self.name.contains('.') {
            self.name.clone()
        } else {
            format!("{prefix}.{}", self.name)
        }
    }
}
