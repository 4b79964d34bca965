//! Per-unit migration.
//!
//! A [`UnitMigrator`] runs the full pipeline for one build unit: back up the
//! source subtree, drop legacy build markers, write the generated project
//! configuration, run pass one over every file (a unit-wide barrier), then
//! pass two, then the import sweep, then persist. Per-file failures are
//! recorded and leave that file untouched; only environment failures abort
//! the unit.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use walkdir::WalkDir;

use crate::{
    config::Config,
    import_resolver::resolve_imports,
    project::Project,
    project_config::{self, DepSpec},
    registry::RegistrationRegistry,
    syntax::{Program, print_program},
    transform::{self, TransformOptions},
    unit::BuildUnit,
    report::UnitReport,
    util::{copy_dir_recursive, remove_file_if_exists},
};

/// Pre-migration copy of the source subtree, sibling to it.
pub const BACKUP_DIR: &str = "ts-old";
/// Legacy build-manifest file, obsolete once the unit is migrated.
pub const LEGACY_MANIFEST: &str = "tscommand.txt";
/// Legacy hand-maintained ambient declarations, superseded by imports.
pub const LEGACY_AMBIENT: &str = "ambient.d.ts";

/// Pass-one result for a file, held in memory across the unit-wide barrier.
/// Printing and reparsing between passes would lose the placeholder
/// statements, so the tree itself carries over.
struct ExtractedFile {
    program: Program,
    ambient_types: IndexSet<String>,
}

pub struct UnitMigrator<'a> {
    unit_name: String,
    assets_path: PathBuf,
    source_root: PathBuf,
    deps: Vec<DepSpec>,
    config: &'a Config,
    registry: &'a mut RegistrationRegistry,
}

impl<'a> UnitMigrator<'a> {
    pub fn new(
        unit: &BuildUnit,
        deps: Vec<DepSpec>,
        config: &'a Config,
        registry: &'a mut RegistrationRegistry,
    ) -> Self {
        Self {
            unit_name: unit.name.clone(),
            assets_path: unit.assets_path.clone(),
            source_root: unit.source_path.clone(),
            deps,
            config,
            registry,
        }
    }

    pub fn migrate(&mut self) -> Result<UnitReport> {
        let mut report = UnitReport::new(&self.unit_name);
        log::info!("migrating unit '{}'", self.unit_name);

        self.prepare_tree()?;

        let files = source_files(&self.source_root)?;
        let mut project = Project::new();
        for file in &files {
            project.add_file(&self.unit_name, &self.source_root, file)?;
        }
        for dep in &self.deps {
            for file in source_files(&dep.source_root)? {
                project.add_file(&dep.name, &dep.source_root, &file)?;
            }
        }

        // declaration files are hand-maintained and stay out of the pipeline
        let migratable: Vec<PathBuf> = files
            .iter()
            .filter(|f| {
                let declaration = f.to_string_lossy().ends_with(".d.ts");
                if declaration {
                    log::warn!("skipping declaration file {}, migrate it by hand", f.display());
                }
                !declaration
            })
            .cloned()
            .collect();

        let namespace_roots: Vec<String> =
            self.deps.iter().map(|d| d.namespace_root.clone()).collect();
        let mut extracted: FxHashMap<PathBuf, ExtractedFile> = FxHashMap::default();
        let mut failed: IndexSet<PathBuf> = IndexSet::new();

        // pass one must see every file before any synthesis happens, so that
        // registrations contributed late still land in the synthesized chain
        for file in &migratable {
            match self.extract_file(&project, file, &namespace_roots) {
                Ok(Some(state)) => {
                    extracted.insert(file.clone(), state);
                }
                Ok(None) => {
                    log::debug!("no namespace in {}, leaving as is", file.display());
                }
                Err(error) => {
                    log::error!("failed to transform {}: {error:#}", file.display());
                    report
                        .transform_errors
                        .push((file.clone(), format!("{error:#}")));
                    failed.insert(file.clone());
                }
            }
        }

        for file in &migratable {
            let Some(ExtractedFile {
                mut program,
                ambient_types,
            }) = extracted.remove(file)
            else {
                continue;
            };
            transform::synthesize(&mut program, self.registry, &ambient_types);
            if let Err(error) = project.update_file(file, print_program(&program)) {
                log::error!("failed to synthesize {}: {error:#}", file.display());
                report
                    .transform_errors
                    .push((file.clone(), format!("{error:#}")));
                failed.insert(file.clone());
            }
        }

        if self.config.add_imports {
            // files with recorded transform errors keep their original text
            // and stay out of the sweep
            let sweep_files: Vec<PathBuf> = migratable
                .iter()
                .filter(|f| !failed.contains(*f))
                .cloned()
                .collect();
            let sweep =
                resolve_imports(&mut project, &sweep_files, self.config.max_import_rounds)?;
            log::debug!(
                "unit '{}': {} import(s) added in {} round(s)",
                self.unit_name,
                sweep.applied,
                sweep.rounds
            );
            report.imports_added = sweep.applied;
            report.unresolved_imports = sweep.flagged.into_iter().collect();
        }

        report.foreign_registrations = self.registry.foreign_contributions(&self.source_root);

        let written = project.persist_all()?;
        log::info!(
            "unit '{}': wrote {} of {} file(s)",
            self.unit_name,
            written.len(),
            files.len()
        );
        report.files_processed = files.len();
        Ok(report)
    }

    /// Back up the source subtree, remove legacy markers, and write the
    /// generated project configuration.
    fn prepare_tree(&self) -> Result<()> {
        let backup = self.assets_path.join(BACKUP_DIR);
        if backup.exists() {
            log::info!(
                "backup {} already exists, keeping the earlier copy",
                backup.display()
            );
        } else {
            copy_dir_recursive(&self.source_root, &backup).with_context(|| {
                format!("failed to back up sources of unit '{}'", self.unit_name)
            })?;
        }
        remove_file_if_exists(&self.source_root.join(LEGACY_MANIFEST))?;
        remove_file_if_exists(&self.source_root.join(LEGACY_AMBIENT))?;
        project_config::write(
            &self.unit_name,
            &self.source_root,
            &self.deps,
            &self.config.base_unit,
        )
    }

    /// Pass one for a single file. `Ok(None)` means the file has no namespace
    /// block and does not participate. The tracked text is untouched here;
    /// pass two prints the tree back, so errors leave the file as it was.
    fn extract_file(
        &mut self,
        project: &Project,
        file: &Path,
        namespace_roots: &[String],
    ) -> Result<Option<ExtractedFile>> {
        let mut program = project.parse(file)?;
        if !transform::has_namespace(&program) {
            return Ok(None);
        }
        let options = TransformOptions {
            add_exports: self.config.add_exports,
            namespace_roots,
        };
        let outcome = transform::extract(file, &mut program, self.registry, &options);
        Ok(Some(ExtractedFile {
            program,
            ambient_types: outcome.ambient_types,
        }))
    }
}

/// All `.ts` files under a source root, in stable path order.
fn source_files(source_root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(source_root).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("failed to walk {}", source_root.display()))?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|e| e == "ts")
        {
            files.push(entry.path().to_path_buf());
        }
    }
    Ok(files)
}
