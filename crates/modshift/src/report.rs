//! Per-unit and per-run outcome reporting.
//!
//! Migration keeps going past recoverable problems; everything that needs a
//! human is collected here and logged at the end of the run.

use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct UnitReport {
    pub unit: String,
    pub files_processed: usize,
    /// Files pass one could not transform, with the reason. These files were
    /// left exactly as found.
    pub transform_errors: Vec<(PathBuf, String)>,
    /// Files still containing names with zero or multiple import candidates.
    pub unresolved_imports: Vec<PathBuf>,
    pub imports_added: usize,
    /// Modules this unit registered entries against although they are owned
    /// by another unit; those entries were left imperative.
    pub foreign_registrations: Vec<String>,
}

impl UnitReport {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            ..Self::default()
        }
    }

    pub fn needs_manual_cleanup(&self) -> bool {
        !self.transform_errors.is_empty()
            || !self.unresolved_imports.is_empty()
            || !self.foreign_registrations.is_empty()
    }

    pub fn log_summary(&self) {
        log::info!(
            "unit '{}': {} files processed, {} imports added",
            self.unit,
            self.files_processed,
            self.imports_added
        );
        for (path, reason) in &self.transform_errors {
            log::warn!(
                "unit '{}': left {} untouched: {reason}",
                self.unit,
                path.display()
            );
        }
        for path in &self.unresolved_imports {
            log::warn!(
                "unit '{}': unresolved imports remain in {}",
                self.unit,
                path.display()
            );
        }
        for module in &self.foreign_registrations {
            log::warn!(
                "unit '{}': registrations against foreign module '{module}' were kept \
                 imperative and need manual migration",
                self.unit
            );
        }
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub units: Vec<UnitReport>,
    pub skipped_migrated: Vec<String>,
}

impl RunReport {
    pub fn log_summary(&self) {
        for unit in &self.units {
            unit.log_summary();
        }
        if !self.skipped_migrated.is_empty() {
            log::info!(
                "already migrated, skipped: {}",
                self.skipped_migrated.join(", ")
            );
        }
        let cleanup: Vec<&str> = self
            .units
            .iter()
            .filter(|u| u.needs_manual_cleanup())
            .map(|u| u.unit.as_str())
            .collect();
        if cleanup.is_empty() {
            log::info!("migration finished, {} unit(s) migrated", self.units.len());
        } else {
            log::warn!(
                "migration finished, manual cleanup needed in: {}",
                cleanup.join(", ")
            );
        }
    }
}
