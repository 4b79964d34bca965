//! Fixed-point import resolution.
//!
//! Each round sweeps the unit's files, asks the oracle for unresolved names,
//! and applies a fix only when exactly one candidate exists. A fix can expose
//! or shadow other names, so the sweep repeats until a round applies nothing;
//! a round bound guards against oscillation.

use std::path::{Path, PathBuf};

use anyhow::Result;
use indexmap::IndexSet;

use crate::{
    project::Project,
    util::apply_text_edits,
};

#[derive(Debug, Default)]
pub struct SweepOutcome {
    /// Files left with names that had zero or multiple import candidates.
    pub flagged: IndexSet<PathBuf>,
    /// Total fixes applied across all rounds.
    pub applied: usize,
    pub rounds: u32,
}

pub fn resolve_imports(
    project: &mut Project,
    files: &[PathBuf],
    max_rounds: u32,
) -> Result<SweepOutcome> {
    let mut outcome = SweepOutcome::default();

    loop {
        outcome.rounds += 1;
        outcome.flagged.clear();
        let mut applied_this_round = 0;

        for file in files {
            match resolve_file(project, file, &mut outcome.flagged) {
                Ok(applied) => applied_this_round += applied,
                Err(error) => {
                    // a file the oracle cannot analyze is flagged for manual
                    // cleanup; it must not take the rest of the unit with it
                    log::warn!(
                        "import resolution failed for {}: {error:#}",
                        file.display()
                    );
                    outcome.flagged.insert(file.clone());
                }
            }
        }

        outcome.applied += applied_this_round;
        if applied_this_round == 0 {
            break;
        }
        if outcome.rounds >= max_rounds {
            log::warn!(
                "import resolution did not settle after {max_rounds} rounds, stopping"
            );
            break;
        }
    }
    Ok(outcome)
}

fn resolve_file(
    project: &mut Project,
    file: &Path,
    flagged: &mut IndexSet<PathBuf>,
) -> Result<usize> {
    let diagnostics = project.diagnostics(file)?;
    if diagnostics.is_empty() {
        return Ok(0);
    }

    let mut edits = Vec::new();
    let mut applied = 0;
    let mut unresolved = false;
    for diagnostic in &diagnostics {
        let mut fixes = project.fixes_for(file, diagnostic)?;
        match fixes.len() {
            1 => {
                edits.append(&mut fixes[0].edits);
                applied += 1;
            }
            0 => {
                log::debug!(
                    "no import candidate for '{}' in {}",
                    diagnostic.name,
                    file.display()
                );
                unresolved = true;
            }
            n => {
                log::debug!(
                    "{n} import candidates for '{}' in {}, skipping",
                    diagnostic.name,
                    file.display()
                );
                unresolved = true;
            }
        }
    }

    if !edits.is_empty() {
        let text = project
            .text(file)
            .map(str::to_owned)
            .unwrap_or_default();
        project.update_file(file, apply_text_edits(&text, &edits))?;
        if let Some(organize) = project.organize_import_edits(file)? {
            let current = project
                .text(file)
                .map(str::to_owned)
                .unwrap_or_default();
            project.update_file(file, apply_text_edits(&current, &organize))?;
        }
    }
    if unresolved {
        flagged.insert(file.to_path_buf());
    }
    Ok(applied)
}
