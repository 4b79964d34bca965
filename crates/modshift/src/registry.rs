//! Registration metadata registry.
//!
//! The registry is the single source of truth for registration modules
//! discovered during the extraction pass: canonical module names, the entries
//! registered against them, and the per-file identifier aliases used to refer
//! to them. It is an explicit object passed by reference for the duration of
//! one run, never ambient state, so repeated runs (and tests) do not leak.

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHasher;

use crate::util::is_string_literal;

type FxIndexMap<K, V> = IndexMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

/// Entry kind that sorts before all others: later rewriting depends on
/// controllers being locatable by name before other kinds are appended.
pub const CONTROLLER_KIND: &str = "controller";

/// One registration call's payload, immutable once captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationEntry {
    /// Call name: controller, service, directive, filter, ... (open set).
    pub kind: String,
    /// Raw first-argument text (a quoted literal or an identifier).
    pub name_text: String,
    /// Raw second-argument text, the registered function or value.
    pub target_text: String,
}

/// Where and how a module-creation call was observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleOrigin {
    pub file: PathBuf,
    /// Logical (dotted namespace) module name of the declaring file.
    pub scope: Option<String>,
    /// Variable the creation call was assigned to, if any.
    pub var_ident: Option<String>,
    /// Raw first argument of the creation call.
    pub name_raw: String,
    /// Raw second argument of the creation call (dependency list).
    pub deps_raw: String,
}

/// An identifier observed to denote a registration module within one file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AliasRecord {
    file: PathBuf,
    scope: Option<String>,
    identifier: String,
}

#[derive(Debug, Default)]
struct ModuleRecord {
    origin: Option<ModuleOrigin>,
    /// kind -> entries, append-only, capture order preserved per kind.
    entries: FxIndexMap<String, Vec<RegistrationEntry>>,
    aliases: Vec<AliasRecord>,
    /// Files that appended entries to this module.
    contributors: IndexSet<PathBuf>,
}

/// Run-wide registry of registration modules.
#[derive(Debug, Default)]
pub struct RegistrationRegistry {
    modules: FxIndexMap<String, ModuleRecord>,
}

impl RegistrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a module creation, including the identifier alias (if the call
    /// was assigned to a variable) and the raw creation arguments needed to
    /// re-emit the call during synthesis.
    pub fn record_creation(
        &mut self,
        canonical_name: &str,
        file: &Path,
        scope: Option<&str>,
        var_ident: Option<&str>,
        name_raw: &str,
        deps_raw: &str,
    ) {
        let record = self.modules.entry(canonical_name.to_owned()).or_default();
        if record.origin.is_none() {
            record.origin = Some(ModuleOrigin {
                file: file.to_path_buf(),
                scope: scope.map(str::to_owned),
                var_ident: var_ident.map(str::to_owned),
                name_raw: name_raw.to_owned(),
                deps_raw: deps_raw.to_owned(),
            });
        } else {
            log::warn!(
                "module '{canonical_name}' created more than once, keeping first origin \
                 ({})",
                file.display()
            );
        }
        if let Some(ident) = var_ident {
            self.record_alias(canonical_name, file, scope, ident);
        }
    }

    /// Record that `identifier` denotes `canonical_name` within `file`.
    pub fn record_alias(
        &mut self,
        canonical_name: &str,
        file: &Path,
        scope: Option<&str>,
        identifier: &str,
    ) {
        let record = self.modules.entry(canonical_name.to_owned()).or_default();
        record.aliases.push(AliasRecord {
            file: file.to_path_buf(),
            scope: scope.map(str::to_owned),
            identifier: identifier.to_owned(),
        });
    }

    /// Resolve an identifier to the canonical module name it denotes.
    ///
    /// A scope-qualified match wins over an unscoped one. A miss means "not
    /// yet a known registration", never an error: registrations are
    /// discovered in file order and forward references are expected.
    pub fn lookup_canonical_name(&self, identifier: &str, scope: Option<&str>) -> Option<&str> {
        if let Some(scope) = scope {
            for (name, record) in &self.modules {
                if record
                    .aliases
                    .iter()
                    .any(|a| a.identifier == identifier && a.scope.as_deref() == Some(scope))
                {
                    return Some(name);
                }
            }
        }
        for (name, record) in &self.modules {
            if record
                .aliases
                .iter()
                .any(|a| a.identifier == identifier && a.scope.is_none())
            {
                return Some(name);
            }
        }
        None
    }

    /// Resolve the raw module argument of a reference call (`registrar
    /// .module('name')`): a quoted literal names the module directly, an
    /// identifier goes through the alias table.
    pub fn lookup_module_arg(&self, raw_arg: &str, scope: Option<&str>) -> Option<String> {
        if is_string_literal(raw_arg) {
            let name = crate::util::strip_quotes(raw_arg);
            return self.modules.contains_key(name).then(|| name.to_owned());
        }
        self.lookup_canonical_name(raw_arg, scope)
            .map(str::to_owned)
    }

    /// Append entries to a module, concatenating per kind. Entries are never
    /// replaced or deduplicated; a duplicate registration is a legitimate
    /// error surfaced later, not silently merged. An empty append records
    /// nothing, in particular no contributor.
    pub fn append_entries(
        &mut self,
        canonical_name: &str,
        file: &Path,
        entries: Vec<RegistrationEntry>,
    ) {
        if entries.is_empty() {
            return;
        }
        let record = self.modules.entry(canonical_name.to_owned()).or_default();
        record.contributors.insert(file.to_path_buf());
        for entry in entries {
            record.entries.entry(entry.kind.clone()).or_default().push(entry);
        }
    }

    /// Entries grouped by kind, with `controller` first and the remaining
    /// kinds in sorted order. Capture order is preserved within a kind.
    pub fn entries_for(&self, canonical_name: &str) -> Vec<(&str, &[RegistrationEntry])> {
        let Some(record) = self.modules.get(canonical_name) else {
            return Vec::new();
        };
        let mut kinds: Vec<&str> = record.entries.keys().map(String::as_str).collect();
        kinds.sort_by_key(|kind| (*kind != CONTROLLER_KIND, *kind));
        kinds
            .into_iter()
            .map(|kind| {
                (
                    kind,
                    record.entries[kind].as_slice(),
                )
            })
            .collect()
    }

    pub fn origin(&self, canonical_name: &str) -> Option<&ModuleOrigin> {
        self.modules.get(canonical_name)?.origin.as_ref()
    }

    /// The controller registration name for a class, when that class is bound
    /// as a controller target under a quoted string literal.
    pub fn controller_name_for_target(&self, class_name: &str) -> Option<&str> {
        for record in self.modules.values() {
            if let Some(controllers) = record.entries.get(CONTROLLER_KIND) {
                for entry in controllers {
                    if entry.target_text == class_name && is_string_literal(&entry.name_text) {
                        return Some(&entry.name_text);
                    }
                }
            }
        }
        None
    }

    /// Modules that received entries from files under `source_root` but whose
    /// creation lives elsewhere. These registrations belong to the owning
    /// unit and cannot be re-emitted here; they need manual cleanup.
    pub fn foreign_contributions(&self, source_root: &Path) -> Vec<String> {
        let mut foreign = Vec::new();
        for (name, record) in &self.modules {
            let origin_inside = record
                .origin
                .as_ref()
                .is_some_and(|o| o.file.starts_with(source_root));
            let contributed_inside = record
                .contributors
                .iter()
                .any(|f| f.starts_with(source_root));
            if contributed_inside && !origin_inside {
                foreign.push(name.clone());
            }
        }
        foreign
    }
}
