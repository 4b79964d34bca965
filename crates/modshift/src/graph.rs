//! Unit dependency graph and run orchestration.
//!
//! Requested units are expanded to their transitive dependency closure,
//! resolving units first in the current repository and then in the sibling
//! repositories in declaration order. Units migrate in topological order so
//! a unit's dependencies are always flat modules before it is processed.

use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::{FxHashMap, FxHasher};

use crate::{
    config::Config,
    plugin::UnitMigrator,
    project_config::DepSpec,
    registry::RegistrationRegistry,
    report::RunReport,
    unit::BuildUnit,
};

type FxIndexMap<K, V> = IndexMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

#[derive(Debug, Default)]
pub struct DependencyGraph {
    units: FxIndexMap<String, BuildUnit>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&BuildUnit> {
        self.units.get(name)
    }

    pub fn mark_migrated(&mut self, name: &str) {
        if let Some(unit) = self.units.get_mut(name) {
            unit.set_migrated();
        }
    }

    /// Load a unit and, recursively, everything it depends on. The current
    /// repository is searched first, then the siblings in declaration order.
    /// A unit that exists nowhere is a fatal configuration error.
    pub fn ensure_unit(&mut self, name: &str, config: &Config) -> Result<()> {
        if self.units.contains_key(name) {
            return Ok(());
        }
        let mut repos = vec![config.repo_root.clone()];
        repos.extend(config.sibling_repos.iter().cloned());
        if config.is_sub_repo && !repos.contains(&config.main_repo_path) {
            repos.push(config.main_repo_path.clone());
        }

        let Some(repo) = repos.iter().find(|r| BuildUnit::exists_in(r, name)) else {
            bail!(
                "unit '{name}' was not found in {} or any sibling repository",
                config.repo_root.display()
            );
        };
        let unit = BuildUnit::new(name, repo);
        let dependencies = unit.dependencies().to_vec();
        self.units.insert(name.to_owned(), unit);
        for dependency in dependencies {
            self.ensure_unit(&dependency, config)
                .with_context(|| format!("while resolving dependencies of unit '{name}'"))?;
        }
        Ok(())
    }

    /// Transitive dependencies of a unit, in graph insertion order.
    pub fn closure_of(&self, name: &str) -> Vec<String> {
        let mut closure = Vec::new();
        let mut stack = vec![name.to_owned()];
        while let Some(current) = stack.pop() {
            let Some(unit) = self.units.get(&current) else {
                continue;
            };
            for dependency in unit.dependencies() {
                if dependency != name && !closure.contains(dependency) {
                    closure.push(dependency.clone());
                    stack.push(dependency.clone());
                }
            }
        }
        closure
    }

    /// The requested units plus their closure, dependencies first. A cycle
    /// among unit descriptors is a fatal error.
    pub fn migration_order(&self, requested: &[String]) -> Result<Vec<String>> {
        let mut needed: Vec<&str> = Vec::new();
        let mut stack: Vec<&str> = requested.iter().map(String::as_str).collect();
        while let Some(name) = stack.pop() {
            if needed.contains(&name) {
                continue;
            }
            needed.push(name);
            if let Some(unit) = self.units.get(name) {
                stack.extend(unit.dependencies().iter().map(String::as_str));
            }
        }

        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut nodes: FxHashMap<&str, NodeIndex> = FxHashMap::default();
        for name in self.units.keys() {
            nodes.insert(name, graph.add_node(name));
        }
        for (name, unit) in &self.units {
            for dependency in unit.dependencies() {
                if let (Some(&from), Some(&to)) = (
                    nodes.get(dependency.as_str()),
                    nodes.get(name.as_str()),
                ) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        let order = match toposort(&graph, None) {
            Ok(order) => order,
            Err(cycle) => bail!(
                "dependency cycle involving unit '{}'",
                graph[cycle.node_id()]
            ),
        };
        Ok(order
            .into_iter()
            .map(|idx| graph[idx])
            .filter(|name| needed.contains(name))
            .map(str::to_owned)
            .collect())
    }
}

pub struct Orchestrator {
    config: Config,
    graph: DependencyGraph,
    registry: RegistrationRegistry,
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            graph: DependencyGraph::new(),
            registry: RegistrationRegistry::new(),
        }
    }

    pub fn run(&mut self) -> Result<RunReport> {
        if !self.config.ambient_types_installed() {
            bail!(
                "ambient type declarations are not installed under {}; \
                 run the package installation first",
                self.config.main_repo_path.join("node_modules").display()
            );
        }

        let mut requested = if self.config.units.is_empty() {
            discover_units(&self.config.repo_root)
        } else {
            self.config.units.clone()
        };
        if requested.is_empty() {
            log::warn!("no units to migrate in {}", self.config.repo_root.display());
            return Ok(RunReport::default());
        }

        if self.config.is_sub_repo {
            // the base unit is migrated from the main repository; a sub-repo
            // run can only proceed on top of an already-flat base
            let base = BuildUnit::new(&self.config.base_unit, &self.config.main_repo_path);
            if !base.is_migrated() {
                bail!(
                    "unit '{}' in the main repository is not migrated yet; \
                     migrate the main repository first",
                    self.config.base_unit
                );
            }
        } else if BuildUnit::exists_in(&self.config.repo_root, &self.config.base_unit)
            && !requested.iter().any(|u| u == &self.config.base_unit)
        {
            requested.insert(0, self.config.base_unit.clone());
        }

        for name in &requested {
            self.graph.ensure_unit(name, &self.config)?;
        }
        let order = self.graph.migration_order(&requested)?;
        log::info!("migration order: {}", order.join(", "));

        let mut run_report = RunReport::default();
        for name in order {
            let Some(unit) = self.graph.get(&name) else {
                continue;
            };
            if unit.is_migrated() {
                log::info!("unit '{name}' is already migrated, skipping");
                run_report.skipped_migrated.push(name);
                continue;
            }
            if !unit.has_source() {
                log::info!("unit '{name}' has no migratable sources, skipping");
                continue;
            }

            let deps = self.dep_specs(&name);
            let unit = unit.clone();
            let report = UnitMigrator::new(&unit, deps, &self.config, &mut self.registry)
                .migrate()
                .with_context(|| format!("failed to migrate unit '{name}'"))?;
            run_report.units.push(report);
            self.graph.mark_migrated(&name);
        }

        run_report.log_summary();
        Ok(run_report)
    }

    /// Dependency descriptions for a unit: its transitive closure, with each
    /// dependency's source root and namespace root.
    fn dep_specs(&self, name: &str) -> Vec<DepSpec> {
        self.graph
            .closure_of(name)
            .into_iter()
            .filter_map(|dep_name| {
                let dep = self.graph.get(&dep_name)?;
                Some(DepSpec {
                    name: dep_name,
                    source_root: dep.source_path.clone(),
                    namespace_root: dep.root_namespace(&self.config.namespace_prefix),
                })
            })
            .collect()
    }
}

/// Units present in a repository: directories carrying a matching descriptor
/// and a migratable source subtree.
pub fn discover_units(repo_root: &std::path::Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(repo_root) else {
        return Vec::new();
    };
    let mut units: Vec<String> = entries
        .flatten()
        .filter(|e| e.path().is_dir())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| {
            BuildUnit::exists_in(repo_root, name) && BuildUnit::new(name, repo_root).has_source()
        })
        .collect();
    units.sort();
    units
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::Options;

    fn make_unit(repo: &Path, name: &str, deps: &[&str]) {
        let dir = repo.join(name);
        fs::create_dir_all(dir.join("assets").join("ts")).unwrap();
        let entries: String = deps
            .iter()
            .map(|d| format!("    <orderEntry type=\"module\" module-name=\"{d}\" />\n"))
            .collect();
        fs::write(
            dir.join(format!("{name}.iml")),
            format!("<module>\n  <component>\n{entries}  </component>\n</module>\n"),
        )
        .unwrap();
    }

    fn main_repo() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("main");
        fs::create_dir_all(&main).unwrap();
        (dir, main)
    }

    fn config_for(main: &Path) -> Config {
        Config::detect(Options::default(), main).unwrap()
    }

    #[test]
    fn closure_resolves_transitively_and_orders_dependencies_first() {
        let (_dir, main) = main_repo();
        make_unit(&main, "platform", &[]);
        make_unit(&main, "search", &["platform"]);
        make_unit(&main, "widgets", &["search"]);

        let config = config_for(&main);
        let mut graph = DependencyGraph::new();
        graph.ensure_unit("widgets", &config).unwrap();

        let mut closure = graph.closure_of("widgets");
        closure.sort();
        assert_eq!(closure, vec!["platform".to_owned(), "search".to_owned()]);

        let order = graph
            .migration_order(&["widgets".to_owned()])
            .unwrap();
        assert_eq!(
            order,
            vec![
                "platform".to_owned(),
                "search".to_owned(),
                "widgets".to_owned()
            ]
        );
    }

    #[test]
    fn missing_dependency_is_fatal() {
        let (_dir, main) = main_repo();
        make_unit(&main, "platform", &[]);
        make_unit(&main, "widgets", &["nonexistent"]);

        let config = config_for(&main);
        let mut graph = DependencyGraph::new();
        let err = graph.ensure_unit("widgets", &config).unwrap_err();
        assert!(format!("{err:#}").contains("nonexistent"));
    }

    #[test]
    fn dependency_cycle_is_fatal() {
        let (_dir, main) = main_repo();
        make_unit(&main, "platform", &[]);
        make_unit(&main, "a", &["b"]);
        make_unit(&main, "b", &["a"]);

        let config = config_for(&main);
        let mut graph = DependencyGraph::new();
        graph.ensure_unit("a", &config).unwrap();
        let err = graph.migration_order(&["a".to_owned()]).unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn discovery_finds_units_with_descriptor_and_sources() {
        let (_dir, main) = main_repo();
        make_unit(&main, "platform", &[]);
        make_unit(&main, "widgets", &["platform"]);
        fs::create_dir_all(main.join("docs")).unwrap();

        assert_eq!(
            discover_units(&main),
            vec!["platform".to_owned(), "widgets".to_owned()]
        );
    }
}
