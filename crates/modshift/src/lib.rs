//! Source-to-source migration of legacy nested-namespace modules to flat
//! import/export modules.
//!
//! The pipeline runs per build unit, in dependency order: parse every source
//! file shallowly, flatten namespace blocks, capture imperative registration
//! chains into a run-wide registry, synthesize one declarative registration
//! block per module, rewrite qualified cross-unit references, and resolve the
//! resulting free names into imports where exactly one candidate exists.

pub mod config;
pub mod descriptor;
pub mod graph;
pub mod import_resolver;
pub mod plugin;
pub mod project;
pub mod project_config;
pub mod registry;
pub mod report;
pub mod syntax;
pub mod transform;
pub mod unit;
pub mod util;
