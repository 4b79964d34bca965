//! Generated project configuration.
//!
//! Every migrated unit gets a `tsconfig.json` at its source root. Besides
//! configuring compilation of the flat-module sources, the file doubles as
//! the migrated marker and wires up the `@<unit>/...` path aliases that
//! cross-unit imports rely on.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde_json::{Map, Value, json};

use crate::{
    unit::MIGRATED_MARKER,
    util::{relative_dir_path, save_file},
};

/// A dependency unit as seen from the unit being configured.
#[derive(Debug, Clone)]
pub struct DepSpec {
    pub name: String,
    /// Absolute path of the dependency's source root.
    pub source_root: PathBuf,
    /// Namespace root the dependency's legacy sources nest under.
    pub namespace_root: String,
}

pub fn write(unit_name: &str, source_root: &Path, deps: &[DepSpec], base_unit: &str) -> Result<()> {
    let config = render(unit_name, source_root, deps, base_unit);
    let text = format!("{}\n", serde_json::to_string_pretty(&config)?);
    save_file(&source_root.join(MIGRATED_MARKER), &text)
}

fn render(unit_name: &str, source_root: &Path, deps: &[DepSpec], base_unit: &str) -> Value {
    let mut compiler_options = json!({
        "baseUrl": ".",
        "rootDir": ".",
        "outDir": "../generated_js",
        "target": "es5",
        "module": "commonjs",
        "moduleResolution": "node",
        "experimentalDecorators": true,
        "composite": true,
        "declaration": true,
        "declarationMap": true,
        "sourceMap": true
    });

    // the base unit depends on nothing; everything else maps each dependency
    // to its source root and references it for incremental builds
    let mut references = Vec::new();
    if unit_name != base_unit && !deps.is_empty() {
        let mut paths = Map::new();
        for dep in deps {
            let rel = relative_dir_path(source_root, &dep.source_root);
            paths.insert(
                format!("@{}/*", dep.name),
                Value::Array(vec![Value::String(format!("{rel}/*"))]),
            );
            references.push(json!({ "path": rel }));
        }
        if let Some(options) = compiler_options.as_object_mut() {
            options.insert("paths".to_owned(), Value::Object(paths));
        }
    }

    let mut config = Map::new();
    config.insert("compilerOptions".to_owned(), compiler_options);
    config.insert("include".to_owned(), json!(["./**/*.ts"]));
    if !references.is_empty() {
        config.insert("references".to_owned(), Value::Array(references));
    }
    Value::Object(config)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn dep(name: &str) -> DepSpec {
        DepSpec {
            name: name.to_owned(),
            source_root: PathBuf::from(format!("/repo/{name}/assets/ts")),
            namespace_root: format!("co.acme.{name}"),
        }
    }

    #[test]
    fn base_unit_gets_no_paths_or_references() {
        let config = render(
            "platform",
            Path::new("/repo/platform/assets/ts"),
            &[],
            "platform",
        );
        assert!(config["compilerOptions"].get("paths").is_none());
        assert!(config.get("references").is_none());
        assert_eq!(config["compilerOptions"]["outDir"], "../generated_js");
    }

    #[test]
    fn dependent_unit_maps_each_dependency() {
        let config = render(
            "widgets",
            Path::new("/repo/widgets/assets/ts"),
            &[dep("platform")],
            "platform",
        );
        assert_eq!(
            config["compilerOptions"]["paths"]["@platform/*"][0],
            "../../../platform/assets/ts/*"
        );
        assert_eq!(config["references"][0]["path"], "../../../platform/assets/ts");
    }
}
