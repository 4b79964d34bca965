//! Build-unit descriptor parsing.
//!
//! Each unit carries an XML descriptor (`<unit>.iml`) whose module-typed
//! order entries name the units it depends on. The descriptors are
//! tool-generated and regular, so attribute extraction is enough; a missing
//! descriptor simply means no dependencies.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

pub fn referenced_units(descriptor_path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(descriptor_path) else {
        log::debug!("no descriptor at {}", descriptor_path.display());
        return Vec::new();
    };
    parse_referenced_units(&content)
}

fn parse_referenced_units(content: &str) -> Vec<String> {
    static ENTRY_RE: OnceLock<Regex> = OnceLock::new();
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    let entry_re = ENTRY_RE.get_or_init(|| Regex::new(r"<orderEntry[^>]*>").unwrap());
    let name_re = NAME_RE.get_or_init(|| Regex::new(r#"module-name="([^"]+)""#).unwrap());

    let mut units = Vec::new();
    for entry in entry_re.find_iter(content) {
        let tag = entry.as_str();
        if !tag.contains(r#"type="module""#) {
            continue;
        }
        if let Some(captures) = name_re.captures(tag) {
            let name = captures[1].to_owned();
            if !units.contains(&name) {
                units.push(name);
            }
        }
    }
    units
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const DESCRIPTOR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<module type="JAVA_MODULE" version="4">
  <component name="NewModuleRootManager">
    <orderEntry type="sourceFolder" forTests="false" />
    <orderEntry type="module" module-name="platform" />
    <orderEntry type="module" module-name="search" exported="" />
    <orderEntry type="library" name="junit" level="project" />
  </component>
</module>
"#;

    #[test]
    fn module_entries_are_extracted_in_order() {
        assert_eq!(
            parse_referenced_units(DESCRIPTOR),
            vec!["platform".to_owned(), "search".to_owned()]
        );
    }

    #[test]
    fn missing_descriptor_means_no_dependencies() {
        assert_eq!(
            referenced_units(Path::new("/nonexistent/widgets.iml")),
            Vec::<String>::new()
        );
    }
}
