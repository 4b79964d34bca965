//! The two-pass file transformation.
//!
//! Pass one ([`extract`]) flattens namespace bodies to the top level, removes
//! `'use strict';` prologues, captures registration chains into the
//! [`RegistrationRegistry`] (removing them from the tree), adds export
//! modifiers, and strips known root-namespace prefixes from qualified
//! references. Pass two ([`synthesize`]) runs only after every file of the
//! unit has been through pass one, so the synthesized registration block sees
//! contributions from all files.

pub mod chains;
pub mod exporter;
pub mod rewrite;

use std::path::Path;

use indexmap::IndexSet;

use crate::{
    registry::RegistrationRegistry,
    syntax::{
        Expr, ImportDecl, ImportName, ModulePlaceholder, NamespaceDecl, Program, Stmt, StmtKind,
        VarInit,
    },
    util::{is_string_literal, strip_quotes},
};

use chains::{ChainShape, AMBIENT_TYPES_MODULE};

#[derive(Debug, Clone, Copy)]
pub struct TransformOptions<'a> {
    pub add_exports: bool,
    /// Root namespaces whose prefixes get stripped from qualified references,
    /// ordered arbitrarily; the longest match wins.
    pub namespace_roots: &'a [String],
}

/// What pass one learned about a file.
#[derive(Debug, Default)]
pub struct ExtractOutcome {
    /// Dotted namespace name of the (first) flattened namespace block.
    pub logical_module: Option<String>,
    /// Ambient interface names referenced in this file; pass two turns them
    /// into an import.
    pub ambient_types: IndexSet<String>,
    pub changed: bool,
}

/// Whether a file participates in the migration at all. Files without a
/// namespace block are left untouched by pass one.
pub fn has_namespace(program: &Program) -> bool {
    program
        .statements
        .iter()
        .any(|stmt| matches!(stmt.node, StmtKind::Namespace(_)))
}

pub fn extract(
    file: &Path,
    program: &mut Program,
    registry: &mut RegistrationRegistry,
    options: &TransformOptions<'_>,
) -> ExtractOutcome {
    let mut outcome = ExtractOutcome::default();

    flatten_namespaces(program, &mut outcome);
    let scope = outcome.logical_module.clone();

    extract_registrations(file, program, registry, scope.as_deref(), &mut outcome);

    if options.add_exports {
        for stmt in &mut program.statements {
            if exporter::add_export(&mut stmt.node) {
                outcome.changed = true;
            }
        }
    }
    for stmt in &mut program.statements {
        if let StmtKind::Class(class) = &mut stmt.node {
            if exporter::inject_ctrl_name(class, registry) {
                outcome.changed = true;
            }
        }
    }

    rewrite_references(program, options.namespace_roots, &mut outcome);
    trim_file_start(program);

    outcome
}

/// Removed statements can leave a blank gap before the first remaining
/// statement; collapse it so the file starts at column zero.
fn trim_file_start(program: &mut Program) {
    if let Some(first) = program.statements.first_mut() {
        if first.leading.trim().is_empty() {
            first.leading.clear();
        } else if let Some(idx) = first.leading.find(|c: char| !c.is_whitespace()) {
            first.leading.drain(..idx);
        }
    }
}

/// Replace every placeholder with the declarative registration chain built
/// from the registry, and prepend the ambient-type import if pass one
/// collected any. Returns whether the tree changed.
pub fn synthesize(
    program: &mut Program,
    registry: &RegistrationRegistry,
    ambient_types: &IndexSet<String>,
) -> bool {
    let mut changed = false;
    for stmt in &mut program.statements {
        if let StmtKind::ModulePlaceholder(placeholder) = &stmt.node {
            stmt.node = StmtKind::Expression(build_registration_chain(registry, placeholder));
            changed = true;
        }
    }
    if !ambient_types.is_empty() {
        let mut names: Vec<&String> = ambient_types.iter().collect();
        names.sort();
        let import = ImportDecl {
            default_name: None,
            namespace_alias: None,
            names: names.into_iter().map(ImportName::plain).collect(),
            module: AMBIENT_TYPES_MODULE.to_owned(),
        };
        program.statements.insert(
            0,
            Stmt {
                leading: String::new(),
                node: StmtKind::Import(import),
                span: (0, 0),
            },
        );
        changed = true;
    }
    changed
}

fn flatten_namespaces(program: &mut Program, outcome: &mut ExtractOutcome) {
    let original = std::mem::take(&mut program.statements);
    let mut flattened = Vec::with_capacity(original.len());
    for stmt in original {
        let StmtKind::Namespace(ns) = stmt.node else {
            flattened.push(stmt);
            continue;
        };
        let (dotted, mut body, body_trailing, levels) = unwrap_namespace(ns);
        if outcome.logical_module.is_none() {
            outcome.logical_module = Some(dotted);
        }
        outcome.changed = true;
        for inner in &mut body {
            for _ in 0..levels {
                dedent_stmt(inner);
            }
        }
        if let Some(first) = body.first_mut() {
            // comments above the namespace keyword stay above the first body
            // statement; the newline opening the body collapses away
            let inner_leading = first.leading.trim_start_matches('\n');
            first.leading = format!("{}{inner_leading}", stmt.leading);
        }
        flattened.extend(body);
        let trailing = dedent_text(&body_trailing, levels);
        if !trailing.trim().is_empty() {
            flattened.push(Stmt {
                leading: trailing,
                node: StmtKind::Raw(String::new()),
                span: (0, 0),
            });
        }
    }
    program.statements = flattened;
}

/// Peel nested single-child namespaces into one dotted name, returning the
/// innermost body and how many indentation levels were removed.
fn unwrap_namespace(ns: NamespaceDecl) -> (String, Vec<Stmt>, String, usize) {
    let mut name = ns.dotted_name();
    let mut body = ns.body;
    let mut trailing = ns.body_trailing;
    let mut levels = 1;
    loop {
        let nested = body.len() == 1 && matches!(body[0].node, StmtKind::Namespace(_));
        if !nested {
            break;
        }
        if let StmtKind::Namespace(inner) = body.remove(0).node {
            name.push('.');
            name.push_str(&inner.dotted_name());
            body = inner.body;
            trailing = inner.body_trailing;
            levels += 1;
        }
    }
    (name, body, trailing, levels)
}

fn extract_registrations(
    file: &Path,
    program: &mut Program,
    registry: &mut RegistrationRegistry,
    scope: Option<&str>,
    outcome: &mut ExtractOutcome,
) {
    let original = std::mem::take(&mut program.statements);
    let mut kept = Vec::with_capacity(original.len());
    // trivia of removed statements migrates onto the next kept statement
    let mut pending_leading = String::new();

    for mut stmt in original {
        let action = classify_statement(&stmt.node, file, registry, scope);
        match action {
            Action::Keep => {
                merge_pending(&mut pending_leading, &mut stmt);
                kept.push(stmt);
            }
            Action::Replace(node) => {
                outcome.changed = true;
                merge_pending(&mut pending_leading, &mut stmt);
                stmt.node = node;
                kept.push(stmt);
            }
            Action::Remove => {
                outcome.changed = true;
                if stmt.leading.trim().is_empty() {
                    // pure whitespace does not accumulate into blank runs
                    if pending_leading.is_empty() {
                        pending_leading = stmt.leading;
                    }
                } else {
                    pending_leading.push_str(&stmt.leading);
                }
            }
        }
    }
    if !pending_leading.trim().is_empty() {
        program.trailing.push_str(&pending_leading);
    }
    program.statements = kept;
}

enum Action {
    Keep,
    Remove,
    Replace(StmtKind),
}

/// Attach trivia carried over from removed statements. Whitespace-only
/// carryover is dropped when the statement already opens with its own gap.
fn merge_pending(pending: &mut String, stmt: &mut Stmt) {
    if pending.is_empty() {
        return;
    }
    if pending.trim().is_empty() {
        if stmt.leading.is_empty() {
            stmt.leading = std::mem::take(pending);
        } else {
            pending.clear();
        }
    } else {
        pending.push_str(&stmt.leading);
        stmt.leading = std::mem::take(pending);
    }
}

fn classify_statement(
    node: &StmtKind,
    file: &Path,
    registry: &mut RegistrationRegistry,
    scope: Option<&str>,
) -> Action {
    match node {
        StmtKind::UseStrict => Action::Remove,
        StmtKind::Var(var) => {
            let VarInit::Expr(expr) = &var.init else {
                return Action::Keep;
            };
            match chains::classify(expr) {
                Some(ChainShape::Creation {
                    name_raw,
                    deps_raw,
                    links,
                }) => {
                    let Some(entries) = chains::registration_entries(&links) else {
                        return Action::Keep;
                    };
                    let canonical = canonical_module_name(&name_raw);
                    registry.record_creation(
                        &canonical,
                        file,
                        scope,
                        Some(&var.name),
                        &name_raw,
                        &deps_raw,
                    );
                    registry.append_entries(&canonical, file, entries);
                    Action::Replace(StmtKind::ModulePlaceholder(ModulePlaceholder {
                        module: canonical,
                        name_raw,
                        deps_raw,
                    }))
                }
                Some(ChainShape::Reference { module_arg, links }) => {
                    let Some(entries) = chains::registration_entries(&links) else {
                        return Action::Keep;
                    };
                    let Some(canonical) = resolve_reference_arg(registry, &module_arg, scope)
                    else {
                        return Action::Keep;
                    };
                    registry.record_alias(&canonical, file, scope, &var.name);
                    registry.append_entries(&canonical, file, entries);
                    Action::Remove
                }
                _ => Action::Keep,
            }
        }
        StmtKind::Expression(expr) => match chains::classify(expr) {
            Some(ChainShape::Creation {
                name_raw,
                deps_raw,
                links,
            }) => {
                let Some(entries) = chains::registration_entries(&links) else {
                    return Action::Keep;
                };
                let canonical = canonical_module_name(&name_raw);
                registry.record_creation(&canonical, file, scope, None, &name_raw, &deps_raw);
                registry.append_entries(&canonical, file, entries);
                Action::Replace(StmtKind::ModulePlaceholder(ModulePlaceholder {
                    module: canonical,
                    name_raw,
                    deps_raw,
                }))
            }
            Some(ChainShape::Reference { module_arg, links }) => {
                if links.is_empty() {
                    return Action::Keep;
                }
                let Some(entries) = chains::registration_entries(&links) else {
                    return Action::Keep;
                };
                let Some(canonical) = registry.lookup_module_arg(&module_arg, scope) else {
                    log::debug!(
                        "unresolved module reference {module_arg} in {}, leaving chain as is",
                        file.display()
                    );
                    return Action::Keep;
                };
                registry.append_entries(&canonical, file, entries);
                Action::Remove
            }
            Some(ChainShape::AliasRooted { ident, links }) => {
                let Some(entries) = chains::registration_entries(&links) else {
                    return Action::Keep;
                };
                let Some(canonical) = registry
                    .lookup_canonical_name(&ident, scope)
                    .map(str::to_owned)
                else {
                    return Action::Keep;
                };
                registry.append_entries(&canonical, file, entries);
                Action::Remove
            }
            None => Action::Keep,
        },
        _ => Action::Keep,
    }
}

/// A string-literal reference may name a module that has not been created
/// yet; the alias table only covers identifiers.
fn resolve_reference_arg(
    registry: &RegistrationRegistry,
    module_arg: &str,
    scope: Option<&str>,
) -> Option<String> {
    if is_string_literal(module_arg) {
        return Some(strip_quotes(module_arg).to_owned());
    }
    registry
        .lookup_canonical_name(module_arg, scope)
        .map(str::to_owned)
}

fn canonical_module_name(name_raw: &str) -> String {
    if is_string_literal(name_raw) {
        strip_quotes(name_raw).to_owned()
    } else {
        name_raw.to_owned()
    }
}

fn rewrite_references(program: &mut Program, roots: &[String], outcome: &mut ExtractOutcome) {
    let ambient = &mut outcome.ambient_types;
    for stmt in &mut program.statements {
        let changed = match &mut stmt.node {
            StmtKind::Class(class) => {
                let mut changed = rewrite_in_place(&mut class.heritage, roots, ambient);
                changed |= rewrite_in_place(&mut class.body, roots, ambient);
                changed
            }
            StmtKind::Interface(interface) => {
                let mut changed = rewrite_in_place(&mut interface.heritage, roots, ambient);
                changed |= rewrite_in_place(&mut interface.body, roots, ambient);
                changed
            }
            StmtKind::Function(function) => rewrite_in_place(&mut function.rest, roots, ambient),
            StmtKind::Var(var) => {
                let mut changed = false;
                if let Some(ann) = &mut var.type_ann {
                    changed |= rewrite_in_place(ann, roots, ambient);
                }
                match &mut var.init {
                    VarInit::Expr(expr) => changed |= rewrite::rewrite_expr(expr, roots, ambient),
                    VarInit::Raw(raw) => changed |= rewrite_in_place(raw, roots, ambient),
                    VarInit::None => {}
                }
                changed
            }
            StmtKind::Expression(expr) => rewrite::rewrite_expr(expr, roots, ambient),
            StmtKind::Raw(raw) => rewrite_in_place(raw, roots, ambient),
            _ => false,
        };
        outcome.changed |= changed;
    }
}

fn rewrite_in_place(text: &mut String, roots: &[String], ambient: &mut IndexSet<String>) -> bool {
    match rewrite::rewrite_text(text, roots, ambient) {
        Some(replacement) => {
            *text = replacement;
            true
        }
        None => false,
    }
}

fn build_registration_chain(
    registry: &RegistrationRegistry,
    placeholder: &ModulePlaceholder,
) -> Expr {
    let (name_raw, deps_raw) = match registry.origin(&placeholder.module) {
        Some(origin) => (origin.name_raw.clone(), origin.deps_raw.clone()),
        None => (placeholder.name_raw.clone(), placeholder.deps_raw.clone()),
    };
    let mut chain = Expr::call(
        Expr::member(Expr::ident(chains::FRAMEWORK_GLOBAL), "module"),
        vec![name_raw, deps_raw],
    );
    for (kind, entries) in registry.entries_for(&placeholder.module) {
        for entry in entries {
            chain = Expr::call(
                Expr::member(chain, kind),
                vec![entry.name_text.clone(), entry.target_text.clone()],
            );
        }
    }
    chain
}

fn dedent_stmt(stmt: &mut Stmt) {
    stmt.leading = dedent_text(&stmt.leading, 1);
    match &mut stmt.node {
        StmtKind::Raw(text) => *text = dedent_text(text, 1),
        StmtKind::Class(class) => class.body = dedent_text(&class.body, 1),
        StmtKind::Interface(interface) => interface.body = dedent_text(&interface.body, 1),
        StmtKind::Function(function) => function.rest = dedent_text(&function.rest, 1),
        StmtKind::Var(var) => {
            if let VarInit::Raw(raw) = &mut var.init {
                *raw = dedent_text(raw, 1);
            }
        }
        StmtKind::Namespace(ns) => {
            for inner in &mut ns.body {
                dedent_stmt(inner);
            }
            ns.body_trailing = dedent_text(&ns.body_trailing, 1);
        }
        _ => {}
    }
}

/// Remove `levels` indentation steps (four spaces or one tab each) after
/// every newline. Content inside multi-line template literals is dedented
/// too; that matches how the original sources indent them.
fn dedent_text(text: &str, levels: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut lines = text.split('\n');
    if let Some(first) = lines.next() {
        out.push_str(first);
    }
    for line in lines {
        out.push('\n');
        let mut rest = line;
        for _ in 0..levels {
            if let Some(stripped) = rest.strip_prefix("    ") {
                rest = stripped;
            } else if let Some(stripped) = rest.strip_prefix('\t') {
                rest = stripped;
            } else {
                break;
            }
        }
        out.push_str(rest);
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::syntax::{parse_program, print_program};

    fn run_extract(
        src: &str,
        registry: &mut RegistrationRegistry,
        roots: &[String],
    ) -> (Program, ExtractOutcome) {
        let mut program = parse_program(src).unwrap();
        let options = TransformOptions {
            add_exports: true,
            namespace_roots: roots,
        };
        let outcome = extract(Path::new("/repo/widgets/assets/ts/app.ts"), &mut program, registry, &options);
        (program, outcome)
    }

    #[test]
    fn namespace_is_flattened_and_use_strict_removed() {
        let src = "module co.acme.widgets {\n    'use strict';\n\n    class Widget {\n    }\n}\n";
        let mut registry = RegistrationRegistry::new();
        let (program, outcome) = run_extract(src, &mut registry, &[]);
        assert_eq!(outcome.logical_module.as_deref(), Some("co.acme.widgets"));
        assert_eq!(print_program(&program), "export class Widget {\n}\n");
    }

    #[test]
    fn nested_single_namespaces_merge() {
        let src = "module co.acme {\n    module widgets {\n        let x = 1;\n    }\n}\n";
        let mut registry = RegistrationRegistry::new();
        let (_, outcome) = run_extract(src, &mut registry, &[]);
        assert_eq!(outcome.logical_module.as_deref(), Some("co.acme.widgets"));
    }

    #[test]
    fn nested_and_dotted_namespaces_flatten_identically() {
        let nested = "module co {\n    module acme {\n        module widgets {\n            export class Widget {\n            }\n        }\n    }\n}\n";
        let dotted = "module co.acme.widgets {\n    export class Widget {\n    }\n}\n";

        let mut first_registry = RegistrationRegistry::new();
        let (from_nested, nested_outcome) = run_extract(nested, &mut first_registry, &[]);
        let mut second_registry = RegistrationRegistry::new();
        let (from_dotted, dotted_outcome) = run_extract(dotted, &mut second_registry, &[]);

        assert_eq!(
            nested_outcome.logical_module.as_deref(),
            Some("co.acme.widgets")
        );
        assert_eq!(nested_outcome.logical_module, dotted_outcome.logical_module);
        assert_eq!(print_program(&from_nested), print_program(&from_dotted));
    }

    #[test]
    fn creation_chain_becomes_placeholder_and_entries_are_captured() {
        let src = "module co.acme.widgets {\n    registrar.module('widgets.mod', [])\n        .controller('WCtrl', WidgetCtrl);\n}\n";
        let mut registry = RegistrationRegistry::new();
        let (program, _) = run_extract(src, &mut registry, &[]);
        assert!(program
            .statements
            .iter()
            .any(|s| matches!(s.node, StmtKind::ModulePlaceholder(_))));
        assert_eq!(registry.entries_for("widgets.mod")[0].0, "controller");
    }

    #[test]
    fn alias_rooted_registrations_fold_into_the_module() {
        let src = "module co.acme.widgets {\n    let MOD = registrar.module('widgets.mod', []);\n    MOD.service('api', ApiService);\n}\n";
        let mut registry = RegistrationRegistry::new();
        let (program, _) = run_extract(src, &mut registry, &[]);
        // creation placeholder remains, alias registration is gone
        assert_eq!(
            program
                .statements
                .iter()
                .filter(|s| !matches!(s.node, StmtKind::Raw(ref t) if t.is_empty()))
                .count(),
            1
        );
        let grouped = registry.entries_for("widgets.mod");
        assert_eq!(grouped[0].0, "service");
    }

    #[test]
    fn pure_alias_declaration_is_removed_without_contributing_entries() {
        let src = "module co.acme.widgets {\n    let MOD = registrar.module('platform.mod');\n}\n";
        let mut registry = RegistrationRegistry::new();
        let (program, _) = run_extract(src, &mut registry, &[]);

        assert!(!print_program(&program).contains("MOD"));
        assert!(registry.entries_for("platform.mod").is_empty());
        assert!(registry
            .foreign_contributions(Path::new("/repo/widgets/assets/ts"))
            .is_empty());
        // the binding still resolves for later alias-rooted chains
        assert_eq!(
            registry.lookup_canonical_name("MOD", Some("co.acme.widgets")),
            Some("platform.mod")
        );
    }

    #[test]
    fn malformed_chain_is_left_untouched() {
        let src = "module co.acme.widgets {\n    let MOD = registrar.module('widgets.mod', []);\n    MOD.config(configFn);\n}\n";
        let mut registry = RegistrationRegistry::new();
        let (program, _) = run_extract(src, &mut registry, &[]);
        let printed = print_program(&program);
        assert!(printed.contains("MOD.config(configFn);"));
        assert!(registry.entries_for("widgets.mod").is_empty());
    }

    #[test]
    fn synthesis_replaces_placeholder_with_controller_first_chain() {
        let src = "module co.acme.widgets {\n    registrar.module('widgets.mod', ['other'])\n        .service('api', ApiService)\n        .controller('WCtrl', WidgetCtrl);\n}\n";
        let mut registry = RegistrationRegistry::new();
        let (mut program, outcome) = run_extract(src, &mut registry, &[]);
        assert!(synthesize(&mut program, &registry, &outcome.ambient_types));
        let printed = print_program(&program);
        assert_eq!(
            printed.trim(),
            "registrar.module('widgets.mod', ['other']).controller('WCtrl', WidgetCtrl).service('api', ApiService);"
        );
    }

    #[test]
    fn ambient_types_become_an_import() {
        let src = "module co.acme.widgets {\n    function f(scope: registrar.IScope, q: registrar.IPromise): void {\n    }\n}\n";
        let mut registry = RegistrationRegistry::new();
        let (mut program, outcome) = run_extract(src, &mut registry, &[]);
        assert!(synthesize(&mut program, &registry, &outcome.ambient_types));
        let printed = print_program(&program);
        assert!(printed.starts_with("import { IPromise, IScope } from 'registrar';"));
        assert!(printed.contains("f(scope: IScope, q: IPromise)"));
    }

    #[test]
    fn qualified_references_lose_dependency_roots() {
        let src = "module co.acme.widgets {\n    let user = co.acme.platform.UserService.current();\n}\n";
        let mut registry = RegistrationRegistry::new();
        let roots = vec!["co.acme.platform".to_owned()];
        let (program, _) = run_extract(src, &mut registry, &roots);
        assert!(print_program(&program).contains("UserService.current()"));
    }

    #[test]
    fn extract_then_synthesize_is_idempotent() {
        let src = "module co.acme.widgets {\n    registrar.module('widgets.mod', [])\n        .controller('WCtrl', WidgetCtrl);\n\n    class WidgetCtrl {\n    }\n}\n";
        let mut registry = RegistrationRegistry::new();
        let (mut program, outcome) = run_extract(src, &mut registry, &[]);
        synthesize(&mut program, &registry, &outcome.ambient_types);
        let first = print_program(&program);

        let mut second_registry = RegistrationRegistry::new();
        let mut reparsed = parse_program(&first).unwrap();
        let options = TransformOptions {
            add_exports: true,
            namespace_roots: &[],
        };
        let outcome =
            extract(Path::new("/f.ts"), &mut reparsed, &mut second_registry, &options);
        assert!(!has_namespace(&reparsed));
        synthesize(&mut reparsed, &second_registry, &outcome.ambient_types);
        assert_eq!(print_program(&reparsed), first);
    }
}
