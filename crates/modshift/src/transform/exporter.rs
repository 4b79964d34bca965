//! Export-modifier and controller-name-field injection.

use crate::{
    registry::RegistrationRegistry,
    syntax::{ClassDecl, StmtKind},
};

/// Static class field injected so templates can reference the registered
/// controller name without repeating the string literal.
pub const CTRL_NAME_FIELD: &str = "CTRL_NAME";

/// Add an `export` modifier to a top-level declaration. Returns whether the
/// statement changed.
pub fn add_export(node: &mut StmtKind) -> bool {
    let exported = match node {
        StmtKind::Class(class) => &mut class.exported,
        StmtKind::Function(function) => &mut function.exported,
        StmtKind::Interface(interface) => &mut interface.exported,
        StmtKind::Var(var) => &mut var.exported,
        _ => return false,
    };
    if *exported {
        return false;
    }
    *exported = true;
    true
}

/// Inject `static CTRL_NAME = '<name>';` as the first member of a class that
/// is registered as a controller under a string-literal name. Idempotent:
/// a class that already carries the field is left alone.
pub fn inject_ctrl_name(class: &mut ClassDecl, registry: &RegistrationRegistry) -> bool {
    let Some(name_literal) = registry.controller_name_for_target(&class.name) else {
        return false;
    };
    if class.body.contains(CTRL_NAME_FIELD) {
        return false;
    }
    let field = format!("\n    static {CTRL_NAME_FIELD} = {name_literal};\n");
    class.body.insert_str(0, &field);
    true
}
