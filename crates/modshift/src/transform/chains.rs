//! Structural predicates over registration call chains.
//!
//! Distinguishing "is this a registration call" is done by pattern matching
//! on chain shape and argument counts, never by type inference. These
//! functions are pure so they can be tested independently of tree rewriting.

use crate::{
    registry::RegistrationEntry,
    syntax::Expr,
};

/// Global accessor object of the registration framework.
pub const FRAMEWORK_GLOBAL: &str = "registrar";
/// Entry point that creates or references a registration module.
pub const MODULE_ACCESSOR: &str = "registrar.module";
/// Virtual module that ambient `I`-prefixed interface types are imported from.
pub const AMBIENT_TYPES_MODULE: &str = "registrar";

/// One chained call beyond the root accessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLink {
    pub kind: String,
    pub args: Vec<String>,
}

/// The innermost call of a chain plus every chained call after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallChain {
    /// Dotted callee text of the innermost call.
    pub root_callee: String,
    /// Raw arguments of the innermost call.
    pub root_args: Vec<String>,
    pub links: Vec<ChainLink>,
}

/// Classified shape of a candidate registration chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainShape {
    /// `registrar.module('name', [deps])...` — establishes a canonical name.
    Creation {
        name_raw: String,
        deps_raw: String,
        links: Vec<ChainLink>,
    },
    /// `registrar.module('name')...` — must resolve an existing module.
    Reference {
        module_arg: String,
        links: Vec<ChainLink>,
    },
    /// `<ident>.controller(...)...` — root identifier may be a module alias;
    /// the root call itself is the first link.
    AliasRooted {
        ident: String,
        links: Vec<ChainLink>,
    },
}

/// Decompose a call expression into its innermost call and chained calls.
/// Returns `None` for shapes the registration idiom never produces (property
/// hops between calls, computed callees).
pub fn decompose(expr: &Expr) -> Option<CallChain> {
    let Expr::Call { callee, args } = expr else {
        return None;
    };
    if let Some(dotted) = callee.dotted_text() {
        return Some(CallChain {
            root_callee: dotted,
            root_args: args.clone(),
            links: Vec::new(),
        });
    }
    if let Expr::Member { object, property } = callee.as_ref() {
        let mut chain = decompose(object)?;
        chain.links.push(ChainLink {
            kind: property.clone(),
            args: args.clone(),
        });
        return Some(chain);
    }
    None
}

/// Classify a chain against the registration idiom. `None` means "not a
/// candidate"; callers must then leave the statement untouched.
pub fn classify(expr: &Expr) -> Option<ChainShape> {
    let chain = decompose(expr)?;

    if chain.root_callee == MODULE_ACCESSOR {
        return match chain.root_args.len() {
            2 => Some(ChainShape::Creation {
                name_raw: chain.root_args[0].clone(),
                deps_raw: chain.root_args[1].clone(),
                links: chain.links,
            }),
            1 => Some(ChainShape::Reference {
                module_arg: chain.root_args[0].clone(),
                links: chain.links,
            }),
            _ => None,
        };
    }

    // <ident>.<kind>(args): the root call is itself a registration link
    if let Some((head, kind)) = chain.root_callee.split_once('.') {
        if !head.contains('.') && !kind.contains('.') {
            let mut links = vec![ChainLink {
                kind: kind.to_owned(),
                args: chain.root_args,
            }];
            links.extend(chain.links);
            return Some(ChainShape::AliasRooted {
                ident: head.to_owned(),
                links,
            });
        }
    }
    None
}

/// Convert chain links to registration entries. `None` if any link deviates
/// from the two-argument registration shape: an ambiguous chain must be a
/// conservative no-op, never a partial deletion.
pub fn registration_entries(links: &[ChainLink]) -> Option<Vec<RegistrationEntry>> {
    if links.is_empty() {
        return Some(Vec::new());
    }
    links
        .iter()
        .map(|link| {
            if link.args.len() == 2 {
                Some(RegistrationEntry {
                    kind: link.kind.clone(),
                    name_text: link.args[0].clone(),
                    target_text: link.args[1].clone(),
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::syntax::parse_program;
    use crate::syntax::StmtKind;

    fn expr_of(src: &str) -> Expr {
        let program = parse_program(src).unwrap();
        match &program.statements[0].node {
            StmtKind::Expression(expr) => expr.clone(),
            StmtKind::Var(var) => match &var.init {
                crate::syntax::VarInit::Expr(expr) => expr.clone(),
                other => panic!("expected expression initializer, got {other:?}"),
            },
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn creation_call_is_classified() {
        let expr = expr_of("registrar.module('widgets.mod', []);");
        match classify(&expr) {
            Some(ChainShape::Creation {
                name_raw,
                deps_raw,
                links,
            }) => {
                assert_eq!(name_raw, "'widgets.mod'");
                assert_eq!(deps_raw, "[]");
                assert!(links.is_empty());
            }
            other => panic!("expected creation, got {other:?}"),
        }
    }

    #[test]
    fn reference_call_is_classified() {
        let expr = expr_of("registrar.module('widgets.mod').directive('w', wFn);");
        match classify(&expr) {
            Some(ChainShape::Reference { module_arg, links }) => {
                assert_eq!(module_arg, "'widgets.mod'");
                assert_eq!(links.len(), 1);
                assert_eq!(links[0].kind, "directive");
            }
            other => panic!("expected reference, got {other:?}"),
        }
    }

    #[test]
    fn alias_rooted_chain_includes_root_call_as_link() {
        let expr = expr_of("MOD.controller('WCtrl', WidgetCtrl).service('api', Api);");
        match classify(&expr) {
            Some(ChainShape::AliasRooted { ident, links }) => {
                assert_eq!(ident, "MOD");
                assert_eq!(links.len(), 2);
                assert_eq!(links[0].kind, "controller");
                assert_eq!(links[1].kind, "service");
            }
            other => panic!("expected alias-rooted, got {other:?}"),
        }
    }

    #[test]
    fn plain_function_call_is_not_a_candidate() {
        let expr = expr_of("someMethodCall('argument1', 'argument2');");
        assert_eq!(classify(&expr), None);
    }

    #[test]
    fn deep_property_access_is_not_a_candidate() {
        let expr = expr_of("a.b.c.directive('x', xFn);");
        assert_eq!(classify(&expr), None);
    }

    #[test]
    fn malformed_link_rejects_whole_chain() {
        let expr = expr_of("MOD.config(configFn);");
        let Some(ChainShape::AliasRooted { links, .. }) = classify(&expr) else {
            panic!("expected alias-rooted");
        };
        assert_eq!(registration_entries(&links), None);
    }
}
