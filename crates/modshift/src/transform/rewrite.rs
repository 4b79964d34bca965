//! Qualified-reference rewriting.
//!
//! Raw text regions (class bodies, heritage clauses, call arguments) are
//! scanned token-wise for dotted identifier chains; chains that start with a
//! known unit root namespace lose that prefix, and two-segment ambient type
//! references (`registrar.ISomething`) are collapsed to the bare interface
//! name and collected so an import can be synthesized later.

use indexmap::IndexSet;

use super::chains::FRAMEWORK_GLOBAL;
use crate::syntax::Expr;

/// Rewrite one dotted identifier chain. `None` means the chain is not a
/// qualified reference to a known root and must stay as written.
pub fn rewrite_chain(
    chain: &str,
    roots: &[String],
    ambient_types: &mut IndexSet<String>,
) -> Option<String> {
    if let Some(rest) = chain.strip_prefix(FRAMEWORK_GLOBAL) {
        if let Some(name) = rest.strip_prefix('.') {
            if is_ambient_interface_name(name) {
                ambient_types.insert(name.to_owned());
                return Some(name.to_owned());
            }
        }
    }

    // longest matching root wins so nested unit namespaces strip correctly
    let mut best: Option<&str> = None;
    for root in roots {
        if chain.len() > root.len() + 1
            && chain.starts_with(root.as_str())
            && chain.as_bytes()[root.len()] == b'.'
            && best.is_none_or(|b| root.len() > b.len())
        {
            best = Some(root);
        }
    }
    best.map(|root| chain[root.len() + 1..].to_owned())
}

/// Interface naming convention of the ambient type declarations: a bare
/// `I` followed by a capitalized name.
fn is_ambient_interface_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('I')
        && chars.next().is_some_and(char::is_uppercase)
        && !name.contains('.')
}

/// Rewrite every qualified chain in a raw text region, skipping string
/// literals and comments. Returns `None` when nothing changed.
pub fn rewrite_text(
    text: &str,
    roots: &[String],
    ambient_types: &mut IndexSet<String>,
) -> Option<String> {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut changed = false;
    let mut i = 0;
    let mut prev: u8 = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'/' && bytes.get(i + 1) == Some(&b'/') {
            let end = text[i..]
                .find('\n')
                .map_or(text.len(), |offset| i + offset);
            out.push_str(&text[i..end]);
            prev = 0;
            i = end;
        } else if b == b'/' && bytes.get(i + 1) == Some(&b'*') {
            let end = text[i + 2..]
                .find("*/")
                .map_or(text.len(), |offset| i + 2 + offset + 2);
            out.push_str(&text[i..end]);
            prev = 0;
            i = end;
        } else if b == b'\'' || b == b'"' || b == b'`' {
            let end = string_end(bytes, i, b);
            out.push_str(&text[i..end]);
            prev = b;
            i = end;
        } else if is_ident_start(b) && !is_ident_char(prev) && prev != b'.' {
            let end = chain_end(bytes, i);
            let chain = &text[i..end];
            match rewrite_chain(chain, roots, ambient_types) {
                Some(replacement) => {
                    out.push_str(&replacement);
                    changed = true;
                }
                None => out.push_str(chain),
            }
            prev = bytes[end - 1];
            i = end;
        } else {
            let len = char_len(b);
            out.push_str(&text[i..i + len]);
            prev = b;
            i += len;
        }
    }

    changed.then_some(out)
}

/// Rewrite qualified chains inside a recognized expression tree. Call
/// arguments are raw text and go through [`rewrite_text`].
pub fn rewrite_expr(
    expr: &mut Expr,
    roots: &[String],
    ambient_types: &mut IndexSet<String>,
) -> bool {
    if let Some(text) = expr.dotted_text() {
        if let Some(replacement) = rewrite_chain(&text, roots, ambient_types) {
            *expr = Expr::Ident(replacement);
            return true;
        }
        return false;
    }
    match expr {
        Expr::Call { callee, args } => {
            let mut changed = rewrite_expr(callee, roots, ambient_types);
            for arg in args {
                if let Some(replacement) = rewrite_text(arg, roots, ambient_types) {
                    *arg = replacement;
                    changed = true;
                }
            }
            changed
        }
        Expr::Member { object, .. } => rewrite_expr(object, roots, ambient_types),
        _ => false,
    }
}

fn is_ident_start(b: u8) -> bool {
    b == b'_' || b == b'$' || b.is_ascii_alphabetic()
}

fn is_ident_char(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

fn char_len(b: u8) -> usize {
    if b < 0x80 {
        1
    } else if b >> 5 == 0b110 {
        2
    } else if b >> 4 == 0b1110 {
        3
    } else {
        4
    }
}

fn chain_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && is_ident_char(bytes[i]) {
        i += 1;
    }
    while i < bytes.len()
        && bytes[i] == b'.'
        && bytes.get(i + 1).copied().is_some_and(is_ident_start)
    {
        i += 1;
        while i < bytes.len() && is_ident_char(bytes[i]) {
            i += 1;
        }
    }
    i
}

fn string_end(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}
