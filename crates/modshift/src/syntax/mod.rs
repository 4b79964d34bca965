//! Parse substrate for the legacy source notation.
//!
//! This is deliberately a shallow, statement-level model: the migration only
//! needs to recognize namespace blocks, registration chains, imports, and
//! top-level declarations. Function and class bodies stay as raw text and are
//! rewritten token-wise where needed. Anything the parser does not recognize
//! becomes a `Raw` statement and is passed through verbatim.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod printer;

pub use ast::{
    ClassDecl, Expr, FunctionDecl, ImportDecl, ImportName, InterfaceDecl, ModulePlaceholder,
    NamespaceDecl, Program, Span, Stmt, StmtKind, VarDecl, VarInit, VarKind,
};
pub use lexer::{Token, TokenKind, tokenize};
pub use parser::parse_program;
pub use printer::print_program;
