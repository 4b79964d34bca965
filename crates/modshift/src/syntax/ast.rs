//! Statement-level syntax tree for the legacy source notation.

/// Byte range in the original source text. Synthesized nodes use `(0, 0)`.
pub type Span = (usize, usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub statements: Vec<Stmt>,
    /// Trivia after the last statement (comments, trailing newline).
    pub trailing: String,
}

/// A top-level or namespace-body statement with its leading trivia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stmt {
    /// Whitespace and comments between the previous statement and this one.
    pub leading: String,
    pub node: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn synthesized(node: StmtKind) -> Self {
        Self {
            leading: "\n".to_owned(),
            node,
            span: (0, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtKind {
    Namespace(NamespaceDecl),
    UseStrict,
    Import(ImportDecl),
    Var(VarDecl),
    Class(ClassDecl),
    Function(FunctionDecl),
    Interface(InterfaceDecl),
    Expression(Expr),
    /// Stand-in left by the extraction pass where a module-creation statement
    /// was removed; replaced by the synthesized chain in the second pass.
    ModulePlaceholder(ModulePlaceholder),
    /// Unrecognized statement, passed through verbatim.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// Dotted name segments; `module a.b.c` yields `["a", "b", "c"]`.
    pub name: Vec<String>,
    pub body: Vec<Stmt>,
    /// Trivia between the last body statement and the closing brace.
    pub body_trailing: String,
}

impl NamespaceDecl {
    pub fn dotted_name(&self) -> String {
        self.name.join(".")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportName {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportName {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    /// The identifier this import binds locally.
    pub fn local(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub default_name: Option<String>,
    pub namespace_alias: Option<String>,
    pub names: Vec<ImportName>,
    /// Module specifier without quotes.
    pub module: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Let,
    Const,
    Var,
}

impl VarKind {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Let => "let",
            Self::Const => "const",
            Self::Var => "var",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarInit {
    None,
    /// Initializer recognized as a call/member chain.
    Expr(Expr),
    /// Anything else, raw text.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDecl {
    pub exported: bool,
    pub kind: VarKind,
    pub name: String,
    /// Raw type annotation text, without the leading colon.
    pub type_ann: Option<String>,
    pub init: VarInit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub exported: bool,
    pub is_abstract: bool,
    pub name: String,
    /// Raw text between the class name and the opening brace (type
    /// parameters, extends/implements clauses).
    pub heritage: String,
    /// Raw body text between the braces.
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    pub exported: bool,
    pub name: String,
    /// Raw text after the function name: type parameters, parameter list,
    /// return type, and body.
    pub rest: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDecl {
    pub exported: bool,
    pub name: String,
    pub heritage: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePlaceholder {
    /// Canonical registration-module name.
    pub module: String,
    /// Raw first argument of the creation call (usually a quoted literal).
    pub name_raw: String,
    /// Raw second argument of the creation call (the dependency list).
    pub deps_raw: String,
}

/// Expression subset: identifier/member chains with calls, which is all the
/// registration idiom uses. Arguments are kept as raw text the way the
/// original registration calls spelled them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Ident(String),
    /// Raw literal text including quotes.
    StringLit(String),
    Member {
        object: Box<Expr>,
        property: String,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<String>,
    },
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    pub fn member(object: Expr, property: impl Into<String>) -> Self {
        Self::Member {
            object: Box::new(object),
            property: property.into(),
        }
    }

    pub fn call(callee: Expr, args: Vec<String>) -> Self {
        Self::Call {
            callee: Box::new(callee),
            args,
        }
    }

    /// Dotted text of a pure identifier/member chain, `None` if the chain
    /// contains calls or literals.
    pub fn dotted_text(&self) -> Option<String> {
        match self {
            Self::Ident(name) => Some(name.clone()),
            Self::Member { object, property } => {
                let mut text = object.dotted_text()?;
                text.push('.');
                text.push_str(property);
                Some(text)
            }
            _ => None,
        }
    }
}
