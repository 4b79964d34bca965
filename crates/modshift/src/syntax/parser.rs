//! Recursive-descent parser producing the statement-level tree.
//!
//! The parser is conservative by construction: any statement whose shape it
//! does not fully recognize is captured as `StmtKind::Raw` with its exact
//! source text, so unrecognized code is never altered or dropped.

use anyhow::Result;

use super::{
    ast::{
        ClassDecl, Expr, FunctionDecl, ImportDecl, ImportName, InterfaceDecl, NamespaceDecl,
        Program, Span, Stmt, StmtKind, VarDecl, VarInit, VarKind,
    },
    lexer::{tokenize, Token, TokenKind},
};
use crate::util::strip_quotes;

pub fn parse_program(src: &str) -> Result<Program> {
    let tokens = tokenize(src)?;
    let mut parser = Parser {
        src,
        tokens,
        pos: 0,
    };
    parser.skip_comments();
    let (statements, trailing, _) = parser.parse_statements(0, false);
    Ok(Program {
        statements,
        trailing,
    })
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    /// Index of the current non-comment token.
    pos: usize,
}

impl<'a> Parser<'a> {
    fn skip_comments(&mut self) {
        while self
            .tokens
            .get(self.pos)
            .is_some_and(|t| t.kind == TokenKind::Comment)
        {
            self.pos += 1;
        }
    }

    fn cur(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn cur_text(&self) -> Option<&'a str> {
        self.cur().map(|t| t.text(self.src))
    }

    fn cur_is_punct(&self, text: &str) -> bool {
        self.cur()
            .is_some_and(|t| t.kind == TokenKind::Punct && t.text(self.src) == text)
    }

    fn cur_is_ident(&self, text: &str) -> bool {
        self.cur()
            .is_some_and(|t| t.kind == TokenKind::Ident && t.text(self.src) == text)
    }

    fn bump(&mut self) -> Token {
        let t = self.tokens[self.pos];
        self.pos += 1;
        self.skip_comments();
        t
    }

    /// Consume a trailing semicolon if present, returning the statement end.
    fn eat_semi(&mut self, end: usize) -> usize {
        if self.cur_is_punct(";") {
            self.bump().end
        } else {
            end
        }
    }

    /// Parse statements until EOF or, when `stop_at_rbrace` is set, a closing
    /// brace at this nesting level. Returns the statements, the trailing
    /// trivia, and the offset the trailing trivia ends at.
    fn parse_statements(
        &mut self,
        mut last_end: usize,
        stop_at_rbrace: bool,
    ) -> (Vec<Stmt>, String, usize) {
        let mut statements = Vec::new();
        loop {
            self.skip_comments();
            match self.cur() {
                None => {
                    let trailing = self.src[last_end..].to_owned();
                    return (statements, trailing, self.src.len());
                }
                Some(t)
                    if stop_at_rbrace
                        && t.kind == TokenKind::Punct
                        && t.text(self.src) == "}" =>
                {
                    let trailing = self.src[last_end..t.start].to_owned();
                    return (statements, trailing, t.start);
                }
                Some(t) => {
                    let leading = self.src[last_end..t.start].to_owned();
                    let (node, span) = self.parse_statement();
                    last_end = span.1;
                    statements.push(Stmt {
                        leading,
                        node,
                        span,
                    });
                }
            }
        }
    }

    fn parse_statement(&mut self) -> (StmtKind, Span) {
        let entry = self.pos;
        let t = self.cur().expect("caller checked for a token");

        let parsed = match t.kind {
            TokenKind::Ident => match t.text(self.src) {
                "module" | "namespace" => self.try_namespace(),
                "import" => self.try_import(),
                "export" | "abstract" | "class" | "function" | "interface" | "let" | "const"
                | "var" => self.try_declaration(),
                _ => self.try_expression_statement(),
            },
            TokenKind::String => self
                .try_use_strict()
                .or_else(|| self.try_expression_statement()),
            _ => None,
        };

        match parsed {
            Some(result) => result,
            None => {
                self.pos = entry;
                self.skip_comments();
                self.raw_statement()
            }
        }
    }

    fn try_namespace(&mut self) -> Option<(StmtKind, Span)> {
        let entry = self.pos;
        let start = self.bump().start; // module / namespace keyword

        let mut name = Vec::new();
        match self.cur() {
            Some(t) if t.kind == TokenKind::Ident => {
                name.push(self.bump().text(self.src).to_owned());
            }
            _ => {
                self.pos = entry;
                return None;
            }
        }
        while self.cur_is_punct(".") {
            self.bump();
            match self.cur() {
                Some(t) if t.kind == TokenKind::Ident => {
                    name.push(self.bump().text(self.src).to_owned());
                }
                _ => {
                    self.pos = entry;
                    return None;
                }
            }
        }

        if !self.cur_is_punct("{") {
            self.pos = entry;
            return None;
        }
        let open = self.bump();
        let (body, body_trailing, _) = self.parse_statements(open.end, true);
        if !self.cur_is_punct("}") {
            self.pos = entry;
            return None;
        }
        let close = self.bump();

        Some((
            StmtKind::Namespace(NamespaceDecl {
                name,
                body,
                body_trailing,
            }),
            (start, close.end),
        ))
    }

    fn try_import(&mut self) -> Option<(StmtKind, Span)> {
        let entry = self.pos;
        let start = self.bump().start; // import keyword

        let mut decl = ImportDecl {
            default_name: None,
            namespace_alias: None,
            names: Vec::new(),
            module: String::new(),
        };

        match self.cur() {
            // side-effect import: import 'module';
            Some(t) if t.kind == TokenKind::String => {
                decl.module = strip_quotes(t.text(self.src)).to_owned();
                let end = self.bump().end;
                let end = self.eat_semi(end);
                return Some((StmtKind::Import(decl), (start, end)));
            }
            Some(t) if t.kind == TokenKind::Punct && t.text(self.src) == "{" => {
                if !self.parse_named_imports(&mut decl) {
                    self.pos = entry;
                    return None;
                }
            }
            Some(t) if t.kind == TokenKind::Punct && t.text(self.src) == "*" => {
                self.bump();
                if !self.cur_is_ident("as") {
                    self.pos = entry;
                    return None;
                }
                self.bump();
                match self.cur() {
                    Some(n) if n.kind == TokenKind::Ident => {
                        decl.namespace_alias = Some(self.bump().text(self.src).to_owned());
                    }
                    _ => {
                        self.pos = entry;
                        return None;
                    }
                }
            }
            Some(t) if t.kind == TokenKind::Ident => {
                decl.default_name = Some(self.bump().text(self.src).to_owned());
                if self.cur_is_punct(",") {
                    self.bump();
                    if !self.cur_is_punct("{") || !self.parse_named_imports(&mut decl) {
                        self.pos = entry;
                        return None;
                    }
                }
            }
            _ => {
                self.pos = entry;
                return None;
            }
        }

        if !self.cur_is_ident("from") {
            self.pos = entry;
            return None;
        }
        self.bump();
        let end = match self.cur() {
            Some(t) if t.kind == TokenKind::String => {
                decl.module = strip_quotes(t.text(self.src)).to_owned();
                self.bump().end
            }
            _ => {
                self.pos = entry;
                return None;
            }
        };
        let end = self.eat_semi(end);
        Some((StmtKind::Import(decl), (start, end)))
    }

    fn parse_named_imports(&mut self, decl: &mut ImportDecl) -> bool {
        debug_assert!(self.cur_is_punct("{"));
        self.bump();
        loop {
            if self.cur_is_punct("}") {
                self.bump();
                return true;
            }
            let name = match self.cur() {
                Some(t) if t.kind == TokenKind::Ident => self.bump().text(self.src).to_owned(),
                _ => return false,
            };
            let alias = if self.cur_is_ident("as") {
                self.bump();
                match self.cur() {
                    Some(t) if t.kind == TokenKind::Ident => {
                        Some(self.bump().text(self.src).to_owned())
                    }
                    _ => return false,
                }
            } else {
                None
            };
            decl.names.push(ImportName { name, alias });
            if self.cur_is_punct(",") {
                self.bump();
            } else if !self.cur_is_punct("}") {
                return false;
            }
        }
    }

    fn try_declaration(&mut self) -> Option<(StmtKind, Span)> {
        let entry = self.pos;
        let start = self.cur()?.start;

        let mut exported = false;
        if self.cur_is_ident("export") {
            exported = true;
            self.bump();
        }
        let mut is_abstract = false;
        if self.cur_is_ident("abstract") {
            is_abstract = true;
            self.bump();
        }

        let result = match self.cur_text() {
            Some("class") => self.finish_class(start, exported, is_abstract),
            Some("function") if !is_abstract => self.finish_function(start, exported),
            Some("interface") if !is_abstract => self.finish_interface(start, exported),
            Some("let") if !is_abstract => self.finish_var(start, exported, VarKind::Let),
            Some("const") if !is_abstract => self.finish_var(start, exported, VarKind::Const),
            Some("var") if !is_abstract => self.finish_var(start, exported, VarKind::Var),
            _ => None,
        };
        if result.is_none() {
            self.pos = entry;
        }
        result
    }

    fn finish_class(
        &mut self,
        start: usize,
        exported: bool,
        is_abstract: bool,
    ) -> Option<(StmtKind, Span)> {
        self.bump(); // class keyword
        let name_tok = match self.cur() {
            Some(t) if t.kind == TokenKind::Ident => self.bump(),
            _ => return None,
        };
        let heritage_start = name_tok.end;
        let brace = self.scan_to_body_brace(heritage_start)?;
        let heritage = self.src[heritage_start..brace.start].trim().to_owned();
        let (open, close) = self.balanced_braces()?;
        Some((
            StmtKind::Class(ClassDecl {
                exported,
                is_abstract,
                name: name_tok.text(self.src).to_owned(),
                heritage,
                body: self.src[open.end..close.start].to_owned(),
            }),
            (start, close.end),
        ))
    }

    fn finish_interface(&mut self, start: usize, exported: bool) -> Option<(StmtKind, Span)> {
        self.bump(); // interface keyword
        let name_tok = match self.cur() {
            Some(t) if t.kind == TokenKind::Ident => self.bump(),
            _ => return None,
        };
        let heritage_start = name_tok.end;
        let brace = self.scan_to_body_brace(heritage_start)?;
        let heritage = self.src[heritage_start..brace.start].trim().to_owned();
        let (open, close) = self.balanced_braces()?;
        Some((
            StmtKind::Interface(InterfaceDecl {
                exported,
                name: name_tok.text(self.src).to_owned(),
                heritage,
                body: self.src[open.end..close.start].to_owned(),
            }),
            (start, close.end),
        ))
    }

    fn finish_function(&mut self, start: usize, exported: bool) -> Option<(StmtKind, Span)> {
        self.bump(); // function keyword
        let name_tok = match self.cur() {
            Some(t) if t.kind == TokenKind::Ident => self.bump(),
            _ => return None,
        };
        self.scan_to_body_brace(name_tok.end)?;
        let (_, close) = self.balanced_braces()?;
        Some((
            StmtKind::Function(FunctionDecl {
                exported,
                name: name_tok.text(self.src).to_owned(),
                rest: self.src[name_tok.end..close.end].to_owned(),
            }),
            (start, close.end),
        ))
    }

    /// Advance to the `{` that opens a declaration body, skipping type
    /// parameters, heritage clauses, and parameter lists. Returns the brace
    /// token without consuming it. Arrow `=>` tokens are treated as a unit so
    /// their `>` does not unbalance angle-bracket tracking.
    fn scan_to_body_brace(&mut self, _from: usize) -> Option<Token> {
        let mut angle = 0i32;
        let mut round = 0i32;
        let mut square = 0i32;
        while let Some(t) = self.tokens.get(self.pos).copied() {
            if t.kind == TokenKind::Comment {
                self.pos += 1;
                continue;
            }
            if t.kind == TokenKind::Punct {
                let next_is_adjacent_gt = self
                    .tokens
                    .get(self.pos + 1)
                    .is_some_and(|n| n.start == t.end && n.text(self.src) == ">");
                match t.text(self.src) {
                    "=" if next_is_adjacent_gt => {
                        self.pos += 2;
                        continue;
                    }
                    "<" => angle += 1,
                    ">" => angle -= 1,
                    "(" => round += 1,
                    ")" => round -= 1,
                    "[" => square += 1,
                    "]" => square -= 1,
                    "{" if angle <= 0 && round <= 0 && square <= 0 => return Some(t),
                    ";" if angle <= 0 && round <= 0 && square <= 0 => return None,
                    _ => {}
                }
            }
            self.pos += 1;
        }
        None
    }

    /// Consume a balanced `{ ... }` block starting at the current token.
    fn balanced_braces(&mut self) -> Option<(Token, Token)> {
        if !self.cur_is_punct("{") {
            return None;
        }
        let open = self.tokens[self.pos];
        let mut depth = 0i32;
        while let Some(t) = self.tokens.get(self.pos).copied() {
            if t.kind == TokenKind::Punct {
                match t.text(self.src) {
                    "{" => depth += 1,
                    "}" => {
                        depth -= 1;
                        if depth == 0 {
                            self.pos += 1;
                            self.skip_comments();
                            return Some((open, t));
                        }
                    }
                    _ => {}
                }
            }
            self.pos += 1;
        }
        None
    }

    fn finish_var(
        &mut self,
        start: usize,
        exported: bool,
        kind: VarKind,
    ) -> Option<(StmtKind, Span)> {
        self.bump(); // let / const / var keyword
        let name_tok = match self.cur() {
            Some(t) if t.kind == TokenKind::Ident => self.bump(),
            _ => return None,
        };
        // multi-declarator statements are left raw
        if self.cur_is_punct(",") {
            return None;
        }

        let mut type_ann = None;
        if self.cur_is_punct(":") {
            self.bump();
            let ann_start = self.cur()?.start;
            let term = self.scan_to_terminator(&["=", ";"])?;
            type_ann = Some(self.src[ann_start..term.start].trim().to_owned());
        }

        if self.cur_is_punct(";") {
            let end = self.bump().end;
            return Some((
                StmtKind::Var(VarDecl {
                    exported,
                    kind,
                    name: name_tok.text(self.src).to_owned(),
                    type_ann,
                    init: VarInit::None,
                }),
                (start, end),
            ));
        }

        if !self.cur_is_punct("=") {
            return None;
        }
        self.bump();

        let init_entry = self.pos;
        if let Some(expr) = self.parse_chain_expr() {
            if self.cur_is_punct(";") {
                let end = self.bump().end;
                return Some((
                    StmtKind::Var(VarDecl {
                        exported,
                        kind,
                        name: name_tok.text(self.src).to_owned(),
                        type_ann,
                        init: VarInit::Expr(expr),
                    }),
                    (start, end),
                ));
            }
        }
        self.pos = init_entry;
        self.skip_comments();

        let init_start = self.cur()?.start;
        let term = self.scan_to_terminator(&[";"])?;
        let raw = self.src[init_start..term.start].trim().to_owned();
        let end = if self.cur_is_punct(";") {
            self.bump().end
        } else {
            term.start
        };
        Some((
            StmtKind::Var(VarDecl {
                exported,
                kind,
                name: name_tok.text(self.src).to_owned(),
                type_ann,
                init: VarInit::Raw(raw),
            }),
            (start, end),
        ))
    }

    /// Advance to the next terminator punct at zero bracket depth, without
    /// consuming it. Returns `None` at EOF or on a stray closing brace.
    fn scan_to_terminator(&mut self, terminators: &[&str]) -> Option<Token> {
        let mut angle = 0i32;
        let mut round = 0i32;
        let mut square = 0i32;
        let mut curly = 0i32;
        while let Some(t) = self.tokens.get(self.pos).copied() {
            if t.kind == TokenKind::Punct {
                let text = t.text(self.src);
                let next_is_adjacent_gt = self
                    .tokens
                    .get(self.pos + 1)
                    .is_some_and(|n| n.start == t.end && n.text(self.src) == ">");
                let at_depth_zero = angle <= 0 && round == 0 && square == 0 && curly == 0;
                if at_depth_zero && terminators.contains(&text) {
                    return Some(t);
                }
                match text {
                    "=" if next_is_adjacent_gt => {
                        self.pos += 2;
                        continue;
                    }
                    "<" => angle += 1,
                    ">" => angle -= 1,
                    "(" => round += 1,
                    ")" => round -= 1,
                    "[" => square += 1,
                    "]" => square -= 1,
                    "{" => curly += 1,
                    "}" => {
                        if curly == 0 {
                            return None;
                        }
                        curly -= 1;
                    }
                    _ => {}
                }
            }
            self.pos += 1;
        }
        None
    }

    fn try_use_strict(&mut self) -> Option<(StmtKind, Span)> {
        let t = self.cur()?;
        if t.kind != TokenKind::String || strip_quotes(t.text(self.src)) != "use strict" {
            return None;
        }
        let entry = self.pos;
        self.bump();
        if !self.cur_is_punct(";") {
            self.pos = entry;
            return None;
        }
        let end = self.bump().end;
        Some((StmtKind::UseStrict, (t.start, end)))
    }

    fn try_expression_statement(&mut self) -> Option<(StmtKind, Span)> {
        let entry = self.pos;
        let start = self.cur()?.start;
        let expr = match self.parse_chain_expr() {
            Some(expr) => expr,
            None => {
                self.pos = entry;
                return None;
            }
        };
        if !self.cur_is_punct(";") {
            self.pos = entry;
            return None;
        }
        let end = self.bump().end;
        Some((StmtKind::Expression(expr), (start, end)))
    }

    /// Parse an identifier/member chain with call suffixes. Returns `None`
    /// for anything else; the caller backtracks.
    fn parse_chain_expr(&mut self) -> Option<Expr> {
        let t = self.cur()?;
        let mut expr = match t.kind {
            TokenKind::Ident => Expr::Ident(t.text(self.src).to_owned()),
            TokenKind::String => Expr::StringLit(t.text(self.src).to_owned()),
            _ => return None,
        };
        self.bump();

        loop {
            if self.cur_is_punct(".") {
                let mark = self.pos;
                self.bump();
                match self.cur() {
                    Some(n) if n.kind == TokenKind::Ident => {
                        let property = self.bump().text(self.src).to_owned();
                        expr = Expr::member(expr, property);
                    }
                    _ => {
                        self.pos = mark;
                        break;
                    }
                }
            } else if self.cur_is_punct("(") {
                let args = self.parse_call_args()?;
                expr = Expr::call(expr, args);
            } else {
                break;
            }
        }
        Some(expr)
    }

    /// Capture the raw text of each call argument, split on top-level commas.
    fn parse_call_args(&mut self) -> Option<Vec<String>> {
        debug_assert!(self.cur_is_punct("("));
        let open = self.tokens[self.pos];
        self.pos += 1;
        let mut depth = 1i32;
        let mut args = Vec::new();
        let mut arg_start = open.end;

        while let Some(t) = self.tokens.get(self.pos).copied() {
            if t.kind == TokenKind::Punct {
                match t.text(self.src) {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => {
                        depth -= 1;
                        if depth == 0 {
                            if t.text(self.src) != ")" {
                                return None;
                            }
                            let last = self.src[arg_start..t.start].trim();
                            if !last.is_empty() {
                                args.push(last.to_owned());
                            }
                            self.pos += 1;
                            self.skip_comments();
                            return Some(args);
                        }
                    }
                    "," if depth == 1 => {
                        args.push(self.src[arg_start..t.start].trim().to_owned());
                        arg_start = t.end;
                    }
                    _ => {}
                }
            }
            self.pos += 1;
        }
        None
    }

    /// Consume one statement's worth of tokens verbatim.
    ///
    /// Ends after a `;` at depth zero, after a depth-zero `{...}` block (with
    /// continuation for `else`/`catch`/`finally`/`while`), or before a stray
    /// closing brace that belongs to the enclosing block.
    fn raw_statement(&mut self) -> (StmtKind, Span) {
        let start = self.tokens[self.pos].start;
        let mut end = start;
        let mut depth = 0i32;
        let mut saw_block = false;

        while let Some(t) = self.tokens.get(self.pos).copied() {
            if t.kind == TokenKind::Punct {
                match t.text(self.src) {
                    ";" => {
                        self.pos += 1;
                        end = t.end;
                        if depth == 0 {
                            break;
                        }
                        continue;
                    }
                    "(" | "[" => depth += 1,
                    ")" | "]" => depth -= 1,
                    "{" => {
                        depth += 1;
                        if depth == 1 {
                            saw_block = true;
                        }
                    }
                    "}" => {
                        if depth == 0 {
                            // closing brace of the enclosing block
                            break;
                        }
                        depth -= 1;
                        self.pos += 1;
                        end = t.end;
                        if depth == 0 && saw_block && !self.block_continues() {
                            break;
                        }
                        continue;
                    }
                    _ => {}
                }
            }
            self.pos += 1;
            end = t.end;
        }

        self.skip_comments();
        (StmtKind::Raw(self.src[start..end].to_owned()), (start, end))
    }

    /// After a depth-zero block closes, does the statement continue?
    fn block_continues(&self) -> bool {
        let mut idx = self.pos;
        while self
            .tokens
            .get(idx)
            .is_some_and(|t| t.kind == TokenKind::Comment)
        {
            idx += 1;
        }
        self.tokens.get(idx).is_some_and(|t| {
            t.kind == TokenKind::Ident
                && matches!(t.text(self.src), "else" | "catch" | "finally" | "while")
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(src: &str) -> Program {
        parse_program(src).unwrap()
    }

    #[test]
    fn parses_dotted_namespace() {
        let program = parse("module co.acme.widgets {\n    let x = 1;\n}\n");
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0].node {
            StmtKind::Namespace(ns) => {
                assert_eq!(ns.dotted_name(), "co.acme.widgets");
                assert_eq!(ns.body.len(), 1);
            }
            other => panic!("expected namespace, got {other:?}"),
        }
    }

    #[test]
    fn parses_nested_single_segment_namespaces() {
        let program = parse("module co {\n  module acme {\n    class A {}\n  }\n}\n");
        match &program.statements[0].node {
            StmtKind::Namespace(outer) => {
                assert_eq!(outer.name, vec!["co"]);
                match &outer.body[0].node {
                    StmtKind::Namespace(inner) => assert_eq!(inner.name, vec!["acme"]),
                    other => panic!("expected inner namespace, got {other:?}"),
                }
            }
            other => panic!("expected namespace, got {other:?}"),
        }
    }

    #[test]
    fn recognizes_use_strict() {
        let program = parse("'use strict';\n");
        assert_eq!(program.statements[0].node, StmtKind::UseStrict);
    }

    #[test]
    fn parses_registration_chain_statement() {
        let program = parse("registrar.module('widgets.mod', []).controller('WCtrl', WidgetCtrl);\n");
        match &program.statements[0].node {
            StmtKind::Expression(Expr::Call { callee, args }) => {
                assert_eq!(args, &vec!["'WCtrl'".to_owned(), "WidgetCtrl".to_owned()]);
                match callee.as_ref() {
                    Expr::Member { property, .. } => assert_eq!(property, "controller"),
                    other => panic!("expected member callee, got {other:?}"),
                }
            }
            other => panic!("expected expression, got {other:?}"),
        }
    }

    #[test]
    fn parses_var_with_chain_initializer() {
        let program = parse("let MOD = registrar.module('widgets.mod', []);\n");
        match &program.statements[0].node {
            StmtKind::Var(var) => {
                assert_eq!(var.name, "MOD");
                assert_eq!(var.kind, VarKind::Let);
                assert!(matches!(var.init, VarInit::Expr(_)));
            }
            other => panic!("expected var, got {other:?}"),
        }
    }

    #[test]
    fn parses_class_with_heritage() {
        let program = parse("export class WidgetCtrl extends Base {\n    go() {}\n}\n");
        match &program.statements[0].node {
            StmtKind::Class(class) => {
                assert!(class.exported);
                assert_eq!(class.name, "WidgetCtrl");
                assert_eq!(class.heritage, "extends Base");
                assert!(class.body.contains("go() {}"));
            }
            other => panic!("expected class, got {other:?}"),
        }
    }

    #[test]
    fn parses_named_import() {
        let program = parse("import { Foo, Bar as Baz } from './other';\n");
        match &program.statements[0].node {
            StmtKind::Import(import) => {
                assert_eq!(import.module, "./other");
                assert_eq!(import.names.len(), 2);
                assert_eq!(import.names[1].local(), "Baz");
            }
            other => panic!("expected import, got {other:?}"),
        }
    }

    #[test]
    fn unrecognized_statement_round_trips_as_raw() {
        let src = "if (a > b) {\n    doThing();\n} else {\n    other();\n}\n";
        let program = parse(src);
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0].node {
            StmtKind::Raw(text) => assert_eq!(text, src.trim_end()),
            other => panic!("expected raw, got {other:?}"),
        }
    }

    #[test]
    fn binary_expression_statement_stays_raw() {
        let program = parse("a.b = c + 1;\n");
        assert!(matches!(program.statements[0].node, StmtKind::Raw(_)));
    }

    #[test]
    fn leading_comment_is_preserved_as_trivia() {
        let src = "// top comment\nlet x = 1;\n";
        let program = parse(src);
        assert!(program.statements[0].leading.contains("// top comment"));
    }

    #[test]
    fn multiline_chain_parses_as_one_expression() {
        let src = "registrar.module('m')\n    .directive('d', dFn);\n";
        let program = parse(src);
        assert!(matches!(
            program.statements[0].node,
            StmtKind::Expression(_)
        ));
    }
}
