//! Tokenizer for the legacy source notation.
//!
//! Produces a flat token stream with byte spans into the original text.
//! Comments are kept as tokens so the parser can attach them to statement
//! trivia; whitespace is dropped (spans make raw slices recoverable).

use anyhow::{bail, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword
    Ident,
    /// String literal, span includes the quotes
    String,
    /// Numeric literal
    Number,
    /// Single punctuation character
    Punct,
    /// Line or block comment
    Comment,
}

#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.start..self.end]
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Tokenize `src`, failing on unterminated strings or block comments.
pub fn tokenize(src: &str) -> Result<Vec<Token>> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = src[i..].chars().next().expect("in-bounds char");

        if c.is_whitespace() {
            i += c.len_utf8();
            continue;
        }

        if c == '/' && i + 1 < bytes.len() {
            match bytes[i + 1] {
                b'/' => {
                    let start = i;
                    while i < bytes.len() && bytes[i] != b'\n' {
                        i += 1;
                    }
                    tokens.push(Token {
                        kind: TokenKind::Comment,
                        start,
                        end: i,
                    });
                    continue;
                }
                b'*' => {
                    let start = i;
                    i += 2;
                    loop {
                        if i + 1 >= bytes.len() {
                            bail!("unterminated block comment at offset {start}");
                        }
                        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
                            i += 2;
                            break;
                        }
                        i += 1;
                    }
                    tokens.push(Token {
                        kind: TokenKind::Comment,
                        start,
                        end: i,
                    });
                    continue;
                }
                _ => {}
            }
        }

        if c == '\'' || c == '"' || c == '`' {
            let quote = c as u8;
            let start = i;
            i += 1;
            loop {
                if i >= bytes.len() {
                    bail!("unterminated string literal at offset {start}");
                }
                if bytes[i] == b'\\' {
                    i += 2;
                    continue;
                }
                if bytes[i] == quote {
                    i += 1;
                    break;
                }
                // template literals may span lines; normal strings rarely do
                // in this codebase, so no newline check here
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::String,
                start,
                end: i,
            });
            continue;
        }

        if is_ident_start(c) {
            let start = i;
            i += c.len_utf8();
            while i < bytes.len() {
                let n = src[i..].chars().next().expect("in-bounds char");
                if !is_ident_continue(n) {
                    break;
                }
                i += n.len_utf8();
            }
            tokens.push(Token {
                kind: TokenKind::Ident,
                start,
                end: i,
            });
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            i += 1;
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'.' || bytes[i] == b'_')
            {
                // stop at a dot that starts a method call on a literal
                if bytes[i] == b'.' && i + 1 < bytes.len() && !bytes[i + 1].is_ascii_digit() {
                    break;
                }
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Number,
                start,
                end: i,
            });
            continue;
        }

        tokens.push(Token {
            kind: TokenKind::Punct,
            start: i,
            end: i + c.len_utf8(),
        });
        i += c.len_utf8();
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_identifier_chain() {
        assert_eq!(
            kinds("registrar.module"),
            vec![TokenKind::Ident, TokenKind::Punct, TokenKind::Ident]
        );
    }

    #[test]
    fn string_span_includes_quotes() {
        let tokens = tokenize("'use strict';").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text("'use strict';"), "'use strict'");
    }

    #[test]
    fn comments_are_tokens() {
        let src = "// note\nlet x;";
        let tokens = tokenize(src).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].text(src), "// note");
    }

    #[test]
    fn escaped_quote_does_not_terminate_string() {
        let src = r#"'it\'s';"#;
        let tokens = tokenize(src).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].end, src.len() - 1);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(tokenize("'oops").is_err());
    }
}
