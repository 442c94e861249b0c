//! Tokenizer for the CFG keyword language.
//!
//! Comments are dropped and string literals become single tokens, so brace and
//! comma counting downstream never sees characters that live inside them.
//! [`tokenize_with_comments`] also hands back the `//` comments it skipped.
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    Str,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Eq,
    Colon,
    Other(char),
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
    pub line: usize,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }

    pub fn is_ident(&self, source: &str, name: &str) -> bool {
        self.kind == TokenKind::Ident && self.text(source) == name
    }
}

/// A `//` comment; `text` is everything after the slashes.
#[derive(Debug, Clone)]
pub struct LineComment {
    pub text: String,
    pub span: Range<usize>,
    pub line: usize,
}

/// Strip the surrounding quotes of a string token.
pub fn unquote(raw: &str) -> &str {
    let mut chars = raw.chars();
    let Some(open) = chars.next() else {
        return raw;
    };
    if open != '"' && open != '\'' {
        return raw;
    }
    let inner = &raw[1..];
    inner.strip_suffix(open).unwrap_or(inner)
}

pub fn tokenize(source: &str) -> Vec<Token> {
    scan(source).0
}

pub fn tokenize_with_comments(source: &str) -> (Vec<Token>, Vec<LineComment>) {
    scan(source)
}

fn scan(source: &str) -> (Vec<Token>, Vec<LineComment>) {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut comments = Vec::new();
    let mut pos = 0;
    let mut line = 1;

    while pos < bytes.len() {
        let b = bytes[pos];
        match b {
            b'\n' => {
                line += 1;
                pos += 1;
            }
            b' ' | b'\t' | b'\r' | 0x0c => pos += 1,
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                let start = pos;
                while pos < bytes.len() && bytes[pos] != b'\n' {
                    pos += 1;
                }
                comments.push(LineComment {
                    text: source[start + 2..pos].to_string(),
                    span: start..pos,
                    line,
                });
            }
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                pos += 2;
                while pos < bytes.len() && !(bytes[pos] == b'*' && bytes.get(pos + 1) == Some(&b'/'))
                {
                    if bytes[pos] == b'\n' {
                        line += 1;
                    }
                    pos += 1;
                }
                pos = (pos + 2).min(bytes.len());
            }
            b'"' | b'\'' => {
                let start = pos;
                pos += 1;
                while pos < bytes.len() && bytes[pos] != b && bytes[pos] != b'\n' {
                    if bytes[pos] == b'\\' && pos + 1 < bytes.len() && bytes[pos + 1] != b'\n' {
                        pos += 1;
                    }
                    pos += 1;
                }
                if pos < bytes.len() && bytes[pos] == b {
                    pos += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Str,
                    span: start..pos,
                    line,
                });
            }
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => {
                let start = pos;
                while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_')
                {
                    pos += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Ident,
                    span: start..pos,
                    line,
                });
            }
            b'0'..=b'9' => {
                let start = pos;
                pos = scan_number(bytes, pos);
                tokens.push(Token {
                    kind: TokenKind::Number,
                    span: start..pos,
                    line,
                });
            }
            b'.' if bytes.get(pos + 1).is_some_and(u8::is_ascii_digit) => {
                let start = pos;
                pos = scan_number(bytes, pos);
                tokens.push(Token {
                    kind: TokenKind::Number,
                    span: start..pos,
                    line,
                });
            }
            _ => {
                let ch = source[pos..].chars().next().unwrap_or('\u{fffd}');
                let kind = match ch {
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '[' => TokenKind::LBracket,
                    ']' => TokenKind::RBracket,
                    ',' => TokenKind::Comma,
                    ';' => TokenKind::Semi,
                    '=' => TokenKind::Eq,
                    ':' => TokenKind::Colon,
                    other => TokenKind::Other(other),
                };
                let width = ch.len_utf8();
                tokens.push(Token {
                    kind,
                    span: pos..pos + width,
                    line,
                });
                pos += width;
            }
        }
    }

    (tokens, comments)
}

fn scan_number(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() {
        let b = bytes[pos];
        if b.is_ascii_alphanumeric() || b == b'.' || b == b'_' {
            pos += 1;
            continue;
        }
        // exponent sign, e.g. 1.0e-3
        if (b == b'-' || b == b'+') && matches!(bytes[pos - 1], b'e' | b'E') {
            pos += 1;
            continue;
        }
        break;
    }
    pos
}
