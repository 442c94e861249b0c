//! Recursive-descent parser for statements inside a CFG block body.
//!
//! Malformed statements are skipped up to the end of their source line; one
//! bad line never stops the rest of the block from parsing.
use super::lexer::{tokenize, tokenize_with_comments, unquote, LineComment, Token, TokenKind};
use super::region::{matching_close, matching_paren};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Typed right-hand side of a plain `NAME = literal;` assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Literal {
    pub fn classify(raw: &str) -> Literal {
        let raw = raw.trim();
        if int_re().is_match(raw) {
            if let Ok(value) = raw.parse::<i64>() {
                return Literal::Int(value);
            }
        }
        if float_re().is_match(raw) {
            if let Ok(value) = raw.parse::<f64>() {
                return Literal::Float(value);
            }
        }
        Literal::Str(raw.trim_matches(|c| c == '"' || c == '\'').to_string())
    }

    pub fn type_tag(&self) -> &'static str {
        match self {
            Literal::Int(_) => "INT",
            Literal::Float(_) => "FLOAT",
            Literal::Str(_) => "STRING",
        }
    }
}

fn int_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\d+$").expect("regex for integer literals"))
}

fn float_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.\d*|\.\d+|\d+)([eE][+-]?\d+)?$").expect("regex for float literals")
    })
}

/// How an attribute was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueKind {
    Value,
    Array,
    Scalar,
    Plain,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Header(String),
    Comment(String),
    Card {
        format: String,
        fields: Vec<String>,
    },
    Assign {
        target: String,
        value: String,
        mode: Option<String>,
    },
    /// `NAME = VALUE(...)`, `NAME = ARRAY[size](...)` or `NAME = SCALAR(...)`.
    Declare {
        name: String,
        kind: ValueKind,
        type_tag: String,
        description: String,
        array_size: Option<String>,
    },
    /// `SCALAR(attr) { DIMENSION = "unit"; }`
    Dimension {
        attribute: String,
        unit: String,
    },
    Default {
        name: String,
        value: Literal,
        raw: String,
    },
    List {
        name: String,
        items: Vec<String>,
    },
    Label(String),
    /// Text after `//`; only [`parse_statements_with_comments`] emits these.
    LineComment(String),
    Block {
        name: String,
        qualifier: Option<String>,
        statements: Vec<Statement>,
    },
}

/// Every non-block statement, descending into nested blocks in source order.
pub fn flatten(statements: &[Statement]) -> Vec<&Statement> {
    let mut out = Vec::new();
    for statement in statements {
        match statement {
            Statement::Block { statements, .. } => out.extend(flatten(statements)),
            other => out.push(other),
        }
    }
    out
}

pub fn parse_statements(body: &str) -> Vec<Statement> {
    let tokens = tokenize(body);
    Parser::new(body, &tokens, &[]).statements(tokens.len())
}

/// Like [`parse_statements`], with each `//` comment kept as a
/// [`Statement::LineComment`] in the block that contains it.
pub fn parse_statements_with_comments(body: &str) -> Vec<Statement> {
    let (tokens, comments) = tokenize_with_comments(body);
    Parser::new(body, &tokens, &comments).statements(tokens.len())
}

#[derive(Debug, Clone)]
struct Arg {
    raw: String,
    string: Option<String>,
}

impl Arg {
    fn text(&self) -> &str {
        self.string.as_deref().unwrap_or(&self.raw)
    }
}

struct Malformed;

struct Parser<'a> {
    text: &'a str,
    tokens: &'a [Token],
    pos: usize,
    comments: &'a [LineComment],
    next_comment: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, tokens: &'a [Token], comments: &'a [LineComment]) -> Self {
        Parser {
            text,
            tokens,
            pos: 0,
            comments,
            next_comment: 0,
        }
    }

    /// Emit the pending comments that start before byte `offset`.
    fn comments_before(&mut self, offset: usize, out: &mut Vec<Statement>) {
        while let Some(comment) = self.comments.get(self.next_comment) {
            if comment.span.start >= offset {
                break;
            }
            out.push(Statement::LineComment(comment.text.clone()));
            self.next_comment += 1;
        }
    }

    fn statements(&mut self, end: usize) -> Vec<Statement> {
        let mut out = Vec::new();
        while self.pos < end {
            self.comments_before(self.tokens[self.pos].span.start, &mut out);
            let start = self.pos;
            match self.statement(end) {
                Ok(Some(statement)) => out.push(statement),
                Ok(None) => {}
                Err(Malformed) => {
                    self.pos = start;
                    self.recover(end);
                }
            }
        }
        let close = self.tokens.get(end).map_or(usize::MAX, |token| token.span.start);
        self.comments_before(close, &mut out);
        out
    }

    fn statement(&mut self, end: usize) -> Result<Option<Statement>, Malformed> {
        let tokens = self.tokens;
        let token = &tokens[self.pos];
        match token.kind {
            TokenKind::Semi | TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                self.pos += 1;
                Ok(None)
            }
            TokenKind::LBrace => {
                let statements = self.nested(self.pos, end)?;
                Ok(Some(Statement::Block {
                    name: String::new(),
                    qualifier: None,
                    statements,
                }))
            }
            TokenKind::Ident => {
                let name = token.text(self.text).to_string();
                let next = self.kind_at(self.pos + 1, end);
                match next {
                    Some(TokenKind::Colon) => {
                        self.pos += 2;
                        Ok(Some(Statement::Label(name)))
                    }
                    Some(TokenKind::Eq) => self.assignment(name, end),
                    Some(TokenKind::LParen) => self.call_or_block(name, end),
                    Some(TokenKind::LBrace) => {
                        let statements = self.nested(self.pos + 1, end)?;
                        Ok(Some(Statement::Block {
                            name,
                            qualifier: None,
                            statements,
                        }))
                    }
                    // `else if (...) { ... }`
                    Some(TokenKind::Ident) if name == "else" => {
                        self.pos += 1;
                        Ok(None)
                    }
                    _ => Err(Malformed),
                }
            }
            _ => Err(Malformed),
        }
    }

    /// Parse the `{ ... }` opening at `open`, leaving `pos` after its close.
    fn nested(&mut self, open: usize, end: usize) -> Result<Vec<Statement>, Malformed> {
        let close = matching_close(self.tokens, open)
            .filter(|close| *close < end)
            .ok_or(Malformed)?;
        self.pos = open + 1;
        let statements = self.statements(close);
        self.pos = close + 1;
        Ok(statements)
    }

    fn call_or_block(&mut self, name: String, end: usize) -> Result<Option<Statement>, Malformed> {
        let open = self.pos + 1;
        let (args, close) = self.args(open, end)?;

        if self.kind_at(close + 1, end) == Some(TokenKind::LBrace) {
            let qualifier = self.raw_between(open, close);
            let statements = self.nested(close + 1, end)?;
            if name == "SCALAR" {
                if let (Some(attribute), Some(unit)) = (&qualifier, dimension_of(&statements)) {
                    return Ok(Some(Statement::Dimension {
                        attribute: attribute.clone(),
                        unit,
                    }));
                }
            }
            return Ok(Some(Statement::Block {
                name,
                qualifier,
                statements,
            }));
        }

        self.pos = close + 1;
        self.skip_semi(end);
        let first = || args.first().map(|arg| arg.text().to_string()).unwrap_or_default();
        let statement = match name.as_str() {
            "HEADER" => Statement::Header(first()),
            "COMMENT" => Statement::Comment(first()),
            "CARD" => Statement::Card {
                format: first(),
                fields: args
                    .iter()
                    .skip(1)
                    .filter(|arg| !arg.raw.is_empty())
                    .map(|arg| arg.raw.clone())
                    .collect(),
            },
            "ASSIGN" => {
                if args.len() < 2 {
                    return Err(Malformed);
                }
                Statement::Assign {
                    target: args[0].text().to_string(),
                    value: args[1].text().to_string(),
                    mode: args.get(2).map(|arg| arg.text().to_string()),
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(statement))
    }

    fn assignment(&mut self, name: String, end: usize) -> Result<Option<Statement>, Malformed> {
        let rhs = self.pos + 2;
        let Some(kind) = self.kind_at(rhs, end) else {
            return Err(Malformed);
        };

        let next = self.kind_at(rhs + 1, end);
        if kind == TokenKind::Ident
            && matches!(next, Some(TokenKind::LParen) | Some(TokenKind::LBracket))
        {
            let callee = self.tokens[rhs].text(self.text).to_string();
            let mut open = rhs + 1;
            let mut array_size = None;
            if next == Some(TokenKind::LBracket) {
                let close = self.matching_bracket(open, end).ok_or(Malformed)?;
                array_size = self.raw_between(open, close);
                open = close + 1;
                if self.kind_at(open, end) != Some(TokenKind::LParen) {
                    return Err(Malformed);
                }
            }
            let (args, close) = self.args(open, end)?;
            self.pos = close + 1;
            self.skip_semi(end);

            let kind = match callee.as_str() {
                "VALUE" => ValueKind::Value,
                "ARRAY" => ValueKind::Array,
                "SCALAR" => ValueKind::Scalar,
                _ => return Ok(None),
            };
            return Ok(Some(Statement::Declare {
                name,
                kind,
                type_tag: args.first().map(|a| a.text().to_string()).unwrap_or_default(),
                description: args.get(1).map(|a| a.text().to_string()).unwrap_or_default(),
                array_size,
            }));
        }

        if kind == TokenKind::LParen {
            let (args, close) = self.args(rhs, end)?;
            self.pos = close + 1;
            self.skip_semi(end);
            let items = args
                .iter()
                .filter(|arg| !arg.raw.is_empty())
                .map(|arg| arg.text().trim().to_string())
                .collect();
            return Ok(Some(Statement::List { name, items }));
        }

        let line = self.tokens[rhs].line;
        let mut last = rhs;
        while last < end {
            let token = &self.tokens[last];
            if token.line != line
                || matches!(
                    token.kind,
                    TokenKind::Semi | TokenKind::LBrace | TokenKind::RBrace
                )
            {
                break;
            }
            last += 1;
        }
        if last == rhs {
            return Err(Malformed);
        }
        let span = self.tokens[rhs].span.start..self.tokens[last - 1].span.end;
        let raw = self.text[span].trim().to_string();
        self.pos = last;
        self.skip_semi(end);
        Ok(Some(Statement::Default {
            name,
            value: Literal::classify(&raw),
            raw,
        }))
    }

    /// Split the parenthesized list at `open` on top-level commas.
    fn args(&self, open: usize, end: usize) -> Result<(Vec<Arg>, usize), Malformed> {
        let close = matching_paren(self.tokens, open)
            .filter(|close| *close < end)
            .ok_or(Malformed)?;
        let mut args = Vec::new();
        if close == open + 1 {
            return Ok((args, close));
        }
        let mut depth = 0usize;
        let mut start = open + 1;
        for idx in open + 1..close {
            match self.tokens[idx].kind {
                TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBracket => depth = depth.saturating_sub(1),
                TokenKind::Comma if depth == 0 => {
                    args.push(self.arg(start, idx));
                    start = idx + 1;
                }
                _ => {}
            }
        }
        args.push(self.arg(start, close));
        Ok((args, close))
    }

    fn arg(&self, start: usize, stop: usize) -> Arg {
        if start >= stop {
            return Arg {
                raw: String::new(),
                string: None,
            };
        }
        let span = self.tokens[start].span.start..self.tokens[stop - 1].span.end;
        let raw = self.text[span].trim().to_string();
        let string = (stop - start == 1 && self.tokens[start].kind == TokenKind::Str)
            .then(|| unquote(&raw).to_string());
        Arg { raw, string }
    }

    fn matching_bracket(&self, open: usize, end: usize) -> Option<usize> {
        let mut depth = 0usize;
        for idx in open..end {
            match self.tokens[idx].kind {
                TokenKind::LBracket => depth += 1,
                TokenKind::RBracket => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(idx);
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn raw_between(&self, open: usize, close: usize) -> Option<String> {
        if close <= open + 1 {
            return None;
        }
        let span = self.tokens[open + 1].span.start..self.tokens[close - 1].span.end;
        let raw = self.text[span].trim();
        (!raw.is_empty()).then(|| raw.to_string())
    }

    fn kind_at(&self, idx: usize, end: usize) -> Option<TokenKind> {
        if idx >= end {
            return None;
        }
        self.tokens.get(idx).map(|token| token.kind.clone())
    }

    fn skip_semi(&mut self, end: usize) {
        if self.kind_at(self.pos, end) == Some(TokenKind::Semi) {
            self.pos += 1;
        }
    }

    fn recover(&mut self, end: usize) {
        let line = self.tokens[self.pos].line;
        while self.pos < end && self.tokens[self.pos].line == line {
            self.pos += 1;
        }
    }
}

fn dimension_of(statements: &[Statement]) -> Option<String> {
    flatten(statements).into_iter().find_map(|statement| match statement {
        Statement::Default { name, raw, .. } if name == "DIMENSION" => {
            Some(unquote(raw).to_string())
        }
        _ => None,
    })
}

#[cfg(test)]
#[path = "statement_tests.rs"]
mod tests;
