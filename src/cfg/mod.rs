//! CFG language front-end: tokens, named regions, and block statements.
mod lexer;
mod region;
mod statement;

pub use lexer::{tokenize, tokenize_with_comments, unquote, LineComment, Token, TokenKind};
pub use region::{extract_blocks, ConfigBlock};
pub use statement::{
    flatten, parse_statements, parse_statements_with_comments, Literal, Statement, ValueKind,
};

/// One named block with its parsed statements.
#[derive(Debug, Clone)]
pub struct ParsedBlock<'a> {
    pub block: ConfigBlock<'a>,
    pub statements: Vec<Statement>,
}

/// Extract and parse every `section` block of `text`.
pub fn parse_sections<'a>(text: &'a str, section: &str) -> Vec<ParsedBlock<'a>> {
    parse_sections_with(text, section, parse_statements)
}

/// [`parse_sections`] keeping `//` comments as [`Statement::LineComment`].
pub fn parse_sections_with_comments<'a>(text: &'a str, section: &str) -> Vec<ParsedBlock<'a>> {
    parse_sections_with(text, section, parse_statements_with_comments)
}

fn parse_sections_with<'a>(
    text: &'a str,
    section: &str,
    parse: fn(&str) -> Vec<Statement>,
) -> Vec<ParsedBlock<'a>> {
    extract_blocks(text, section)
        .into_iter()
        .map(|block| {
            let statements = parse(block.body);
            ParsedBlock { block, statements }
        })
        .collect()
}
