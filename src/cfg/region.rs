//! Named brace-delimited section extraction (`SECTION(qualifier) { ... }`).
use super::lexer::{tokenize, Token, TokenKind};
use std::ops::Range;

/// A named region of CFG text; `body` excludes the outer braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigBlock<'a> {
    pub section_name: String,
    pub qualifier: Option<String>,
    pub body: &'a str,
    /// Byte range of `body` within the scanned text.
    pub body_span: Range<usize>,
}

/// Return every maximal `section` block in `text`, in file order.
///
/// Blocks without a balancing close brace are dropped; scanning resumes just
/// inside the dropped block so balanced sections nested in it still surface.
pub fn extract_blocks<'a>(text: &'a str, section: &str) -> Vec<ConfigBlock<'a>> {
    let tokens = tokenize(text);
    extract_from_tokens(text, &tokens, section)
}

pub(crate) fn extract_from_tokens<'a>(
    text: &'a str,
    tokens: &[Token],
    section: &str,
) -> Vec<ConfigBlock<'a>> {
    let mut blocks = Vec::new();
    let mut idx = 0;
    while idx < tokens.len() {
        if !tokens[idx].is_ident(text, section) {
            idx += 1;
            continue;
        }
        let Some(header) = block_header(text, tokens, idx) else {
            idx += 1;
            continue;
        };
        match matching_close(tokens, header.open) {
            Some(close) => {
                let body_span = tokens[header.open].span.end..tokens[close].span.start;
                blocks.push(ConfigBlock {
                    section_name: section.to_string(),
                    qualifier: header.qualifier,
                    body: &text[body_span.clone()],
                    body_span,
                });
                idx = close + 1;
            }
            None => {
                tracing::debug!(section, "dropping unterminated block");
                idx = header.open + 1;
            }
        }
    }
    blocks
}

struct BlockHeader {
    qualifier: Option<String>,
    /// Token index of the opening brace.
    open: usize,
}

fn block_header(text: &str, tokens: &[Token], name_idx: usize) -> Option<BlockHeader> {
    let next = tokens.get(name_idx + 1)?;
    match next.kind {
        TokenKind::LBrace => Some(BlockHeader {
            qualifier: None,
            open: name_idx + 1,
        }),
        TokenKind::LParen => {
            let close = matching_paren(tokens, name_idx + 1)?;
            let open = close + 1;
            if tokens.get(open)?.kind != TokenKind::LBrace {
                return None;
            }
            let qualifier = if close > name_idx + 2 {
                let span = tokens[name_idx + 2].span.start..tokens[close - 1].span.end;
                Some(text[span].trim().to_string())
            } else {
                None
            };
            Some(BlockHeader { qualifier, open })
        }
        _ => None,
    }
}

/// Index of the brace balancing the `{` at `open`.
pub(crate) fn matching_close(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, token) in tokens.iter().enumerate().skip(open) {
        match token.kind {
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace => {
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

/// Index of the paren balancing the `(` at `open`.
pub(crate) fn matching_paren(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, token) in tokens.iter().enumerate().skip(open) {
        match token.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            // a brace inside a call means the call was never closed
            TokenKind::LBrace | TokenKind::RBrace => return None,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_balanced_nested_body() {
        let text = "ATTRIBUTES(COMMON) {\n  A = VALUE(INT, \"a\");\n  if (x) { B = 1; }\n}\nGUI { }";
        let blocks = extract_blocks(text, "ATTRIBUTES");
        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.qualifier.as_deref(), Some("COMMON"));
        assert!(block.body.contains("if (x) { B = 1; }"));
        assert!(!block.body.contains("GUI"));
        assert_eq!(&text[block.body_span.clone()], block.body);
    }

    #[test]
    fn braces_in_strings_and_comments_are_ignored() {
        let text = "GUI() {\n  HEADER(\"}\"); // }\n  X = 1;\n}";
        let blocks = extract_blocks(text, "GUI");
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].body.contains("X = 1;"));
        assert_eq!(blocks[0].qualifier, None);
    }

    #[test]
    fn multiple_sections_are_returned_in_order() {
        let text = "DEFAULTS(COMMON) { A = 1; }\nFORMAT(Keyword971) { }\nDEFAULTS(V2) { B = 2; }";
        let blocks = extract_blocks(text, "DEFAULTS");
        let qualifiers: Vec<_> = blocks.iter().map(|b| b.qualifier.clone()).collect();
        assert_eq!(
            qualifiers,
            vec![Some("COMMON".to_string()), Some("V2".to_string())]
        );
    }

    #[test]
    fn unterminated_block_is_dropped_without_losing_others() {
        let text = "GUI(COMMON) { A = 1; }\nATTRIBUTES { B = VALUE(INT);\n";
        assert!(extract_blocks(text, "ATTRIBUTES").is_empty());
        assert_eq!(extract_blocks(text, "GUI").len(), 1);
    }

    #[test]
    fn nested_regions_stay_inside_parent_span() {
        let text = "HIERARCHY { FILE=\"a\"; HIERARCHY { FILE=\"b\"; } }";
        let outer = extract_blocks(text, "HIERARCHY");
        assert_eq!(outer.len(), 1);
        let parent = &outer[0];
        let inner = extract_blocks(parent.body, "HIERARCHY");
        assert_eq!(inner.len(), 1);
        let child = &inner[0];
        let absolute = parent.body_span.start + child.body_span.start
            ..parent.body_span.start + child.body_span.end;
        assert!(absolute.start >= parent.body_span.start && absolute.end <= parent.body_span.end);
        assert_eq!(&text[absolute], child.body);
    }

    #[test]
    fn name_must_be_followed_by_block() {
        let text = "ASSIGN(FORMAT, 1);\nFORMAT(Keyword971) { CARD(\"%10d\", A); }";
        let blocks = extract_blocks(text, "FORMAT");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].qualifier.as_deref(), Some("Keyword971"));
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(extract_blocks("", "GUI").is_empty());
    }
}
