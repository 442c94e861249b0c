use super::names::{category_from_path, is_valid_canonical, name_from_file_stem, normalize_keyword_name};
use super::{AttributeDeclaration, CardFormat, Definitions, FormatDialect, KeywordSchema};
use crate::cfg::{flatten, parse_sections, tokenize, Literal, ParsedBlock, Statement, TokenKind, ValueKind};
use std::collections::BTreeMap;
use std::path::Path;

const KEYWORD_STR: &str = "KEYWORD_STR";

/// Section-level parse of one CFG file, before names are assigned.
#[derive(Debug, Clone, Default)]
pub struct ParsedCfg {
    pub attributes: Vec<AttributeDeclaration>,
    pub card_formats: Vec<CardFormat>,
    pub identifiers: BTreeMap<String, String>,
    pub definitions: Definitions,
    pub defaults: BTreeMap<String, Literal>,
    /// Raw `ASSIGN(KEYWORD_STR, ...)` values from GUI blocks, in order.
    pub keyword_strings: Vec<String>,
    pub format_header: Option<String>,
    pub gui_header: Option<String>,
    pub format_version: Option<String>,
}

impl ParsedCfg {
    fn header(&self) -> Option<String> {
        self.format_header
            .clone()
            .or_else(|| self.keyword_strings.first().cloned())
            .or_else(|| self.gui_header.clone())
            .filter(|header| !header.trim().is_empty())
    }
}

/// Parse every recognized section of a CFG file. Missing sections are empty.
pub fn parse_cfg(text: &str) -> ParsedCfg {
    let mut parsed = ParsedCfg::default();

    let gui = parse_sections(text, "GUI");
    for block in &gui {
        for statement in flatten(&block.statements) {
            match statement {
                Statement::Assign { target, value, .. } if target == KEYWORD_STR => {
                    if !parsed.keyword_strings.contains(value) {
                        parsed.keyword_strings.push(value.clone());
                    }
                }
                Statement::Header(header) if parsed.gui_header.is_none() => {
                    parsed.gui_header = Some(header.clone());
                }
                _ => {}
            }
        }
    }

    for block in parse_sections(text, "DEFAULTS") {
        for statement in flatten(&block.statements) {
            if let Statement::Default { name, value, .. } = statement {
                parsed
                    .defaults
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
            }
        }
    }

    let mandatory = gui.iter().find_map(|block| mandatory_span(block.block.body));
    for block in parse_sections(text, "ATTRIBUTES") {
        for statement in flatten(&block.statements) {
            let Some(mut attribute) = attribute_from(statement) else {
                continue;
            };
            if parsed.attributes.iter().any(|a| a.name == attribute.name) {
                continue;
            }
            attribute.dimension = dimension_for(&gui, &attribute.name);
            attribute.required = mandatory.is_some_and(|span| span.contains(&attribute.name));
            attribute.default = parsed.defaults.get(&attribute.name).cloned();
            parsed.attributes.push(attribute);
        }
    }

    if let Some(format) = parse_sections(text, "FORMAT").into_iter().next() {
        parsed.format_version = format.block.qualifier.clone();
        let mut pending_comment: Option<String> = None;
        for statement in flatten(&format.statements) {
            match statement {
                Statement::Header(header) if parsed.format_header.is_none() => {
                    parsed.format_header = Some(header.clone());
                }
                Statement::Comment(comment) => pending_comment = Some(comment.clone()),
                Statement::Card { format, fields } => parsed.card_formats.push(CardFormat {
                    format: format.clone(),
                    fields: fields.clone(),
                    comment: pending_comment.take().unwrap_or_default(),
                }),
                _ => {}
            }
        }
    }

    for block in parse_sections(text, "SKEYWORDS_IDENTIFIER") {
        for statement in flatten(&block.statements) {
            if let Statement::Default { name, raw, .. } = statement {
                parsed.identifiers.insert(name.clone(), raw.clone());
            }
        }
    }

    if let Some(definitions) = parse_sections(text, "DEFINITIONS").into_iter().next() {
        for statement in flatten(&definitions.statements) {
            if let Statement::List { name, items } = statement {
                if name == "DATA_NAMES" {
                    parsed.definitions.data_names = items.clone();
                }
            }
        }
    }

    parsed
}

/// Build the keyword schemas described by one CFG file.
///
/// Names come from GUI `ASSIGN(KEYWORD_STR, ...)` statements, falling back to
/// the file name. Names that normalize to nothing or to an internal `_` name
/// are dropped.
pub fn build_keywords(
    text: &str,
    path: &Path,
    dialect: FormatDialect,
    vocabulary: &[String],
) -> Vec<KeywordSchema> {
    let parsed = parse_cfg(text);
    let names = keyword_names(&parsed, path);
    if names.is_empty() {
        tracing::debug!(path = %path.display(), "no usable keyword name");
    }
    let category = category_from_path(path, vocabulary);
    let source_file = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let header = parsed.header();

    names
        .into_iter()
        .map(|name| KeywordSchema {
            header_template: header.clone().unwrap_or_else(|| format!("*{name}")),
            canonical_name: name,
            category: category.clone(),
            attributes: parsed.attributes.clone(),
            card_formats: parsed.card_formats.clone(),
            identifiers: parsed.identifiers.clone(),
            definitions: parsed.definitions.clone(),
            defaults: parsed.defaults.clone(),
            source_file: source_file.clone(),
            format_dialect: dialect,
            format_version: parsed.format_version.clone(),
        })
        .collect()
}

fn keyword_names(parsed: &ParsedCfg, path: &Path) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for raw in &parsed.keyword_strings {
        let name = normalize_keyword_name(raw);
        if is_valid_canonical(&name) && !names.contains(&name) {
            names.push(name);
        }
    }
    if names.is_empty() {
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        let name = name_from_file_stem(&stem);
        if is_valid_canonical(&name) {
            names.push(name);
        }
    }
    names
}

fn attribute_from(statement: &Statement) -> Option<AttributeDeclaration> {
    let (name, value_kind, type_tag, description, array_size) = match statement {
        Statement::Declare {
            name,
            kind,
            type_tag,
            description,
            array_size,
        } => (
            name.clone(),
            *kind,
            type_tag.clone(),
            description.clone(),
            array_size.clone(),
        ),
        Statement::Default { name, value, .. } => (
            name.clone(),
            ValueKind::Plain,
            value.type_tag().to_string(),
            String::new(),
            None,
        ),
        _ => return None,
    };
    Some(AttributeDeclaration {
        internal: name.starts_with('_'),
        name,
        value_kind,
        type_tag,
        description,
        dimension: String::new(),
        required: false,
        array_size,
        default: None,
    })
}

fn dimension_for(gui: &[ParsedBlock<'_>], attribute: &str) -> String {
    gui.iter()
        .flat_map(|block| flatten(&block.statements))
        .find_map(|statement| match statement {
            Statement::Dimension { attribute: name, unit } if name == attribute => {
                Some(unit.clone())
            }
            _ => None,
        })
        .unwrap_or_default()
}

/// Text between `mandatory:` and the next `optional:`/`mandatory:` label (or
/// the end of the block). Attribute names are matched against it by substring.
fn mandatory_span(body: &str) -> Option<&str> {
    let tokens = tokenize(body);
    let is_label = |idx: usize, name: &str| {
        tokens[idx].is_ident(body, name)
            && tokens.get(idx + 1).map(|t| &t.kind) == Some(&TokenKind::Colon)
    };
    let start_idx = (0..tokens.len()).find(|&idx| is_label(idx, "mandatory"))?;
    let start = tokens[start_idx + 1].span.end;
    let end = (start_idx + 2..tokens.len())
        .find(|&idx| is_label(idx, "optional") || is_label(idx, "mandatory"))
        .map(|idx| tokens[idx].span.start)
        .unwrap_or(body.len());
    Some(&body[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;
    use std::path::PathBuf;

    const ELASTIC: &str = r#"
// LS-DYNA elastic material
ATTRIBUTES(COMMON)
{
    E   = VALUE(FLOAT, "Young's modulus");
    PR  = VALUE(FLOAT, "Poisson's ratio");
    EPR = VALUE(FLOAT, "Plastic ratio");
    _HAS_TITLE = VALUE(INT, "Title flag");
    NPTS = 3;
}
DEFAULTS(COMMON)
{
    PR = 0.3;
    NPTS = 3;
}
GUI(COMMON)
{
    ASSIGN(KEYWORD_STR, "*MAT_ELASTIC");
    ASSIGN(KEYWORD_STR, "*MAT_001");
mandatory:
    SCALAR(E) { DIMENSION = "pressure"; }
optional:
    SCALAR(PR);
}
FORMAT(Keyword971)
{
    HEADER("*MAT_ELASTIC");
    COMMENT("$      MID        RO         E        PR");
    CARD("%10d%10lg%10lg%10lg", _ID_, RHO, E, PR);
    CARD("%10lg", EPR);
}
SKEYWORDS_IDENTIFIER(COMMON)
{
    _HAS_TITLE = 1;
    ID_TYPE = -1;
}
DEFINITIONS(COMMON)
{
    DATA_NAMES = (E, PR);
}
"#;

    fn vocabulary() -> Vec<String> {
        default_config().category_tokens
    }

    #[test]
    fn builds_one_schema_per_keyword_str() {
        let path = PathBuf::from("cfg/Keyword971/materials/mat_elastic.cfg");
        let schemas = build_keywords(ELASTIC, &path, FormatDialect::LsDyna, &vocabulary());
        let names: Vec<&str> = schemas.iter().map(|s| s.canonical_name.as_str()).collect();
        assert_eq!(names, vec!["MAT_ELASTIC", "MAT_001"]);
        for schema in &schemas {
            assert_eq!(schema.header_template, "*MAT_ELASTIC");
            assert_eq!(schema.category, "General");
            assert_eq!(schema.source_file, "mat_elastic.cfg");
            assert_eq!(schema.format_version.as_deref(), Some("Keyword971"));
        }
    }

    #[test]
    fn attributes_carry_dimension_required_and_defaults() {
        let parsed = parse_cfg(ELASTIC);
        let e = parsed.attributes.iter().find(|a| a.name == "E").unwrap();
        assert_eq!(e.type_tag, "FLOAT");
        assert_eq!(e.dimension, "pressure");
        assert!(e.required);
        let pr = parsed.attributes.iter().find(|a| a.name == "PR").unwrap();
        assert!(!pr.required);
        assert_eq!(pr.dimension, "");
        assert_eq!(pr.default, Some(Literal::Float(0.3)));
        let hidden = parsed.attributes.iter().find(|a| a.name == "_HAS_TITLE").unwrap();
        assert!(hidden.internal);
        let npts = parsed.attributes.iter().find(|a| a.name == "NPTS").unwrap();
        assert_eq!(npts.value_kind, ValueKind::Plain);
        assert_eq!(npts.type_tag, "INT");
    }

    #[test]
    fn required_flag_uses_substring_containment() {
        // `A` is only required because `AB` contains it.
        let text = "ATTRIBUTES { A = VALUE(INT); AB = VALUE(INT); }\nGUI { mandatory: SCALAR(AB); optional: SCALAR(C); }";
        let parsed = parse_cfg(text);
        assert!(parsed.attributes.iter().all(|a| a.required));
    }

    #[test]
    fn card_formats_keep_order_and_leading_comment() {
        let parsed = parse_cfg(ELASTIC);
        assert_eq!(parsed.card_formats.len(), 2);
        assert_eq!(
            parsed.card_formats[0].comment,
            "$      MID        RO         E        PR"
        );
        assert_eq!(parsed.card_formats[0].fields, vec!["_ID_", "RHO", "E", "PR"]);
        assert_eq!(parsed.card_formats[1].format, "%10lg");
        assert_eq!(parsed.card_formats[1].comment, "");
    }

    #[test]
    fn identifiers_and_definitions_are_collected() {
        let parsed = parse_cfg(ELASTIC);
        assert_eq!(parsed.identifiers.get("ID_TYPE").map(String::as_str), Some("-1"));
        assert_eq!(parsed.identifiers.get("_HAS_TITLE").map(String::as_str), Some("1"));
        assert_eq!(parsed.definitions.data_names, vec!["E", "PR"]);
    }

    #[test]
    fn falls_back_to_file_name_and_default_header() {
        let path = PathBuf::from("cfg/radioss2022/MAT/mat_law1.cfg");
        let text = "ATTRIBUTES { RHO = VALUE(FLOAT, \"Density\"); }";
        let schemas = build_keywords(text, &path, FormatDialect::OpenRadioss, &vocabulary());
        assert_eq!(schemas.len(), 1);
        let schema = &schemas[0];
        assert_eq!(schema.canonical_name, "MAT_LAW1");
        assert_eq!(schema.header_template, "*MAT_LAW1");
        assert_eq!(schema.category, "Mat");
        assert_eq!(schema.format_dialect, FormatDialect::OpenRadioss);
    }

    #[test]
    fn end_to_end_single_attribute_keyword() {
        let text = r#"
ATTRIBUTES(COMMON) { E = VALUE(FLOAT, "Young's modulus"); }
GUI(COMMON) { ASSIGN(KEYWORD_STR, "MAT_ELASTIC"); }
"#;
        let path = PathBuf::from("input/Keyword971/elastic.cfg");
        let schemas = build_keywords(text, &path, FormatDialect::LsDyna, &vocabulary());
        assert_eq!(schemas.len(), 1);
        let schema = &schemas[0];
        assert_eq!(schema.canonical_name, "MAT_ELASTIC");
        assert_eq!(schema.category, "General");
        assert_eq!(schema.attributes.len(), 1);
        let e = schema.attribute("E").unwrap();
        assert_eq!(e.type_tag, "FLOAT");
        assert!(!e.description.is_empty());
    }

    #[test]
    fn internal_keyword_strings_are_skipped() {
        let text = "GUI { ASSIGN(KEYWORD_STR, \"_HIDDEN\"); ASSIGN(KEYWORD_STR, \"*PART\"); }";
        let schemas = build_keywords(
            text,
            &PathBuf::from("x/part.cfg"),
            FormatDialect::LsDyna,
            &vocabulary(),
        );
        let names: Vec<&str> = schemas.iter().map(|s| s.canonical_name.as_str()).collect();
        assert_eq!(names, vec!["PART"]);
    }

    #[test]
    fn empty_input_never_fails() {
        let parsed = parse_cfg("");
        assert!(parsed.attributes.is_empty());
        assert!(parsed.card_formats.is_empty());
        assert!(parsed.identifiers.is_empty());
        let schemas = build_keywords(
            "",
            &PathBuf::from("_internal.cfg"),
            FormatDialect::Unknown,
            &vocabulary(),
        );
        assert!(schemas.is_empty());
    }
}
