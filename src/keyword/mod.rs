//! Normalized keyword schemas built from parsed CFG files.
//!
//! One CFG file normally describes one keyword; a GUI block that assigns
//! several `KEYWORD_STR` variants yields one schema per variant, all sharing
//! the same attributes and card layout.
use crate::cfg::{Literal, ValueKind};
use crate::config::ToolConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod builder;
mod names;

pub use builder::{build_keywords, parse_cfg, ParsedCfg};
pub use names::{category_from_path, is_valid_canonical, name_from_file_stem, normalize_keyword_name};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDeclaration {
    pub name: String,
    pub value_kind: ValueKind,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub description: String,
    pub dimension: String,
    pub required: bool,
    /// Leading underscore: hidden/internal attribute.
    pub internal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Literal>,
}

/// One fixed-column input line of a keyword's record layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFormat {
    pub format: String,
    pub fields: Vec<String>,
    pub comment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definitions {
    pub data_names: Vec<String>,
}

/// Input dialect of a CFG file, detected from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormatDialect {
    LsDyna,
    #[serde(rename = "OPENRADIOSS")]
    OpenRadioss,
    Unknown,
}

impl FormatDialect {
    pub fn detect(path: &str, config: &ToolConfig) -> FormatDialect {
        if config.ls_dyna_markers.iter().any(|m| path.contains(m.as_str())) {
            FormatDialect::LsDyna
        } else if config.radioss_markers.iter().any(|m| path.contains(m.as_str())) {
            FormatDialect::OpenRadioss
        } else {
            FormatDialect::Unknown
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormatDialect::LsDyna => "LS-DYNA",
            FormatDialect::OpenRadioss => "Radioss",
            FormatDialect::Unknown => "CFG",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordSchema {
    #[serde(rename = "name")]
    pub canonical_name: String,
    #[serde(rename = "header")]
    pub header_template: String,
    pub category: String,
    pub attributes: Vec<AttributeDeclaration>,
    pub card_formats: Vec<CardFormat>,
    pub identifiers: BTreeMap<String, String>,
    pub definitions: Definitions,
    pub defaults: BTreeMap<String, Literal>,
    pub source_file: String,
    #[serde(rename = "format_type")]
    pub format_dialect: FormatDialect,
    #[serde(default)]
    pub format_version: Option<String>,
}

impl KeywordSchema {
    pub fn attribute(&self, name: &str) -> Option<&AttributeDeclaration> {
        self.attributes.iter().find(|attr| attr.name == name)
    }
}
