//! Flat keyword list written by `cfgkw scan`.
use crate::cfg::{Literal, ValueKind};
use crate::keyword::{AttributeDeclaration, FormatDialect, KeywordSchema};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub description: String,
    pub dimension: String,
    pub required: bool,
    pub default: Option<Literal>,
    pub is_array: bool,
    pub array_size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRecord {
    pub name: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub documentation: String,
    pub header: String,
    pub source_file: String,
    pub format_type: FormatDialect,
    pub parameters: Vec<ParameterRecord>,
}

impl From<&AttributeDeclaration> for ParameterRecord {
    fn from(attribute: &AttributeDeclaration) -> Self {
        ParameterRecord {
            name: attribute.name.clone(),
            type_tag: attribute.type_tag.clone(),
            description: attribute.description.clone(),
            dimension: attribute.dimension.clone(),
            required: attribute.required,
            default: attribute.default.clone(),
            is_array: attribute.value_kind == ValueKind::Array,
            array_size: attribute.array_size.clone(),
        }
    }
}

impl From<&KeywordSchema> for KeywordRecord {
    fn from(schema: &KeywordSchema) -> Self {
        KeywordRecord {
            name: schema.canonical_name.clone(),
            title: schema.header_template.clone(),
            category: schema.category.clone(),
            description: format!(
                "{} keyword {}",
                schema.format_dialect.label(),
                schema.canonical_name
            ),
            documentation: String::new(),
            header: schema.header_template.clone(),
            source_file: schema.source_file.clone(),
            format_type: schema.format_dialect,
            parameters: schema
                .attributes
                .iter()
                .filter(|attribute| !attribute.internal)
                .map(ParameterRecord::from)
                .collect(),
        }
    }
}

pub fn export_keywords<'a>(schemas: impl IntoIterator<Item = &'a KeywordSchema>) -> Vec<KeywordRecord> {
    schemas.into_iter().map(KeywordRecord::from).collect()
}
