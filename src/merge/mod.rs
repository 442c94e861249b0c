//! Merge a broad keyword corpus with a documented one.
//!
//! The "dynamic" corpus (usually a CFG scan export) defines which keywords
//! exist; the "clean" corpus contributes ids, descriptions, documentation and
//! categories. Both are decoded once into optional-field records with empty
//! defaults, so a missing or `null` upstream field never turns into a missing
//! key or a failed run.
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

mod matcher;
mod syntax;

pub use matcher::{find_match, normalize_match_name};
pub use syntax::{attach_syntax, SyntaxCorpus, SyntaxIndex};

/// `null` decodes like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// One entry of the broad corpus. Fields not named here are carried through
/// the merge untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicKeyword {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub documentation: String,
    #[serde(deserialize_with = "null_as_default")]
    pub parameters: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of the documented corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanKeyword {
    pub id: Option<Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub title: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub documentation: Option<String>,
    pub documentation_url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub parameters: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergedKeywordRecord {
    pub id: Option<Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub documentation: String,
    #[serde(deserialize_with = "null_as_default")]
    pub documentation_url: String,
    pub syntax_example: Value,
    #[serde(deserialize_with = "null_as_default")]
    pub parameters: Vec<Value>,
    /// Corpus the record itself came from.
    #[serde(deserialize_with = "null_as_default")]
    pub source: String,
    /// Field name to the corpus that supplied it.
    #[serde(deserialize_with = "null_as_default")]
    pub provenance: BTreeMap<String, String>,
    /// Name-matching strategy that paired the record with a clean entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_by: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MergedKeywordRecord {
    /// Normalized name and title, for exact lookups.
    pub fn match_names(&self) -> BTreeSet<String> {
        [self.name.as_str(), self.title.as_str()]
            .into_iter()
            .filter(|name| !name.is_empty())
            .map(normalize_match_name)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeMetadata {
    pub source_files: Vec<String>,
    pub total_keywords: usize,
    pub keywords_with_documentation: usize,
    pub documentation_coverage: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedDocument {
    pub metadata: MergeMetadata,
    pub keywords: Vec<MergedKeywordRecord>,
}

/// Labels recorded in `source`/`provenance` and `metadata.source_files`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSources {
    pub dynamic: String,
    pub clean: String,
}

pub fn format_percent(part: usize, whole: usize) -> String {
    if whole == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", part as f64 / whole as f64 * 100.0)
}

fn documentation_url(clean: &CleanKeyword) -> String {
    if let Some(url) = clean.documentation_url.as_deref().filter(|u| !u.is_empty()) {
        return url.to_string();
    }
    match clean.documentation.as_deref() {
        Some(doc) if doc.starts_with("http://") || doc.starts_with("https://") => doc.to_string(),
        _ => String::new(),
    }
}

fn merge_one(
    dynamic: &DynamicKeyword,
    clean: Option<(&CleanKeyword, &'static str)>,
    sources: &MergeSources,
) -> MergedKeywordRecord {
    let mut record = MergedKeywordRecord {
        id: None,
        name: dynamic.name.clone(),
        title: dynamic.title.clone(),
        category: dynamic.category.clone(),
        description: dynamic.description.clone(),
        documentation: dynamic.documentation.clone(),
        documentation_url: String::new(),
        syntax_example: Value::Null,
        parameters: dynamic.parameters.clone(),
        source: sources.dynamic.clone(),
        provenance: BTreeMap::new(),
        matched_by: None,
        extra: dynamic.extra.clone(),
    };
    for field in ["name", "category", "description", "documentation", "parameters"] {
        record
            .provenance
            .insert(field.to_string(), sources.dynamic.clone());
    }
    let Some((clean, strategy)) = clean else {
        return record;
    };

    record.id = clean.id.clone();
    record.provenance.insert("id".to_string(), sources.clean.clone());
    if let Some(description) = clean.description.as_deref().filter(|d| !d.is_empty()) {
        record.description = description.to_string();
        record
            .provenance
            .insert("description".to_string(), sources.clean.clone());
    }
    if let Some(documentation) = &clean.documentation {
        record.documentation = documentation.clone();
        record
            .provenance
            .insert("documentation".to_string(), sources.clean.clone());
    }
    if let Some(category) = &clean.category {
        record.category = category.clone();
        record
            .provenance
            .insert("category".to_string(), sources.clean.clone());
    }
    record.documentation_url = documentation_url(clean);
    if !record.documentation_url.is_empty() {
        record
            .provenance
            .insert("documentation_url".to_string(), sources.clean.clone());
    }
    record.matched_by = Some(strategy.to_string());
    record
}

fn from_clean(clean: &CleanKeyword, sources: &MergeSources) -> MergedKeywordRecord {
    let mut record = MergedKeywordRecord {
        id: clean.id.clone(),
        name: clean.name.clone(),
        title: clean.title.clone().unwrap_or_else(|| clean.name.clone()),
        category: clean
            .category
            .clone()
            .unwrap_or_else(|| "General".to_string()),
        description: clean.description.clone().unwrap_or_default(),
        documentation: clean.documentation.clone().unwrap_or_default(),
        documentation_url: documentation_url(clean),
        parameters: clean.parameters.clone(),
        source: sources.clean.clone(),
        ..MergedKeywordRecord::default()
    };
    for field in ["id", "name", "category", "description", "documentation", "parameters"] {
        record
            .provenance
            .insert(field.to_string(), sources.clean.clone());
    }
    record
}

/// Merge `clean` into `dynamic`, then append clean entries nothing matched.
pub fn merge_collections(
    dynamic: &[DynamicKeyword],
    clean: &[CleanKeyword],
    sources: &MergeSources,
) -> MergedDocument {
    let mut keywords = Vec::with_capacity(dynamic.len());
    let mut matched = 0;
    for entry in dynamic {
        let query = if entry.title.is_empty() {
            &entry.name
        } else {
            &entry.title
        };
        let found = find_match(query, clean).map(|(idx, strategy)| (&clean[idx], strategy));
        if let Some((candidate, strategy)) = found {
            tracing::debug!(keyword = %query, clean = %candidate.name, strategy, "matched");
            matched += 1;
        }
        keywords.push(merge_one(entry, found, sources));
    }

    let mut seen: BTreeSet<String> = keywords.iter().flat_map(|k| k.match_names()).collect();
    let mut appended = 0;
    for entry in clean {
        if entry.name.is_empty() {
            continue;
        }
        if seen.insert(normalize_match_name(&entry.name)) {
            keywords.push(from_clean(entry, sources));
            appended += 1;
        }
    }
    tracing::info!(
        dynamic = dynamic.len(),
        clean = clean.len(),
        matched,
        appended,
        "merged keyword corpora"
    );

    MergedDocument {
        metadata: MergeMetadata {
            source_files: vec![sources.dynamic.clone(), sources.clean.clone()],
            total_keywords: keywords.len(),
            keywords_with_documentation: matched,
            documentation_coverage: format_percent(matched, keywords.len()),
        },
        keywords,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterMetadata {
    pub source: String,
    pub total_keywords: usize,
    pub original_keywords: usize,
    pub matched_keywords: usize,
    pub coverage: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteredDocument {
    pub metadata: FilterMetadata,
    pub keywords: Vec<MergedKeywordRecord>,
}

/// Keep the merged records whose name or title is a clean keyword's name or
/// title (after normalization).
pub fn filter_to_clean(
    unified: &MergedDocument,
    clean: &[CleanKeyword],
    source: String,
) -> FilteredDocument {
    let clean_names: BTreeSet<String> = clean
        .iter()
        .flat_map(|entry| [Some(entry.name.as_str()), entry.title.as_deref()])
        .flatten()
        .filter(|name| !name.is_empty())
        .map(normalize_match_name)
        .collect();
    let keywords: Vec<MergedKeywordRecord> = unified
        .keywords
        .iter()
        .filter(|record| {
            record
                .match_names()
                .iter()
                .any(|name| clean_names.contains(name))
        })
        .cloned()
        .collect();
    let matched = keywords.len();
    FilteredDocument {
        metadata: FilterMetadata {
            source,
            total_keywords: matched,
            original_keywords: unified.keywords.len(),
            matched_keywords: matched,
            coverage: format!(
                "{} of clean keywords matched",
                format_percent(matched, clean.len())
            ),
        },
        keywords,
    }
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
