use super::{normalize_match_name, MergedKeywordRecord};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// `{"ls_dyna_syntax": {"examples": {"<example>": {"keyword": "...", ...}}}}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SyntaxCorpus {
    pub ls_dyna_syntax: SyntaxSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SyntaxSection {
    pub examples: BTreeMap<String, Value>,
}

/// Syntax examples keyed by the normalized keyword they illustrate, so
/// `*MAT_ELASTIC` and `MAT_ELASTIC` find the same example.
#[derive(Debug, Clone, Default)]
pub struct SyntaxIndex {
    by_keyword: BTreeMap<String, Value>,
}

impl SyntaxIndex {
    /// The first example (in example-name order) wins a shared keyword.
    pub fn new(corpus: &SyntaxCorpus) -> Self {
        let mut by_keyword = BTreeMap::new();
        for example in corpus.ls_dyna_syntax.examples.values() {
            let Some(keyword) = example.get("keyword").and_then(Value::as_str) else {
                continue;
            };
            let keyword = normalize_match_name(keyword);
            if !keyword.is_empty() {
                by_keyword.entry(keyword).or_insert_with(|| example.clone());
            }
        }
        SyntaxIndex { by_keyword }
    }

    pub fn len(&self) -> usize {
        self.by_keyword.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_keyword.is_empty()
    }

    /// Exact keyword first, then the first keyword (in sorted order) that
    /// starts with `name` minus any parenthesized suffix.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let name = normalize_match_name(name.trim());
        if let Some(example) = self.by_keyword.get(&name) {
            return Some(example);
        }
        let base = name.split('(').next().unwrap_or(&name).trim();
        if base.is_empty() {
            return None;
        }
        self.by_keyword
            .iter()
            .find(|(keyword, _)| keyword.starts_with(base))
            .map(|(_, example)| example)
    }
}

/// Fill `syntax_example` for every record the index knows, by name and then
/// by title. Returns how many records received one.
pub fn attach_syntax(records: &mut [MergedKeywordRecord], index: &SyntaxIndex) -> usize {
    let mut attached = 0;
    for record in records.iter_mut() {
        let example = index
            .lookup(&record.name)
            .or_else(|| index.lookup(&record.title));
        if let Some(example) = example {
            record.syntax_example = example.clone();
            record
                .provenance
                .insert("syntax_example".to_string(), "syntax".to_string());
            attached += 1;
        }
    }
    attached
}
