//! In-memory keyword store with a sequential-read cursor.
//!
//! The cursor and value accessors mirror the shape of a solver's input-deck
//! reader. No deck is attached: the accessors return placeholders.
use crate::keyword::{normalize_keyword_name, KeywordSchema};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorState {
    Idle,
    Active {
        keyword: String,
        index: usize,
        count: usize,
    },
    Exhausted {
        keyword: String,
    },
}

/// Header fields of the current option; always empty without a deck.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionKey {
    pub key: String,
    pub solver_keyword: String,
    pub title: String,
    pub unit_name: String,
    pub id: i64,
    pub unit_id: i64,
    pub option: String,
}

#[derive(Debug, Clone)]
pub struct KeywordDatabase {
    keywords: BTreeMap<String, KeywordSchema>,
    cursor: CursorState,
}

impl Default for KeywordDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordDatabase {
    pub fn new() -> Self {
        KeywordDatabase {
            keywords: BTreeMap::new(),
            cursor: CursorState::Idle,
        }
    }

    /// Insert under the canonical name; a later schema replaces an earlier one.
    pub fn insert(&mut self, schema: KeywordSchema) -> Option<KeywordSchema> {
        let previous = self.keywords.insert(schema.canonical_name.clone(), schema);
        if let Some(previous) = &previous {
            tracing::debug!(
                keyword = %previous.canonical_name,
                replaced = %previous.source_file,
                "keyword redefined; keeping the later definition"
            );
        }
        previous
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn keywords(&self) -> impl Iterator<Item = &KeywordSchema> {
        self.keywords.values()
    }

    /// Names starting with or containing `pattern`, case-insensitively.
    pub fn search(&self, pattern: &str) -> Vec<&str> {
        let pattern = pattern.to_uppercase();
        self.keywords
            .keys()
            .filter(|name| name.starts_with(&pattern) || name.contains(&pattern))
            .map(String::as_str)
            .collect()
    }

    pub fn count(&self, keyword: &str) -> usize {
        self.search(keyword).len()
    }

    pub fn get(&self, name: &str) -> Option<&KeywordSchema> {
        self.keywords
            .get(&name.to_uppercase())
            .or_else(|| self.keywords.get(&normalize_keyword_name(name)))
    }

    pub fn list_by_category(&self, category: &str) -> Vec<&str> {
        self.keywords
            .values()
            .filter(|schema| schema.category == category)
            .map(|schema| schema.canonical_name.as_str())
            .collect()
    }

    /// Categories of the keywords currently stored, sorted.
    pub fn list_categories(&self) -> Vec<&str> {
        self.keywords
            .values()
            .map(|schema| schema.category.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn cursor(&self) -> &CursorState {
        &self.cursor
    }

    /// Position the cursor on the first option of `keyword`. Returns whether
    /// there is one.
    pub fn start(&mut self, keyword: &str) -> bool {
        let count = self.count(keyword);
        if count == 0 {
            self.cursor = CursorState::Idle;
            return false;
        }
        self.cursor = CursorState::Active {
            keyword: keyword.to_uppercase(),
            index: 0,
            count,
        };
        true
    }

    /// Advance to the next option. Returns `false` once the options run out
    /// or when no cursor is active.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        match &mut self.cursor {
            CursorState::Active { index, count, .. } if *index + 1 < *count => {
                *index += 1;
                true
            }
            CursorState::Active { keyword, .. } => {
                self.cursor = CursorState::Exhausted {
                    keyword: std::mem::take(keyword),
                };
                false
            }
            CursorState::Idle | CursorState::Exhausted { .. } => false,
        }
    }

    pub fn read_key(&self, _keyword: &str) -> OptionKey {
        OptionKey::default()
    }

    pub fn get_int(&self, _name: &str) -> i64 {
        0
    }

    pub fn get_float(&self, _name: &str) -> f64 {
        0.0
    }

    pub fn get_string(&self, _name: &str) -> String {
        String::new()
    }

    pub fn get_bool(&self, _name: &str) -> bool {
        false
    }

    pub fn get_int_at(&self, _name: &str, _index: usize) -> i64 {
        0
    }

    pub fn get_float_at(&self, _name: &str, _index: usize) -> f64 {
        0.0
    }

    pub fn get_float_dim(&self, _name: &str) -> f64 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyword::{Definitions, FormatDialect};

    fn schema(name: &str, category: &str, source_file: &str) -> KeywordSchema {
        KeywordSchema {
            canonical_name: name.to_string(),
            header_template: format!("*{name}"),
            category: category.to_string(),
            attributes: Vec::new(),
            card_formats: Vec::new(),
            identifiers: BTreeMap::new(),
            definitions: Definitions::default(),
            defaults: BTreeMap::new(),
            source_file: source_file.to_string(),
            format_dialect: FormatDialect::LsDyna,
            format_version: None,
        }
    }

    fn database() -> KeywordDatabase {
        let mut db = KeywordDatabase::new();
        db.insert(schema("MAT_ELASTIC", "Mat", "mat_elastic.cfg"));
        db.insert(schema("MAT_PLASTIC", "Mat", "mat_plastic.cfg"));
        db.insert(schema("PART", "General", "part.cfg"));
        db.insert(schema("SECTION_SHELL", "Prop", "section_shell.cfg"));
        db
    }

    #[test]
    fn later_insert_replaces_earlier() {
        let mut db = database();
        let previous = db.insert(schema("PART", "Cards", "part_v2.cfg"));
        assert_eq!(previous.unwrap().source_file, "part.cfg");
        assert_eq!(db.len(), 4);
        assert_eq!(db.get("part").unwrap().source_file, "part_v2.cfg");
        assert_eq!(db.list_categories(), vec!["Cards", "Mat", "Prop"]);
    }

    #[test]
    fn search_and_count_match_prefix_or_substring() {
        let db = database();
        assert_eq!(db.search("mat"), vec!["MAT_ELASTIC", "MAT_PLASTIC"]);
        assert_eq!(db.search("shell"), vec!["SECTION_SHELL"]);
        assert_eq!(db.count("ELASTIC"), 1);
        assert_eq!(db.count("NODE"), 0);
    }

    #[test]
    fn get_accepts_star_prefixed_names() {
        let db = database();
        assert!(db.get("*MAT_ELASTIC").is_some());
        assert!(db.get("mat-elastic").is_some());
        assert!(db.get("NODE").is_none());
    }

    #[test]
    fn categories_list_and_filter() {
        let db = database();
        assert_eq!(db.list_categories(), vec!["General", "Mat", "Prop"]);
        assert_eq!(db.list_by_category("Mat"), vec!["MAT_ELASTIC", "MAT_PLASTIC"]);
        assert!(db.list_by_category("Loads").is_empty());
    }

    #[test]
    fn cursor_walks_through_matching_options() {
        let mut db = database();
        assert!(!db.next());
        assert!(db.start("MAT"));
        assert_eq!(
            db.cursor(),
            &CursorState::Active {
                keyword: "MAT".to_string(),
                index: 0,
                count: 2,
            }
        );
        assert!(db.next());
        assert!(!db.next());
        assert_eq!(
            db.cursor(),
            &CursorState::Exhausted {
                keyword: "MAT".to_string()
            }
        );
        assert!(!db.next());
    }

    #[test]
    fn start_without_matches_stays_idle() {
        let mut db = database();
        assert!(!db.start("NODE"));
        assert_eq!(db.cursor(), &CursorState::Idle);
        assert!(db.start("PART"));
        assert!(!db.next());
    }

    #[test]
    fn accessors_return_placeholders() {
        let mut db = database();
        db.start("PART");
        assert_eq!(db.read_key("PART"), OptionKey::default());
        assert_eq!(db.get_int("NPTS"), 0);
        assert_eq!(db.get_float("E"), 0.0);
        assert_eq!(db.get_string("TITLE"), "");
        assert!(!db.get_bool("FLAG"));
        assert_eq!(db.get_int_at("IDS", 3), 0);
        assert_eq!(db.get_float_at("X", 1), 0.0);
        assert_eq!(db.get_float_dim("RHO"), 0.0);
    }
}
