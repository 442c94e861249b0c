//! Name matching between keyword corpora.
//!
//! Strategies run as separate passes over the whole candidate list, strictest
//! first. A looser strategy is only tried once every candidate has failed the
//! stricter ones.
use super::CleanKeyword;

/// Comparison form of a keyword name: leading `*` removed, uppercased.
pub fn normalize_match_name(name: &str) -> String {
    name.trim_start_matches('*').to_uppercase()
}

type Strategy = fn(query: &str, candidate: &str) -> bool;

pub const STRATEGIES: [(&str, Strategy); 4] = [
    ("exact", exact),
    ("base_name", base_name),
    ("prefix", prefix),
    ("word_set", word_set),
];

fn exact(query: &str, candidate: &str) -> bool {
    query == candidate
}

fn without_parameters(name: &str) -> &str {
    name.split('(').next().unwrap_or(name).trim()
}

fn base_name(query: &str, candidate: &str) -> bool {
    without_parameters(query) == without_parameters(candidate)
}

/// `CONTACT` matches `CONTACT_AIRBAG`, and `CONTACT_AIRBAG` matches any
/// candidate whose first word is `CONTACT`.
fn prefix(query: &str, candidate: &str) -> bool {
    if candidate.contains(query) || candidate.starts_with(&format!("{query}_")) {
        return true;
    }
    let first_word = candidate.split('_').next().unwrap_or(candidate);
    query.starts_with(&format!("{first_word}_"))
}

fn word_set(query: &str, candidate: &str) -> bool {
    query
        .split('_')
        .filter(|word| !word.is_empty())
        .all(|word| candidate.contains(word))
}

/// Normalized, non-empty `name` and `title` of a candidate.
fn candidate_names(candidate: &CleanKeyword) -> impl Iterator<Item = String> + '_ {
    [Some(candidate.name.as_str()), candidate.title.as_deref()]
        .into_iter()
        .flatten()
        .filter(|name| !name.is_empty())
        .map(normalize_match_name)
}

/// Index of the first candidate matched by the strictest successful strategy,
/// with that strategy's label. An empty query matches nothing.
pub fn find_match(query: &str, candidates: &[CleanKeyword]) -> Option<(usize, &'static str)> {
    let query = normalize_match_name(query);
    if query.is_empty() {
        return None;
    }
    for (label, strategy) in STRATEGIES {
        for (idx, candidate) in candidates.iter().enumerate() {
            if candidate_names(candidate).any(|name| strategy(&query, &name)) {
                return Some((idx, label));
            }
        }
    }
    None
}
