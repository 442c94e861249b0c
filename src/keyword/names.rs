//! Keyword name and category derivation.
use std::path::{Component, Path};

/// Canonical database key for a keyword name.
///
/// Leading `*` and `/` are dropped, remaining `/` and `-` become `_`, and the
/// result is uppercased. Applying it twice changes nothing.
pub fn normalize_keyword_name(raw: &str) -> String {
    raw.trim_start_matches(|c: char| c == '*' || c == '/' || c.is_whitespace())
        .trim_end_matches(|c: char| c == '*' || c.is_whitespace())
        .replace(['/', '-'], "_")
        .to_uppercase()
}

/// Keyword name for a file that does not announce one; `mat*.cfg` files expand
/// to `MAT_<REST>`.
pub fn name_from_file_stem(stem: &str) -> String {
    match stem.strip_prefix("mat") {
        Some(rest) => {
            let rest = rest.trim_start_matches(['_', '-']);
            if rest.is_empty() {
                "MAT".to_string()
            } else {
                normalize_keyword_name(&format!("MAT_{rest}"))
            }
        }
        None => normalize_keyword_name(stem),
    }
}

pub fn is_valid_canonical(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('_')
}

/// First path component (top-down) found in `vocabulary`, title-cased;
/// `"General"` otherwise.
pub fn category_from_path(path: &Path, vocabulary: &[String]) -> String {
    for component in path.components() {
        let Component::Normal(part) = component else {
            continue;
        };
        let part = part.to_string_lossy();
        let upper = part.to_uppercase();
        if vocabulary
            .iter()
            .any(|token| token.eq_ignore_ascii_case(&upper))
        {
            return title_case(&part.replace('_', " "));
        }
    }
    "General".to_string()
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
