use super::HierarchyAlias;
use std::collections::BTreeMap;

const RULE_WIDTH: usize = 80;

fn category_of(relative_path: &str) -> &str {
    match relative_path.split_once('/') {
        Some((first, _)) if !first.is_empty() => first,
        _ => "UNCATEGORIZED",
    }
}

fn config_file_of(relative_path: &str) -> &str {
    relative_path.rsplit('/').next().unwrap_or(relative_path)
}

/// Plain-text report of an alias mapping, grouped by the first directory of
/// each alias's relative path.
pub fn render_report(aliases: &BTreeMap<String, HierarchyAlias>) -> String {
    let mut groups: BTreeMap<&str, Vec<(&str, &str)>> = BTreeMap::new();
    for (alias, entry) in aliases {
        groups
            .entry(category_of(&entry.relative_path))
            .or_default()
            .push((alias.as_str(), config_file_of(&entry.relative_path)));
    }

    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();
    out.push_str(&format!("{rule}\n"));
    out.push_str("KEYWORD MAPPING REPORT\n");
    out.push_str(&format!("{rule}\n"));
    out.push_str(&format!("Total keywords: {}\n", aliases.len()));
    out.push_str(&format!("Categories: {}\n", groups.len()));
    out.push('\n');
    for (category, mut entries) in groups {
        entries.sort();
        out.push_str(&format!("[{category}] ({} keywords)\n", entries.len()));
        out.push_str(&format!("{}\n", "-".repeat(RULE_WIDTH)));
        for (alias, config_file) in entries {
            out.push_str(&format!("{alias:<40} | {config_file}\n"));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alias(relative_path: &str) -> HierarchyAlias {
        HierarchyAlias {
            relative_path: relative_path.to_string(),
            full_path: format!("/cfg/Keyword971/{relative_path}"),
            version: "Keyword971".to_string(),
            base_version: "971".to_string(),
            release: "base".to_string(),
            source_file: "data_hierarchy.cfg".to_string(),
        }
    }

    #[test]
    fn groups_by_first_segment() {
        let mut aliases = BTreeMap::new();
        aliases.insert("*MAT_ELASTIC".to_string(), alias("MAT/mat_elastic.cfg"));
        aliases.insert("*MAT_001".to_string(), alias("MAT/mat_elastic.cfg"));
        aliases.insert("*PART".to_string(), alias("part.cfg"));
        let report = render_report(&aliases);

        assert!(report.contains("Total keywords: 3\nCategories: 2\n"));
        let mat = report.find("[MAT] (2 keywords)").unwrap();
        let other = report.find("[UNCATEGORIZED] (1 keywords)").unwrap();
        assert!(mat < other);
        let first = report.find("*MAT_001").unwrap();
        let second = report.find("*MAT_ELASTIC").unwrap();
        assert!(first < second);
        assert!(report.contains(&format!("{:<40} | part.cfg", "*PART")));
    }

    #[test]
    fn empty_mapping_renders_totals_only() {
        let report = render_report(&BTreeMap::new());
        assert!(report.contains("Total keywords: 0"));
        assert!(!report.contains('['));
    }
}
