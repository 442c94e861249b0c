//! Alias-to-file mapping from `data_hierarchy.cfg` files.
//!
//! Each version directory of a CFG corpus carries a hierarchy file whose
//! `HIERARCHY { FILE = "..."; USER_NAMES = (...); }` blocks name the keyword
//! aliases a CFG file implements. Blocks nest; every level is visited. A
//! block without a live `FILE` falls back to a commented-out
//! `// FILE = "...";` line of its own.
//!
//! The first definition of an alias wins, across blocks and across files.
//! Files are therefore processed in a fixed order (version, then path).
use crate::cfg::{parse_sections_with_comments, unquote, Statement};
use crate::config::ToolConfig;
use crate::util::{read_cfg_text, slash_path};
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

mod report;

pub use report::render_report;

/// One `FILE`/`USER_NAMES` pair from a hierarchy block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyEntry {
    pub file: String,
    pub user_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyAlias {
    pub relative_path: String,
    pub full_path: String,
    pub version: String,
    /// Numeric part of `KeywordNNN`, `"unknown"` when the directory name has none.
    pub base_version: String,
    /// `R...` release suffix, `"base"` when absent.
    pub release: String,
    pub source_file: String,
}

/// A hierarchy file found under a corpus root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyFile {
    /// Name of the directory holding the file.
    pub version: String,
    pub relative_path: String,
    pub full_path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HierarchyMapping {
    pub aliases: BTreeMap<String, HierarchyAlias>,
    pub files_processed: usize,
    pub files_errored: usize,
}

/// Every `FILE`/`USER_NAMES` pair in `text`, in source order.
pub fn parse_hierarchy_text(text: &str) -> Vec<HierarchyEntry> {
    let mut entries = Vec::new();
    for block in parse_sections_with_comments(text, "HIERARCHY") {
        collect_entries(&block.statements, &mut entries);
    }
    entries
}

fn commented_file_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\bFILE\s*=\s*"([^"]+)""#).expect("regex for commented FILE lines")
    })
}

fn collect_entries(statements: &[Statement], entries: &mut Vec<HierarchyEntry>) {
    let mut file = None;
    let mut commented_file = None;
    let mut user_names = None;
    for statement in statements {
        match statement {
            Statement::Default { name, raw, .. } if name == "FILE" && file.is_none() => {
                file = Some(unquote(raw).trim().to_string());
            }
            Statement::LineComment(text) if commented_file.is_none() => {
                commented_file = commented_file_re()
                    .captures(text)
                    .map(|caps| caps[1].trim().to_string());
            }
            Statement::List { name, items } if name == "USER_NAMES" && user_names.is_none() => {
                user_names = Some(items.clone());
            }
            Statement::Block { statements, .. } => collect_entries(statements, entries),
            _ => {}
        }
    }
    let file = match (file, commented_file) {
        (Some(file), _) => Some(file),
        (None, Some(commented)) => {
            tracing::debug!(file = %commented, "using commented-out FILE");
            Some(commented)
        }
        (None, None) => None,
    };
    if let (Some(file), Some(user_names)) = (file, user_names) {
        if !file.is_empty() && !user_names.is_empty() {
            entries.push(HierarchyEntry { file, user_names });
        }
    }
}

/// `*`-prefixed alias for a user name.
pub fn alias_name(user_name: &str) -> String {
    if user_name.starts_with('*') {
        user_name.to_string()
    } else {
        format!("*{user_name}")
    }
}

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)Keyword(\d+)(?:_(R\d+(?:\.\d+)*))?").expect("regex for version names")
    })
}

/// `(base_version, release)` from a version directory name.
pub fn parse_version(version: &str) -> (String, String) {
    match version_re().captures(version) {
        Some(caps) => (
            caps[1].to_string(),
            caps.get(2)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "base".to_string()),
        ),
        None => ("unknown".to_string(), "base".to_string()),
    }
}

/// Aliases defined by one hierarchy file, added to `aliases` unless present.
/// Returns the number of new aliases.
pub fn map_hierarchy_text(
    text: &str,
    hierarchy_path: &Path,
    version: &str,
    aliases: &mut BTreeMap<String, HierarchyAlias>,
) -> usize {
    let dir = hierarchy_path.parent().unwrap_or_else(|| Path::new(""));
    let source_file = hierarchy_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let (base_version, release) = parse_version(version);
    let mut added = 0;
    for entry in parse_hierarchy_text(text) {
        let relative_path = entry.file.replace('\\', "/");
        let full_path = slash_path(&dir.join(&relative_path));
        for user_name in &entry.user_names {
            if user_name.is_empty() {
                continue;
            }
            let alias = alias_name(user_name);
            if aliases.contains_key(&alias) {
                tracing::debug!(alias = %alias, version, "alias already mapped; keeping first");
                continue;
            }
            aliases.insert(
                alias,
                HierarchyAlias {
                    relative_path: relative_path.clone(),
                    full_path: full_path.clone(),
                    version: version.to_string(),
                    base_version: base_version.clone(),
                    release: release.clone(),
                    source_file: source_file.clone(),
                },
            );
            added += 1;
        }
    }
    added
}

/// Every hierarchy file under `root`, sorted by version directory then path.
pub fn find_hierarchy_files(root: &Path, config: &ToolConfig) -> Result<Vec<HierarchyFile>> {
    if !root.is_dir() {
        return Err(anyhow!("hierarchy root {} is not a directory", root.display()));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walk {}", root.display()))?;
        if !entry.file_type().is_file()
            || entry.file_name().to_string_lossy() != config.hierarchy_file_name
        {
            continue;
        }
        let full_path = entry.path().to_path_buf();
        let version = full_path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let relative_path = slash_path(full_path.strip_prefix(root).unwrap_or(&full_path));
        files.push(HierarchyFile {
            version,
            relative_path,
            full_path,
        });
    }
    files.sort_by(|a, b| {
        a.version
            .cmp(&b.version)
            .then_with(|| a.relative_path.cmp(&b.relative_path))
    });
    Ok(files)
}

/// Map every file in order. A file that cannot be read is logged and skipped.
pub fn map_hierarchy_files(files: &[HierarchyFile], config: &ToolConfig) -> HierarchyMapping {
    let mut mapping = HierarchyMapping::default();
    for file in files {
        let text = match read_cfg_text(&file.full_path, &config.encodings) {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::warn!(path = %file.full_path.display(), "hierarchy file not found");
                mapping.files_errored += 1;
                continue;
            }
            Err(err) => {
                tracing::warn!(path = %file.full_path.display(), error = %err, "skipping hierarchy file");
                mapping.files_errored += 1;
                continue;
            }
        };
        let added = map_hierarchy_text(&text, &file.full_path, &file.version, &mut mapping.aliases);
        mapping.files_processed += 1;
        tracing::info!(version = %file.version, path = %file.relative_path, aliases = added, "mapped hierarchy file");
    }
    mapping
}
