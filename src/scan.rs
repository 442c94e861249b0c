//! Directory scan: every CFG file under a corpus root into one database.
use crate::config::ToolConfig;
use crate::database::KeywordDatabase;
use crate::keyword::{build_keywords, FormatDialect, KeywordSchema};
use crate::util::{display_path, read_cfg_text, slash_path};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub format_dirs: Vec<String>,
    pub files_processed: usize,
    pub keywords_produced: usize,
    pub files_skipped: usize,
    pub files_errored: usize,
}

fn is_cfg_file(path: &Path, config: &ToolConfig) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy() == config.cfg_extension.as_str())
        && path
            .file_name()
            .is_some_and(|name| name.to_string_lossy() != config.hierarchy_file_name.as_str())
}

fn cfg_files(dir: &Path, config: &ToolConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walk {}", dir.display()))?;
        if entry.file_type().is_file() && is_cfg_file(entry.path(), config) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Immediate subdirectories of `root` holding at least one CFG file, sorted.
pub fn find_format_dirs(root: &Path, config: &ToolConfig) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(anyhow!("CFG root {} is not a directory", root.display()));
    }
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("list {}", root.display()))?;
        if entry.file_type().is_dir() && !cfg_files(entry.path(), config)?.is_empty() {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

/// Schemas for one file, or `None` when its dialect is not recognized.
pub fn parse_cfg_file(
    path: &Path,
    config: &ToolConfig,
    dialect: FormatDialect,
) -> Result<Option<Vec<KeywordSchema>>> {
    if dialect == FormatDialect::Unknown {
        return Ok(None);
    }
    let Some(text) = read_cfg_text(path, &config.encodings)? else {
        return Err(anyhow!("{} disappeared during the scan", path.display()));
    };
    Ok(Some(build_keywords(
        &text,
        path,
        dialect,
        &config.category_tokens,
    )))
}

/// Parse every CFG file under `root`. Format directories and the files in
/// them are visited in sorted order, so a keyword defined twice resolves the
/// same way on every run: the later file wins.
pub fn scan_cfg_root(root: &Path, config: &ToolConfig) -> Result<(KeywordDatabase, ScanReport)> {
    let mut database = KeywordDatabase::new();
    let mut report = ScanReport::default();
    for dir in find_format_dirs(root, config)? {
        let label = display_path(&dir, Some(root));
        tracing::info!(dir = %label, "scanning format directory");
        for path in cfg_files(&dir, config)? {
            let dialect = FormatDialect::detect(&slash_path(&path), config);
            match parse_cfg_file(&path, config, dialect) {
                Ok(Some(schemas)) => {
                    tracing::debug!(path = %display_path(&path, Some(root)), keywords = schemas.len(), "parsed");
                    report.files_processed += 1;
                    report.keywords_produced += schemas.len();
                    for schema in schemas {
                        database.insert(schema);
                    }
                }
                Ok(None) => {
                    tracing::debug!(path = %display_path(&path, Some(root)), "unknown dialect; skipped");
                    report.files_skipped += 1;
                }
                Err(err) => {
                    tracing::warn!(path = %display_path(&path, Some(root)), error = %err, "skipping file");
                    report.files_errored += 1;
                }
            }
        }
        report.format_dirs.push(label);
    }
    tracing::info!(
        keywords = database.len(),
        files = report.files_processed,
        errored = report.files_errored,
        "database built"
    );
    Ok((database, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;
    use std::fs;

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn scans_both_dialects_and_skips_unknown() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "Keyword971/MAT/mat_elastic.cfg",
            r#"ATTRIBUTES { E = VALUE(FLOAT, "Young's modulus"); }
GUI { ASSIGN(KEYWORD_STR, "*MAT_ELASTIC"); }"#,
        );
        write(
            dir.path(),
            "radioss2022/PROP/prop_shell.cfg",
            r#"ATTRIBUTES { THICK = VALUE(FLOAT, "Thickness"); }"#,
        );
        write(dir.path(), "misc/notes.cfg", "ATTRIBUTES { A = VALUE(INT); }");
        write(dir.path(), "empty/readme.txt", "not a cfg");
        write(
            dir.path(),
            "Keyword971/data_hierarchy.cfg",
            "HIERARCHY { FILE = \"MAT/mat_elastic.cfg\"; USER_NAMES = (MAT_ELASTIC); }",
        );

        let (db, report) = scan_cfg_root(dir.path(), &default_config()).unwrap();
        assert_eq!(report.format_dirs, vec!["Keyword971", "misc", "radioss2022"]);
        assert_eq!(report.files_processed, 2);
        assert_eq!(report.files_skipped, 1);
        assert_eq!(report.files_errored, 0);
        assert_eq!(db.len(), 2);

        let elastic = db.get("MAT_ELASTIC").unwrap();
        assert_eq!(elastic.category, "Mat");
        assert_eq!(elastic.format_dialect, FormatDialect::LsDyna);
        let shell = db.get("PROP_SHELL").unwrap();
        assert_eq!(shell.format_dialect, FormatDialect::OpenRadioss);
        assert_eq!(shell.category, "Prop");
    }

    #[test]
    fn later_file_wins_for_duplicate_keyword() {
        let dir = tempfile::tempdir().unwrap();
        let text = |desc: &str| {
            format!(
                "ATTRIBUTES {{ E = VALUE(FLOAT, \"{desc}\"); }}\nGUI {{ ASSIGN(KEYWORD_STR, \"*PART\"); }}"
            )
        };
        write(dir.path(), "Keyword971/a/part.cfg", &text("first"));
        write(dir.path(), "Keyword971/b/part.cfg", &text("second"));
        let (db, report) = scan_cfg_root(dir.path(), &default_config()).unwrap();
        assert_eq!(report.keywords_produced, 2);
        assert_eq!(db.len(), 1);
        assert_eq!(db.get("PART").unwrap().attributes[0].description, "second");
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_cfg_root(&dir.path().join("absent"), &default_config()).is_err());
    }
}
