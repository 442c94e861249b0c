//! Tool configuration.
//!
//! Everything a scan needs to know about the corpus layout lives here: the
//! category vocabulary, the path markers that select a dialect, and the
//! decode ladder used for CFG text. Missing fields fall back to defaults.
use anyhow::{anyhow, Context, Result};
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fs;
use std::path::Path;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

const CATEGORY_TOKENS: [&str; 12] = [
    "MAT",
    "PROP",
    "LOADS",
    "CARDS",
    "INTER",
    "FAIL",
    "DAMP",
    "SENSOR",
    "TABLE",
    "OUTPUTBLOCK",
    "RBODY",
    "TRANSFORM",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub schema_version: u32,
    pub category_tokens: Vec<String>,
    pub ls_dyna_markers: Vec<String>,
    pub radioss_markers: Vec<String>,
    pub hierarchy_file_name: String,
    pub cfg_extension: String,
    pub encodings: Vec<TextEncoding>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        default_config()
    }
}

pub fn default_config() -> ToolConfig {
    ToolConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        category_tokens: CATEGORY_TOKENS.iter().map(|t| t.to_string()).collect(),
        ls_dyna_markers: vec!["Keyword971".to_string()],
        radioss_markers: vec!["radioss".to_string(), "RADIOSS".to_string()],
        hierarchy_file_name: "data_hierarchy.cfg".to_string(),
        cfg_extension: "cfg".to_string(),
        encodings: vec![
            TextEncoding::Utf8,
            TextEncoding::Latin1,
            TextEncoding::Cp1252,
            TextEncoding::Utf16,
        ],
    }
}

/// Render the default config as pretty JSON.
pub fn config_stub() -> Result<String> {
    serde_json::to_string_pretty(&default_config()).context("serialize config stub")
}

/// Load a config file, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<ToolConfig> {
    let Some(path) = path else {
        return Ok(default_config());
    };
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: ToolConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &ToolConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    if config.category_tokens.iter().all(|t| t.trim().is_empty()) {
        return Err(anyhow!("category_tokens must contain at least one token"));
    }
    if config.encodings.is_empty() {
        return Err(anyhow!("encodings must list at least one encoding"));
    }
    if config.hierarchy_file_name.trim().is_empty() {
        return Err(anyhow!("hierarchy_file_name must be non-empty"));
    }
    if config.cfg_extension.trim().is_empty() || config.cfg_extension.starts_with('.') {
        return Err(anyhow!(
            "cfg_extension must be a bare extension (got {:?})",
            config.cfg_extension
        ));
    }
    Ok(())
}

/// One rung of the decode ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "iso-8859-1")]
    Latin1,
    #[serde(rename = "cp1252")]
    Cp1252,
    #[serde(rename = "utf-16")]
    Utf16,
}

impl TextEncoding {
    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "iso-8859-1",
            TextEncoding::Cp1252 => "cp1252",
            TextEncoding::Utf16 => "utf-16",
        }
    }

    /// Decode `bytes`, or `None` when they are malformed in this encoding.
    ///
    /// `iso-8859-1` resolves to windows-1252, as WHATWG labels do. UTF-16
    /// follows a byte order mark and defaults to little-endian.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        let (encoding, body) = match self {
            TextEncoding::Utf8 => (UTF_8, bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)),
            TextEncoding::Latin1 | TextEncoding::Cp1252 => (WINDOWS_1252, bytes),
            TextEncoding::Utf16 => match Encoding::for_bom(bytes) {
                Some((encoding, bom_len)) if encoding == UTF_16LE || encoding == UTF_16BE => {
                    (encoding, &bytes[bom_len..])
                }
                _ => (UTF_16LE, bytes),
            },
        };
        encoding
            .decode_without_bom_handling_and_without_replacement(body)
            .map(Cow::into_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = default_config();
        validate_config(&config).unwrap();
        assert_eq!(config.category_tokens.len(), 12);
        assert_eq!(config.encodings[0], TextEncoding::Utf8);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"ls_dyna_markers": ["Keyword971", "lsdyna"]}}"#).unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.ls_dyna_markers, vec!["Keyword971", "lsdyna"]);
        assert_eq!(config.hierarchy_file_name, "data_hierarchy.cfg");
        assert_eq!(config.encodings.len(), 4);
    }

    #[test]
    fn rejects_unknown_schema_version() {
        let config = ToolConfig {
            schema_version: 2,
            ..default_config()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("schema_version"));
    }

    #[test]
    fn rejects_empty_vocabulary_and_ladder() {
        let config = ToolConfig {
            category_tokens: Vec::new(),
            ..default_config()
        };
        assert!(validate_config(&config).is_err());
        let config = ToolConfig {
            encodings: Vec::new(),
            ..default_config()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn encodings_round_trip_through_labels() {
        let text = config_stub().unwrap();
        assert!(text.contains("\"iso-8859-1\""));
        let parsed: ToolConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, default_config());
    }

    #[test]
    fn utf8_rejects_latin1_bytes() {
        assert_eq!(TextEncoding::Utf8.decode(b"caf\xE9"), None);
        assert_eq!(
            TextEncoding::Latin1.decode(b"caf\xE9").as_deref(),
            Some("caf\u{e9}")
        );
        assert_eq!(
            TextEncoding::Utf8.decode(b"\xEF\xBB\xBFok").as_deref(),
            Some("ok")
        );
    }

    #[test]
    fn latin1_and_cp1252_share_the_windows_table() {
        for encoding in [TextEncoding::Latin1, TextEncoding::Cp1252] {
            assert_eq!(
                encoding.decode(b"\x80 \x93q\x94").as_deref(),
                Some("\u{20AC} \u{201C}q\u{201D}")
            );
            assert_eq!(encoding.decode(b"\x81").as_deref(), Some("\u{81}"));
        }
    }

    #[test]
    fn utf16_honors_byte_order_mark() {
        assert_eq!(
            TextEncoding::Utf16.decode(b"\xFF\xFEA\x00B\x00").as_deref(),
            Some("AB")
        );
        assert_eq!(
            TextEncoding::Utf16.decode(b"\xFE\xFF\x00A\x00B").as_deref(),
            Some("AB")
        );
        assert_eq!(
            TextEncoding::Utf16.decode(b"A\x00B\x00").as_deref(),
            Some("AB")
        );
        assert_eq!(TextEncoding::Utf16.decode(b"A\x00B"), None);
        // unpaired high surrogate
        assert_eq!(TextEncoding::Utf16.decode(b"\x00\xD8A\x00"), None);
    }
}
