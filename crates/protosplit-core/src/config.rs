//! Run configuration loaded from TOML.
//!
//! Every table is `#[serde(default)]`, so an empty file yields the defaults
//! below and a partial file only overrides what it names.

use crate::error::{Error, Result};
use crate::split::OBFUSCATED_NAME_PATTERN;
use crate::vocabulary::SUPPRESSED_TYPES;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "protosplit.toml";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Game version written into the shared header
    pub game_version: String,
    /// Obfuscated schema input
    pub input_file: PathBuf,
    /// Tab-separated mapping input
    pub mapping_file: PathBuf,
    /// Directory for the de-obfuscated single-file schema
    pub replace_output_dir: PathBuf,
    /// Directory for per-block files
    pub split_output_dir: PathBuf,
    /// Static lines appended to the shared header after parsing
    pub header_content: Vec<String>,
    /// Empty output directories before writing
    pub clear_output_dirs: bool,
    /// Append the replacement note to rewritten lines
    pub annotate_replacements: bool,
    /// Parser heuristics
    pub parser: ParserSettings,
    /// Names never emitted
    pub blacklist: BlacklistSettings,
    /// Opcode table generation
    pub opcodes: OpcodeSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game_version: "1.0.0".to_string(),
            input_file: PathBuf::from("proto/input/all_in_one.proto"),
            mapping_file: PathBuf::from("proto/input/mapping.tsv"),
            replace_output_dir: PathBuf::from("proto/all_in_one_proto_output"),
            split_output_dir: PathBuf::from("proto/dispersible_proto_output"),
            header_content: vec!["option java_package = \"emu.grasscutter.net.proto\";".to_string()],
            clear_output_dirs: true,
            annotate_replacements: true,
            parser: ParserSettings::default(),
            blacklist: BlacklistSettings::default(),
            opcodes: OpcodeSettings::default(),
        }
    }
}

/// Heuristics tied to one obfuscation convention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Names matching this are treated as still obfuscated; empty disables
    pub obfuscated_name_pattern: String,
    /// Leading tokens never treated as imports
    pub suppressed_types: Vec<String>,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            obfuscated_name_pattern: OBFUSCATED_NAME_PATTERN.to_string(),
            suppressed_types: SUPPRESSED_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Block names excluded from emission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlacklistSettings {
    /// Names listed inline
    pub names: Vec<String>,
    /// JSON object file; keys whose value is `true` are blacklisted
    pub file: Option<PathBuf>,
}

impl BlacklistSettings {
    /// Inline names plus the names enabled in `file`, if any
    pub fn resolve(&self) -> Result<Vec<String>> {
        let mut names = self.names.clone();
        if let Some(path) = &self.file {
            let text = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
            names.extend(parse_blacklist(&text)?);
        }
        Ok(names)
    }
}

/// Keys of a JSON object whose value is `true`, in key order
pub fn parse_blacklist(json: &str) -> Result<Vec<String>> {
    let map: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;
    Ok(map
        .into_iter()
        .filter(|(_, v)| v.as_bool().unwrap_or(false))
        .map(|(k, _)| k)
        .collect())
}

/// Opcode table output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpcodeSettings {
    /// Generate the table
    pub enabled: bool,
    /// First line of the generated file
    pub package_header: String,
    /// Output directory
    pub output_dir: PathBuf,
}

impl Default for OpcodeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            package_header: "package emu.grasscutter.net.packet;".to_string(),
            output_dir: PathBuf::from("proto/packet_opcodes_output"),
        }
    }
}

impl Config {
    /// Parses a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Self::from_toml_str(&text)
    }

    /// The shared header's leading line
    pub fn game_version_line(&self) -> String {
        format!("// Game Version: {}", self.game_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml_str(
            r#"
            game_version = "5.4.0"
            header_content = []

            [parser]
            obfuscated_name_pattern = ""

            [opcodes]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.game_version_line(), "// Game Version: 5.4.0");
        assert!(config.header_content.is_empty());
        assert!(config.parser.obfuscated_name_pattern.is_empty());
        assert_eq!(config.parser.suppressed_types, vec!["google"]);
        assert!(!config.opcodes.enabled);
        assert_eq!(
            config.opcodes.package_header,
            "package emu.grasscutter.net.packet;"
        );
        assert!(config.clear_output_dirs);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml_str("game_version = [").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_parse_blacklist() {
        let names = parse_blacklist(r#"{"Zeta": true, "Alpha": true, "Off": false, "Odd": 1}"#)
            .unwrap();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
        assert!(parse_blacklist("[1, 2]").is_err());
    }
}
