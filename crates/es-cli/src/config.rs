//! # Config
//!
//! Optional `es.toml`. Every field has a default, so a missing or partial file
//! is fine.

use std::collections::BTreeMap;
use std::path::Path;

use es_core::ValueKind;
use serde::Deserialize;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    /// Declared field kinds per set name, overriding inference.
    #[serde(default)]
    pub schema: BTreeMap<String, BTreeMap<String, ValueKind>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            format: OutputFormat::default(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn default_limit() -> usize {
    100
}

impl Config {
    /// Read `path` if it exists. A file that fails to parse is reported and
    /// replaced by the defaults.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let content = std::fs::read_to_string(path).unwrap_or_default();
        match toml::from_str(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config");
                config
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "ignoring invalid config: {}", e);
                Self::default()
            }
        }
    }

    pub fn schema_for(&self, set: &str) -> Option<&BTreeMap<String, ValueKind>> {
        self.schema.get(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.output.default_limit, 100);
        assert_eq!(config.output.format, OutputFormat::Table);
        assert!(config.schema.is_empty());
    }

    #[test]
    fn test_partial_file() {
        let config: Config = toml::from_str("[output]\nformat = \"json\"\n").unwrap();
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.default_limit, 100);
    }

    #[test]
    fn test_schema_section() {
        let config: Config = toml::from_str(
            r#"
            [output]
            default_limit = 5

            [schema.trace_a]
            num = "num"
            seq = "bigint"
            char = "str"
            "#,
        )
        .unwrap();
        assert_eq!(config.output.default_limit, 5);
        let schema = config.schema_for("trace_a").unwrap();
        assert_eq!(schema.get("seq"), Some(&ValueKind::BigInt));
        assert_eq!(schema.get("char"), Some(&ValueKind::Str));
        assert!(config.schema_for("trace_b").is_none());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load(Path::new("definitely/not/here/es.toml"));
        assert_eq!(config.output.default_limit, 100);
    }
}
