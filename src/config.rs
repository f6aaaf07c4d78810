use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const ENV_PREFIX: &str = "INCIDENTS";
const DEFAULT_FILE: &str = "incidents";

/// Corpus-tuning knobs for boundary detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Label inside the parenthesized boundary token, e.g. `Source` for `(Source)`.
    pub marker_label: String,
    /// Markers whose starts are closer than this many bytes merge into one.
    pub collapse_distance: usize,
    /// Heading substrings (case-insensitive) that open a resource/reference region.
    pub exclusion_triggers: Vec<String>,
    /// Minimal non-heading text since the last accepted marker for a new marker to count.
    pub min_title_len: usize,
    /// Longest dated block still taken as a title.
    pub max_title_chars: usize,
    pub min_heading_len: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            marker_label: "Source".to_string(),
            collapse_distance: 20,
            exclusion_triggers: vec![
                "RESOURCE LINKS".to_string(),
                "FURTHER READING".to_string(),
                "SOURCES FOR INSIDER THREAT INCIDENT POSTINGS".to_string(),
                "INSIDER THREAT INCIDENTS E-MAGAZINE".to_string(),
            ],
            min_title_len: 15,
            max_title_chars: 300,
            min_heading_len: 5,
        }
    }
}

impl ParseConfig {
    /// Defaults, then the config file (explicit path, or `incidents.*` in the
    /// working directory if present), then `INCIDENTS_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_FILE).required(false),
        };
        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(env_prefix)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("exclusion_triggers"),
            )
            .build()?;
        let parsed: ParseConfig = settings.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.marker_label.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "marker_label",
                reason: "must not be empty".into(),
            });
        }
        if self.max_title_chars == 0 {
            return Err(ConfigError::Invalid {
                field: "max_title_chars",
                reason: "must be greater than zero".into(),
            });
        }
        if self.min_heading_len == 0 {
            return Err(ConfigError::Invalid {
                field: "min_heading_len",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}
