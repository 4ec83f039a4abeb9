use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_KB_PATH: &str = "kb/playbook.jsonl";
pub const DEFAULT_MODEL_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL_NAME: &str = "llama3";
pub const DEFAULT_SUMMARY_MAX_CHARS: usize = 400;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a boolean (true/false/1/0), got {value:?}")]
    InvalidBool { key: &'static str, value: String },
    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model_name: String,
    pub summarize_timeout_ms: u64,
    pub severity_timeout_ms: u64,
    pub reply_timeout_ms: u64,
}

impl ModelConfig {
    pub fn summarize_timeout(&self) -> Duration {
        Duration::from_millis(self.summarize_timeout_ms)
    }

    pub fn severity_timeout(&self) -> Duration {
        Duration::from_millis(self.severity_timeout_ms)
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_MODEL_BASE_URL.to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            summarize_timeout_ms: 1_000,
            severity_timeout_ms: 1_000,
            reply_timeout_ms: 20_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageConfig {
    pub kb_path: PathBuf,
    /// Labeled exemplars for the statistical scorer; the built-in seed set is used when unset.
    pub exemplars_path: Option<PathBuf>,
    pub use_alternate_scorer: bool,
    pub summary_max_chars: usize,
    pub model: ModelConfig,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            kb_path: PathBuf::from(DEFAULT_KB_PATH),
            exemplars_path: None,
            use_alternate_scorer: false,
            summary_max_chars: DEFAULT_SUMMARY_MAX_CHARS,
            model: ModelConfig::default(),
        }
    }
}

impl TriageConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let text = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let model = ModelConfig {
            enabled: parse_bool(
                "TRIAGE_MODEL_ENABLED",
                text("TRIAGE_MODEL_ENABLED"),
                defaults.model.enabled,
            )?,
            base_url: text("TRIAGE_MODEL_BASE_URL").unwrap_or(defaults.model.base_url),
            model_name: text("TRIAGE_MODEL_NAME").unwrap_or(defaults.model.model_name),
            summarize_timeout_ms: parse_number(
                "TRIAGE_SUMMARY_TIMEOUT_MS",
                text("TRIAGE_SUMMARY_TIMEOUT_MS"),
                defaults.model.summarize_timeout_ms,
            )?,
            severity_timeout_ms: parse_number(
                "TRIAGE_SEVERITY_TIMEOUT_MS",
                text("TRIAGE_SEVERITY_TIMEOUT_MS"),
                defaults.model.severity_timeout_ms,
            )?,
            reply_timeout_ms: parse_number(
                "TRIAGE_REPLY_TIMEOUT_MS",
                text("TRIAGE_REPLY_TIMEOUT_MS"),
                defaults.model.reply_timeout_ms,
            )?,
        };

        Ok(Self {
            kb_path: text("TRIAGE_KB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.kb_path),
            exemplars_path: text("TRIAGE_EXEMPLARS").map(PathBuf::from),
            use_alternate_scorer: parse_bool(
                "TRIAGE_USE_ALTERNATE_SCORER",
                text("TRIAGE_USE_ALTERNATE_SCORER"),
                defaults.use_alternate_scorer,
            )?,
            summary_max_chars: parse_number(
                "TRIAGE_SUMMARY_MAX_CHARS",
                text("TRIAGE_SUMMARY_MAX_CHARS"),
                defaults.summary_max_chars as u64,
            )? as usize,
            model,
        })
    }
}

fn parse_bool(key: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => match value.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool { key, value }),
        },
    }
}

fn parse_number(key: &'static str, value: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
    }
}
