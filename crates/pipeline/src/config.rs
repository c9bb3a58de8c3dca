use extract::{AnalyzerConfig, LlmConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const ENV_URL: &str = "LITE_LLM_URL";
pub const ENV_KEY: &str = "LITE_LLM_KEY";
pub const ENV_MODEL: &str = "LITE_LLM_MODEL";
pub const ENV_ACCEPT_INVALID_CERTS: &str = "LITE_LLM_ACCEPT_INVALID_CERTS";
pub const ENV_TIMEOUT_SECS: &str = "LITE_LLM_TIMEOUT_SECS";
pub const ENV_ROOT: &str = "PIPELINE_ROOT";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub llm: LlmConfig,
    pub retry: RetryPolicy,
    pub extraction: AnalyzerConfig,
    pub summary: AnalyzerConfig,
    pub paths: PathsConfig,
}

/// File names are resolved against `root`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub root: PathBuf,
    pub targets_file: String,
    pub details_dir: String,
    pub details_extension: String,
    pub report_file: String,
    pub summary_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            targets_file: "Targets.txt".to_string(),
            details_dir: "CompanyDetails".to_string(),
            details_extension: "txt".to_string(),
            report_file: "Output.txt".to_string(),
            summary_file: "OutputSummary.txt".to_string(),
        }
    }
}

impl PathsConfig {
    pub fn targets_path(&self) -> PathBuf {
        self.root.join(&self.targets_file)
    }

    pub fn details_path(&self) -> PathBuf {
        self.root.join(&self.details_dir)
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join(&self.report_file)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.root.join(&self.summary_file)
    }
}

impl PipelineConfig {
    /// Load from the process environment, honoring a `.env` file if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup; unset optional variables keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let mut config = Self::default();
        config.llm.url = required(ENV_URL)?;
        config.llm.api_key = required(ENV_KEY)?;
        config.llm.model = required(ENV_MODEL)?;

        if let Some(value) = lookup(ENV_ACCEPT_INVALID_CERTS) {
            config.llm.accept_invalid_certs = parse_flag(ENV_ACCEPT_INVALID_CERTS, &value)?;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            config.llm.request_timeout_secs = value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: ENV_TIMEOUT_SECS,
                value: value.clone(),
            })?;
        }
        if let Some(root) = lookup(ENV_ROOT) {
            config.paths.root = PathBuf::from(root);
        }

        Ok(config)
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        }),
    }
}
