//! Sink configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use fiteval_core::engine::ForwarderConfig;
use fiteval_core::traits::ResultSink;

use crate::http::{HttpSink, DEFAULT_TIMEOUT_SECS};
use crate::mock::MockSink;

/// Configuration for a single result sink.
///
/// Note: Custom Debug impl masks API tokens to prevent accidental exposure in logs.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    Http {
        base_url: String,
        #[serde(default)]
        api_token: Option<String>,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
    Memory,
}

impl std::fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkConfig::Http {
                base_url,
                api_token,
                timeout_secs,
            } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("api_token", &api_token.as_ref().map(|_| "***"))
                .field("timeout_secs", timeout_secs)
                .finish(),
            SinkConfig::Memory => f.write_str("Memory"),
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Top-level fiteval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitevalConfig {
    /// Sink configurations keyed by name.
    #[serde(default)]
    pub sinks: HashMap<String, SinkConfig>,
    /// Sink used when `--sink` is not given. No forwarding if unset.
    #[serde(default)]
    pub default_sink: Option<String>,
    /// Max retries on transient sink errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Max concurrent result submissions.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Rubric override files or directories.
    #[serde(default)]
    pub rubric_files: Vec<PathBuf>,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./fiteval-results")
}

impl Default for FitevalConfig {
    fn default() -> Self {
        Self {
            sinks: HashMap::new(),
            default_sink: None,
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            parallelism: default_parallelism(),
            rubric_files: Vec::new(),
            output_dir: default_output_dir(),
        }
    }
}

impl FitevalConfig {
    /// Retry and concurrency settings for the forwarder.
    pub fn forwarder_config(&self) -> ForwarderConfig {
        ForwarderConfig {
            parallelism: self.parallelism,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_sink_config(config: &SinkConfig) -> SinkConfig {
    match config {
        SinkConfig::Http {
            base_url,
            api_token,
            timeout_secs,
        } => SinkConfig::Http {
            base_url: resolve_env_vars(base_url),
            api_token: api_token.as_ref().map(|t| resolve_env_vars(t)),
            timeout_secs: *timeout_secs,
        },
        SinkConfig::Memory => SinkConfig::Memory,
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `fiteval.toml` in the current directory
/// 2. `~/.config/fiteval/config.toml`
///
/// Environment variable overrides: `FITEVAL_API_URL`, `FITEVAL_API_TOKEN`.
pub fn load_config() -> Result<FitevalConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<FitevalConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("fiteval.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<FitevalConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => FitevalConfig::default(),
    };

    apply_env_overrides(
        &mut config,
        std::env::var("FITEVAL_API_URL").ok(),
        std::env::var("FITEVAL_API_TOKEN").ok(),
    );

    config.sinks = config
        .sinks
        .iter()
        .map(|(k, v)| (k.clone(), resolve_sink_config(v)))
        .collect();

    Ok(config)
}

/// `FITEVAL_API_URL` creates or repoints the `http` sink; `FITEVAL_API_TOKEN`
/// sets its token.
fn apply_env_overrides(config: &mut FitevalConfig, url: Option<String>, token: Option<String>) {
    if let Some(url) = url {
        match config.sinks.get_mut("http") {
            Some(SinkConfig::Http { base_url, .. }) => *base_url = url,
            _ => {
                config.sinks.insert(
                    "http".into(),
                    SinkConfig::Http {
                        base_url: url,
                        api_token: None,
                        timeout_secs: DEFAULT_TIMEOUT_SECS,
                    },
                );
            }
        }
        if config.default_sink.is_none() {
            config.default_sink = Some("http".into());
        }
    }

    if let Some(token) = token {
        if let Some(SinkConfig::Http { api_token, .. }) = config.sinks.get_mut("http") {
            *api_token = Some(token);
        }
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("fiteval"))
}

/// Create a sink instance from its configuration.
pub fn create_sink(config: &SinkConfig) -> Result<Arc<dyn ResultSink>> {
    match config {
        SinkConfig::Http {
            base_url,
            api_token,
            timeout_secs,
        } => {
            if base_url.is_empty() {
                anyhow::bail!("http sink has no base_url");
            }
            Ok(Arc::new(HttpSink::new(
                base_url,
                api_token.clone(),
                *timeout_secs,
            )?))
        }
        SinkConfig::Memory => Ok(Arc::new(MockSink::new())),
    }
}

/// Look up a sink by name and build it.
pub fn create_named_sink(config: &FitevalConfig, name: &str) -> Result<Arc<dyn ResultSink>> {
    let sink_config = config.sinks.get(name).with_context(|| {
        let mut known: Vec<&str> = config.sinks.keys().map(String::as_str).collect();
        known.sort_unstable();
        format!(
            "unknown sink '{name}' (configured: {})",
            if known.is_empty() {
                "none".to_string()
            } else {
                known.join(", ")
            }
        )
    })?;
    create_sink(sink_config)
}
