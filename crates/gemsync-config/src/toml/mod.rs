//! gemsync.toml parsing and validation

use std::fmt;

use gemsync_core::error::SyncError;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::ConfigResult;

/// Complete gemsync configuration. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Source registry
    pub source: SourceSection,

    /// Sink analytics API
    pub sink: SinkSection,

    /// Worker pool
    pub pool: PoolSection,

    /// Per-step retry policy
    pub retry: RetrySection,

    /// HTTP transport
    pub http: HttpSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    pub base_url: String,
}

/// Sink address and credential, usually given on the command line
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSection {
    /// Packages processed at the same time
    pub concurrency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    /// Attempts per remote call, the first one included
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Growth factor applied to the delay after each failed attempt
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub timeout_secs: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            base_url: "https://rubygems.org".to_string(),
        }
    }
}

impl Default for PoolSection {
    fn default() -> Self {
        Self { concurrency: 2 }
    }
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            initial_delay_ms: 500,
            max_delay_ms: 60_000,
            multiplier: 1.5,
        }
    }
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: None,
        }
    }
}

impl fmt::Debug for SinkSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkSection")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl SyncConfig {
    /// Sink base URL and API key, both required before a run can start
    pub fn sink_credentials(&self) -> ConfigResult<(&str, &str)> {
        let base_url = self.sink.base_url.as_deref().ok_or_else(|| missing("sink.base_url"))?;
        let api_key = self.sink.api_key.as_deref().ok_or_else(|| missing("sink.api_key"))?;
        Ok((base_url, api_key))
    }
}

fn missing(field: &str) -> SyncError {
    SyncError::ConfigValidation {
        field: field.to_string(),
        reason: "a value is required (positional argument, config file or GEMSYNC_* variable)"
            .to_string(),
    }
}

/// Parse TOML text to a validated configuration. `origin` names the file in errors.
pub fn parse_config(content: &str, origin: &str) -> ConfigResult<SyncConfig> {
    let config: SyncConfig = toml::from_str(content).map_err(|e| {
        let (line, column) = e
            .span()
            .map(|span| line_column(content, span.start))
            .unwrap_or((0, 0));
        SyncError::TomlParse {
            path: origin.to_string(),
            message: e.message().to_string(),
            line,
            column,
        }
    })?;

    validate_config(&config)?;

    Ok(config)
}

/// Load and parse a config file
pub async fn load_from_file(path: &camino::Utf8Path) -> ConfigResult<SyncConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SyncError::io(format!("Failed to read {}", path), e))?;

    parse_config(&content, path.as_str())
}

/// Validate ranges and URLs. Missing sink values are checked later by
/// [`SyncConfig::sink_credentials`] since they usually arrive from the command line.
pub fn validate_config(config: &SyncConfig) -> ConfigResult<()> {
    validate_url("source.base_url", &config.source.base_url)?;

    if let Some(base_url) = &config.sink.base_url {
        validate_url("sink.base_url", base_url)?;
    }

    if config.sink.api_key.as_deref().is_some_and(|key| key.trim().is_empty()) {
        return Err(invalid("sink.api_key", "must not be empty"));
    }

    if config.pool.concurrency == 0 {
        return Err(invalid("pool.concurrency", "must be at least 1"));
    }

    let retry = &config.retry;
    if retry.max_attempts == 0 {
        return Err(invalid("retry.max_attempts", "must be at least 1"));
    }
    if !retry.multiplier.is_finite() || retry.multiplier < 1.0 {
        return Err(invalid("retry.multiplier", "must be a finite number >= 1.0"));
    }
    if retry.max_delay_ms < retry.initial_delay_ms {
        return Err(invalid(
            "retry.max_delay_ms",
            "must not be smaller than retry.initial_delay_ms",
        ));
    }

    if config.http.timeout_secs == 0 {
        return Err(invalid("http.timeout_secs", "must be at least 1"));
    }

    Ok(())
}

fn validate_url(field: &str, value: &str) -> ConfigResult<()> {
    let url = Url::parse(value).map_err(|e| invalid(field, &format!("'{}': {}", value, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            field,
            &format!("'{}' must use http or https", value),
        ));
    }
    Ok(())
}

fn invalid(field: &str, reason: &str) -> SyncError {
    SyncError::ConfigValidation {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// 1-based line and column of a byte offset
fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let before = &content[..offset.min(content.len())];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rsplit('\n')
        .next()
        .map(|tail| tail.chars().count() + 1)
        .unwrap_or(1);
    (line, column)
}
