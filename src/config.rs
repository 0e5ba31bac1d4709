use anyhow::{Context, Result};
use serde::Deserialize;
use std::{path::Path, time::Duration};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub datadog: Datadog,
    #[serde(default)]
    pub relay: Relay,
    pub http: Http,
    #[serde(default)]
    pub logging: Logging,
}

#[derive(Debug, Clone)]
pub struct Datadog {
    pub url: String,
    pub api_key: String,
    pub app_key: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Relay {
    /// Index to search. Unset means every index.
    pub index: Option<String>,
    #[serde(default = "default_lookback_seconds")]
    pub lookback_seconds: u64,
    #[serde(default)]
    pub sort: SortOrder,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "timestamp")]
    Timestamp,
    #[serde(rename = "-timestamp")]
    TimestampDescending,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Http {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Logging {
    #[serde(default)]
    pub format: LogFormat,
    pub file: Option<std::path::PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

fn default_lookback_seconds() -> u64 {
    15 * 60
}

fn default_page_limit() -> u32 {
    25
}

fn default_timeout_seconds() -> u64 {
    10
}

impl Default for Relay {
    fn default() -> Self {
        Self {
            index: None,
            lookback_seconds: default_lookback_seconds(),
            sort: SortOrder::default(),
            page_limit: default_page_limit(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        Self::from_yaml(&config)
    }

    /// Parse and validate configuration from a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_norway::from_str(yaml).context("failed to parse config")?;
        config.relay.validate()?;

        Ok(config)
    }
}

impl Relay {
    fn validate(&self) -> Result<()> {
        if !(1..=1000).contains(&self.page_limit) {
            anyhow::bail!("relay.pageLimit must be between 1 and 1000, got {}", self.page_limit);
        }

        if self.lookback_seconds == 0 {
            anyhow::bail!("relay.lookbackSeconds must be greater than zero");
        }

        if self.timeout_seconds == 0 {
            anyhow::bail!("relay.timeoutSeconds must be greater than zero");
        }

        Ok(())
    }

    pub fn lookback(&self) -> Duration {
        Duration::from_secs(self.lookback_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Index scope sent to the backend, `*` when no index is configured
    pub fn index_scope(&self) -> &str {
        self.index.as_deref().unwrap_or("*")
    }
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Timestamp => "timestamp",
            SortOrder::TimestampDescending => "-timestamp",
        }
    }
}

/// Resolve a secret either inline or from the named environment variable
fn resolve_secret(name: &str, inline: Option<String>, from: Option<String>) -> Result<String> {
    match (inline, from) {
        (Some(value), _) => Ok(value),
        (None, Some(var)) => std::env::var(&var)
            .with_context(|| format!("datadog.{name}From names unset variable {var}")),
        (None, None) => anyhow::bail!("datadog.{name} or datadog.{name}From must be set"),
    }
}

impl Datadog {
    /// Create a new Datadog instance, resolving keys from environment variables if needed
    pub fn new(
        url: String,
        api_key: Option<String>,
        api_key_from: Option<String>,
        app_key: Option<String>,
        app_key_from: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            api_key: resolve_secret("apiKey", api_key, api_key_from)?,
            app_key: resolve_secret("appKey", app_key, app_key_from)?,
        })
    }
}

impl<'de> Deserialize<'de> for Datadog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct DatadogRaw {
            url: String,
            api_key: Option<String>,
            api_key_from: Option<String>,
            app_key: Option<String>,
            app_key_from: Option<String>,
        }

        let raw = DatadogRaw::deserialize(deserializer)?;
        Datadog::new(
            raw.url,
            raw.api_key,
            raw.api_key_from,
            raw.app_key,
            raw.app_key_from,
        )
        .map_err(serde::de::Error::custom)
    }
}
