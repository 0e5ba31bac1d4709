use crate::{
    config::{Datadog as DatadogConfig, SortOrder},
    metrics::external::{self, Target},
};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::StatusCode;
use std::time::Duration;

pub mod logs;

#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("log search request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("log search returned HTTP {status}")]
    Status { status: StatusCode, body: String },
    #[error("failed to decode log search response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },
}

impl BackendError {
    /// Raw response body, when the backend answered at all
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            BackendError::Transport(_) => None,
            BackendError::Status { body, .. } | BackendError::Decode { body, .. } => Some(body),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            BackendError::Transport(e) if e.is_timeout() => "timeout",
            BackendError::Transport(_) => "transport",
            BackendError::Status { .. } => "status",
            BackendError::Decode { .. } => "decode",
        }
    }
}

/// Parameters of a single log search
#[derive(Debug, Clone)]
pub struct LogSearchRequest<'a> {
    pub query: &'a str,
    pub index: &'a str,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub sort: SortOrder,
    pub page_limit: u32,
}

pub struct Datadog {
    config: DatadogConfig,
    client: reqwest::Client,
}

impl Datadog {
    /// Create a new Datadog instance
    pub fn new(config: DatadogConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { config, client })
    }

    /// Search log events matching the request
    #[tracing::instrument(skip(self, request), fields(query = request.query))]
    pub async fn search(&self, request: &LogSearchRequest<'_>) -> Result<logs::Response, BackendError> {
        tracing::debug!("Searching logs in Datadog");
        let _timer = external::external_request_timer(Target::Datadog);

        let result = self.send(request).await;

        if let Err(e) = &result {
            external::record_external_request_failure(Target::Datadog, e.kind());
        }

        result
    }

    async fn send(&self, request: &LogSearchRequest<'_>) -> Result<logs::Response, BackendError> {
        let response = self
            .client
            .get(format!("{}/api/v2/logs/events", self.config.url))
            .header("DD-API-KEY", &self.config.api_key)
            .header("DD-APPLICATION-KEY", &self.config.app_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("filter[query]", request.query.to_string()),
                ("filter[indexes]", request.index.to_string()),
                ("filter[from]", timestamp(&request.from)),
                ("filter[to]", timestamp(&request.to)),
                ("sort", request.sort.as_str().to_string()),
                ("page[limit]", request.page_limit.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(BackendError::Status { status, body });
        }

        serde_json::from_str(&body).map_err(|source| BackendError::Decode { source, body })
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
