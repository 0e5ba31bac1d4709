use crate::{
    config::Config,
    datadog::{BackendError, Datadog, LogSearchRequest, logs},
    metrics::relay as relay_metrics,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::{fmt, time::Duration};

/// Time range a search covers, `lookback` before `to` up to `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSearchWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl LogSearchWindow {
    pub fn ending_at(to: DateTime<Utc>, lookback: Duration) -> Self {
        let lookback = chrono::Duration::from_std(lookback).unwrap_or(chrono::Duration::MAX);
        let from = to.checked_sub_signed(lookback).unwrap_or(DateTime::<Utc>::MIN_UTC);

        Self { from, to }
    }

    pub fn ending_now(lookback: Duration) -> Self {
        Self::ending_at(Utc::now(), lookback)
    }
}

/// Outcome of a successful search
#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    NoMatches,
    /// Attribute payload of each match, in backend order
    Matches(Vec<Map<String, Value>>),
}

impl Summary {
    pub fn from_response(response: logs::Response) -> Self {
        if response.data.is_empty() {
            return Summary::NoMatches;
        }

        Summary::Matches(
            response
                .data
                .into_iter()
                .map(|log| log.attributes.attributes)
                .collect(),
        )
    }

    pub fn count(&self) -> usize {
        match self {
            Summary::NoMatches => 0,
            Summary::Matches(matches) => matches.len(),
        }
    }

    /// Each match rendered as one compact JSON block
    pub fn blocks(&self) -> Vec<String> {
        match self {
            Summary::NoMatches => Vec::new(),
            Summary::Matches(matches) => matches
                .iter()
                .map(|attributes| Value::Object(attributes.clone()).to_string())
                .collect(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::NoMatches => write!(f, "zero matches"),
            Summary::Matches(matches) => {
                let noun = if matches.len() == 1 { "match" } else { "matches" };
                write!(f, "{} {}", matches.len(), noun)?;

                for block in self.blocks() {
                    write!(f, "\n{}", block)?;
                }

                Ok(())
            }
        }
    }
}

impl Serialize for Summary {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        struct SummaryBody<'a> {
            count: usize,
            matches: &'a [Map<String, Value>],
        }

        let matches = match self {
            Summary::NoMatches => &[][..],
            Summary::Matches(matches) => matches.as_slice(),
        };

        SummaryBody {
            count: self.count(),
            matches,
        }
        .serialize(serializer)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RelayError {
    #[error("query must not be empty")]
    EmptyQuery,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl RelayError {
    /// Raw backend response, when the backend answered at all
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            RelayError::EmptyQuery => None,
            RelayError::Backend(e) => e.raw_response(),
        }
    }
}

pub struct Relay {
    config: crate::config::Relay,
    datadog: Datadog,
}

impl Relay {
    /// Create a new Relay instance
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let datadog = Datadog::new(config.datadog.clone(), config.relay.timeout())?;

        Ok(Self {
            config: config.relay.clone(),
            datadog,
        })
    }

    /// Search the lookback window ending now and summarize the matches
    pub async fn query(&self, query: &str) -> Result<Summary, RelayError> {
        self.query_window(query, LogSearchWindow::ending_now(self.config.lookback()))
            .await
    }

    /// Search the given window and summarize the matches
    pub async fn query_window(
        &self,
        query: &str,
        window: LogSearchWindow,
    ) -> Result<Summary, RelayError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RelayError::EmptyQuery);
        }

        let request = LogSearchRequest {
            query,
            index: self.config.index_scope(),
            from: window.from,
            to: window.to,
            sort: self.config.sort,
            page_limit: self.config.page_limit,
        };

        let response = self.datadog.search(&request).await?;
        let summary = Summary::from_response(response);
        relay_metrics::record_matches(summary.count());

        Ok(summary)
    }

    /// Run the query and log the outcome. Failures end here; the return
    /// value only says whether the search completed.
    #[tracing::instrument(skip(self))]
    pub async fn relay(&self, query: &str) -> bool {
        match self.query(query).await {
            Ok(Summary::NoMatches) => {
                tracing::info!(
                    lookback_seconds = self.config.lookback_seconds,
                    "zero matches"
                );

                true
            }
            Ok(summary) => {
                tracing::info!(
                    lookback_seconds = self.config.lookback_seconds,
                    count = summary.count(),
                    "{} matching log events",
                    summary.count()
                );

                for block in summary.blocks() {
                    tracing::info!("{}", block);
                }

                true
            }
            Err(e) => {
                tracing::error!(
                    raw_response = e.raw_response().unwrap_or("<none>"),
                    "Log search failed: {}",
                    e
                );

                false
            }
        }
    }
}
