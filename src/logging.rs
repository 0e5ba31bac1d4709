use crate::config::{LogFormat, Logging};
use anyhow::Context;
use std::{
    fs::{File, OpenOptions},
    sync::Arc,
};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Keeps the log sink alive. Dropping it flushes the file sink to disk.
#[must_use = "dropping the guard flushes and closes the log sink"]
pub struct LoggingGuard {
    file: Option<Arc<File>>,
}

impl Drop for LoggingGuard {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = file.sync_all();
        }
    }
}

/// Install the global tracing subscriber described by `config`
pub fn init(config: &Logging) -> anyhow::Result<LoggingGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let file = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;

            Some(Arc::new(file))
        }
        None => None,
    };

    let layer = match (&file, config.format) {
        (Some(file), LogFormat::Json) => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(file.clone())
            .boxed(),
        (Some(file), LogFormat::Text) => tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file.clone())
            .boxed(),
        (None, LogFormat::Json) => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
        (None, LogFormat::Text) => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(LoggingGuard { file })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_lines_reach_the_file_sink() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("relay.log");
        let config = Logging {
            format: LogFormat::Json,
            file: Some(path.clone()),
        };

        std::fs::write(&path, "earlier line\n").expect("seed log file");

        let guard = init(&config).expect("install subscriber");
        tracing::info!(query = "host:centos72", "relaying alert");
        drop(guard);

        let contents = std::fs::read_to_string(&path).expect("read log file");
        assert!(contents.starts_with("earlier line\n"));

        let line = contents
            .lines()
            .find(|line| line.contains("relaying alert"))
            .expect("event written");
        let event: serde_json::Value = serde_json::from_str(line).expect("json line");

        assert_eq!(event["level"], "INFO");
        assert_eq!(event["fields"]["query"], "host:centos72");
    }
}
