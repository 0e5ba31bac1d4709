use metrics::histogram;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::time::Instant;

pub mod external;
pub mod http;
pub mod process;
pub mod relay;

pub static METRICS_HANDLE: OnceCell<Option<PrometheusHandle>> = OnceCell::new();

/// Register the metrics for the application
pub fn register_metrics() {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .inspect_err(|e| tracing::error!("Failed to install metrics recorder: {}", e))
        .ok();

    if METRICS_HANDLE.set(handle).is_err() {
        tracing::warn!("Metrics were already registered");
        return;
    }

    external::register_metrics();
    http::register_metrics();
    process::register_metrics();
    relay::register_metrics();
}

/// Render the current metrics in the Prometheus text format
pub fn render() -> Option<String> {
    METRICS_HANDLE
        .get()
        .and_then(|handle| handle.as_ref())
        .map(|handle| handle.render())
}

/// Records the time between creation and drop into a histogram
pub struct Timer {
    metric_name: &'static str,
    start_time: Instant,
    labels: Vec<(String, String)>,
}

impl Timer {
    /// Create a new timer
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            metric_name,
            start_time: Instant::now(),
            labels: Vec::new(),
        }
    }

    /// Add a label to the timer
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push((key.into(), value.into()));
        self
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start_time.elapsed().as_secs_f64();

        if self.labels.is_empty() {
            histogram!(self.metric_name).record(duration);
        } else {
            let labels: Vec<_> = self
                .labels
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();

            histogram!(self.metric_name, &labels).record(duration);
        }
    }
}
