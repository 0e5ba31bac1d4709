use metrics::{describe_gauge, gauge};

/// Register the metrics for the application
pub(super) fn register_metrics() {
    describe_gauge!(
        "process_start_time_seconds",
        "Start time of the process in seconds since the Unix epoch"
    );

    describe_gauge!(
        "build_info",
        "Build information of the relay, labeled by version"
    );

    gauge!("process_start_time_seconds").set(chrono::Utc::now().timestamp() as f64);
    gauge!("build_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}
