use metrics::{counter, describe_counter, describe_histogram, histogram};

/// Register the metrics for the application
pub(super) fn register_metrics() {
    // Count of received webhooks. Labeled with what the relay did with them.
    describe_counter!("webhooks_total", "Total number of alert webhooks received");

    // Number of log events matched by each successful query.
    describe_histogram!("log_matches", "Number of log events matched per relayed query");
}

/// Record a received webhook with the given outcome
pub fn record_webhook(outcome: WebhookOutcome) {
    counter!("webhooks_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record the number of matches of a successful query
pub fn record_matches(count: usize) {
    histogram!("log_matches").record(count as f64);
}

#[derive(Debug, Clone, Copy)]
pub enum WebhookOutcome {
    Relayed,
    RelayFailed,
    MalformedPayload,
    NoMatch,
}

impl std::fmt::Display for WebhookOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebhookOutcome::Relayed => write!(f, "relayed"),
            WebhookOutcome::RelayFailed => write!(f, "relay_failed"),
            WebhookOutcome::MalformedPayload => write!(f, "malformed_payload"),
            WebhookOutcome::NoMatch => write!(f, "no_match"),
        }
    }
}
