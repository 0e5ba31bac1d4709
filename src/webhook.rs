use crate::{
    extract::extract_query,
    metrics::relay::{WebhookOutcome, record_webhook},
    relay::Relay,
};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(thiserror::Error, Debug)]
pub enum PayloadError {
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("payload has no string `body` field")]
    MissingBody,
}

/// Inbound alert notification. Only the `body` string is consumed.
#[derive(Debug, Clone)]
pub struct AlertPayload(Map<String, Value>);

impl AlertPayload {
    pub fn parse(bytes: &[u8]) -> Result<Self, PayloadError> {
        match serde_json::from_slice(bytes)? {
            Value::Object(fields) => Ok(Self(fields)),
            _ => Err(PayloadError::NotAnObject),
        }
    }

    /// Free-form alert text
    pub fn body(&self) -> Result<&str, PayloadError> {
        self.0
            .get("body")
            .and_then(Value::as_str)
            .ok_or(PayloadError::MissingBody)
    }
}

/// Acknowledgment returned to the alert sender. Always delivered with `200 OK`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Ack {
    Relayed,
    Ignored { reason: String },
}

impl Ack {
    fn ignored(reason: impl ToString) -> Self {
        Ack::Ignored {
            reason: reason.to_string(),
        }
    }
}

/// Relay the query embedded in an alert payload.
///
/// Nothing here fails: a payload without a usable query is acknowledged as
/// ignored, and backend failures are only logged by the relay.
#[tracing::instrument(skip_all, fields(bytes = body.len()))]
pub async fn handle(relay: &Relay, body: &[u8]) -> Ack {
    let (outcome, ack) = process(relay, body).await;
    record_webhook(outcome);

    ack
}

async fn process(relay: &Relay, body: &[u8]) -> (WebhookOutcome, Ack) {
    let payload = match AlertPayload::parse(body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("Malformed webhook payload: {}", e);
            return (WebhookOutcome::MalformedPayload, Ack::ignored(e));
        }
    };

    let text = match payload.body() {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Malformed webhook payload: {}", e);
            return (WebhookOutcome::MalformedPayload, Ack::ignored(e));
        }
    };

    let query = match extract_query(text) {
        Ok(query) => query,
        Err(e) => {
            tracing::info!("Ignoring webhook: {}", e);
            return (WebhookOutcome::NoMatch, Ack::ignored(e));
        }
    };

    tracing::info!("Relaying query '{}'", query);
    let outcome = match relay.relay(query).await {
        true => WebhookOutcome::Relayed,
        false => WebhookOutcome::RelayFailed,
    };

    // The sender is told the alert was taken either way.
    (outcome, Ack::Relayed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

    fn relay(url: &str) -> Relay {
        let config = Config::from_yaml(&format!(
            r#"
datadog:
  url: {url}
  apiKey: api
  appKey: app
http:
  host: 127.0.0.1
  port: 0
"#
        ))
        .unwrap();

        Relay::new(&config).unwrap()
    }

    #[tokio::test]
    async fn outcome_follows_the_backend() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let body = br#"{"body": "query: [host:centos72](https://x)"}"#;

        let (outcome, ack) = process(&relay(&server.uri()), body).await;
        assert!(matches!(outcome, WebhookOutcome::Relayed));
        assert_eq!(ack, Ack::Relayed);

        let (outcome, ack) = process(&relay("http://127.0.0.1:1"), body).await;
        assert!(matches!(outcome, WebhookOutcome::RelayFailed));
        assert_eq!(ack, Ack::Relayed);
    }

    #[tokio::test]
    async fn outcome_for_unusable_payloads() {
        let relay = relay("http://127.0.0.1:1");

        let (outcome, _) = process(&relay, b"{broken").await;
        assert!(matches!(outcome, WebhookOutcome::MalformedPayload));

        let (outcome, _) = process(&relay, br#"{"body": "no brackets here"}"#).await;
        assert!(matches!(outcome, WebhookOutcome::NoMatch));
    }

    #[test]
    fn body_field_is_read() {
        let payload = AlertPayload::parse(br#"{"body": "[q]", "title": "t"}"#).unwrap();

        assert_eq!(payload.body().unwrap(), "[q]");
    }

    #[test]
    fn invalid_json() {
        let err = AlertPayload::parse(b"{not json").unwrap_err();

        assert!(matches!(err, PayloadError::InvalidJson(_)));
    }

    #[test]
    fn non_object_payload() {
        let err = AlertPayload::parse(b"[1, 2]").unwrap_err();

        assert!(matches!(err, PayloadError::NotAnObject));
    }

    #[test]
    fn body_missing_or_not_a_string() {
        let missing = AlertPayload::parse(br#"{"title": "t"}"#).unwrap();
        let number = AlertPayload::parse(br#"{"body": 42}"#).unwrap();

        assert!(matches!(missing.body(), Err(PayloadError::MissingBody)));
        assert!(matches!(number.body(), Err(PayloadError::MissingBody)));
    }

    #[test]
    fn ack_shapes() {
        assert_eq!(
            serde_json::to_value(Ack::Relayed).unwrap(),
            json!({"status": "relayed"})
        );
        assert_eq!(
            serde_json::to_value(Ack::ignored("no bracketed query found in alert text")).unwrap(),
            json!({"status": "ignored", "reason": "no bracketed query found in alert text"})
        );
    }
}
