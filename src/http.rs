use crate::{
    config::Config,
    metrics::http::{http_request_timer, record_http_request},
    relay::{Relay, RelayError, Summary},
    webhook::{self, Ack},
};
use anyhow::Context;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_server::Handle;
use hyper::StatusCode;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};

pub struct AppState {
    pub relay: Relay,
}

/// Creates an Axum Web Server and serves until `handle` is shut down
pub async fn create_server(config: Config, relay: Relay, handle: Handle) -> anyhow::Result<()> {
    tracing::info!("Starting the web server");

    let app = create_router(Arc::new(AppState { relay }));

    let addr: SocketAddr = format!("{}:{}", config.http.host, config.http.port)
        .parse()
        .context("unable to parse listen address")?;

    tracing::info!("Listening on {}", addr);

    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("web server failed")?;

    tracing::info!("Web server stopped");

    Ok(())
}

/// Create the router for the application
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/alive", get(alive))
        .route("/metrics", get(metrics))
        .route("/webhook", post(webhook))
        .route("/query", post(query))
        .with_state(state)
}

/// This is the handler for the /alive path
async fn alive() -> StatusCode {
    record_http_request("/alive");
    let _timer = http_request_timer("/alive");

    StatusCode::OK
}

/// This is the handler for the /metrics path
#[tracing::instrument]
async fn metrics() -> impl IntoResponse {
    record_http_request("/metrics");
    let _timer = http_request_timer("/metrics");

    match crate::metrics::render() {
        Some(body) => (StatusCode::OK, body),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to get the metrics handle".to_string(),
        ),
    }
}

/// This is the handler for the /webhook path. The sender always gets a 200.
async fn webhook(State(state): State<Arc<AppState>>, body: Bytes) -> (StatusCode, Json<Ack>) {
    record_http_request("/webhook");
    let _timer = http_request_timer("/webhook");

    let ack = webhook::handle(&state.relay, &body).await;

    (StatusCode::OK, Json(ack))
}

#[derive(Deserialize, Debug)]
struct QueryRequest {
    query: String,
}

#[derive(Serialize)]
struct ApiErrorResponse {
    error: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match self {
            RelayError::EmptyQuery => StatusCode::BAD_REQUEST,
            RelayError::Backend(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(ApiErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// This is the handler for the /query path, which runs a search on demand
#[tracing::instrument(skip(state))]
async fn query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<Summary>, RelayError> {
    record_http_request("/query");
    let _timer = http_request_timer("/query");

    Ok(Json(state.relay.query(&request.query).await?))
}
