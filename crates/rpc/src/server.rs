//! HTTP server: request decoding, dispatch, and the pass-through proxy.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use bytes::Bytes;
use feegate_client::EthClient;
use feegate_store::TxStore;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::eth;
use crate::types::{JsonRpcRequest, JsonRpcResponse, INVALID_REQUEST, PARSE_ERROR};

/// Shared state for the request handler.
pub struct AppState {
    /// Transaction store driving ingest and cancel
    pub store: Arc<TxStore>,
    /// Upstream client used by the pass-through proxy
    pub client: Arc<EthClient>,
}

/// Builds the single-endpoint JSON-RPC router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(handle_request))
        .with_state(state)
}

/// Binds the listen address and serves until the cancellation token fires.
pub async fn serve(
    addr: &str,
    state: Arc<AppState>,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr, "JSON-RPC server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
}

async fn handle_request(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    // The raw body is kept around untouched so unhandled methods can be
    // proxied byte-for-byte.
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(err) => {
            error!(error = %err, "failed to parse request body");
            return Json(JsonRpcResponse::error(Value::Null, PARSE_ERROR, "parse error"))
                .into_response();
        }
    };

    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(err) => {
            error!(error = %err, "request body is not a JSON-RPC request");
            return Json(JsonRpcResponse::error(
                Value::Null,
                INVALID_REQUEST,
                "invalid json request",
            ))
            .into_response();
        }
    };

    match request.method.as_str() {
        "eth_sendRawTransaction" => {
            Json(eth::send_raw_transaction(&state.store, request)).into_response()
        }
        "cancel_transaction" => {
            Json(eth::cancel_transaction(&state.store, request)).into_response()
        }
        _ => proxy_to_upstream(&state, &request.method, body).await,
    }
}

/// Forwards an unhandled method to the upstream node and relays its status,
/// headers, and body back unchanged.
async fn proxy_to_upstream(state: &AppState, method: &str, body: Bytes) -> Response {
    debug!(method, "proxying request to upstream");

    let upstream = match state.client.forward(body).await {
        Ok(response) => response,
        Err(err) => {
            error!(method, error = %err, "failed to reach upstream node");
            return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response();
        }
    };

    let status = upstream.status().as_u16();
    let headers = upstream.headers().clone();
    let body = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(method, error = %err, "failed to read upstream response");
            return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response();
        }
    };

    let mut builder = Response::builder().status(status);
    for (name, value) in headers.iter() {
        // Hop-by-hop headers do not survive the re-framed body.
        if name == "transfer-encoding" || name == "connection" {
            continue;
        }
        builder = builder.header(name.as_str(), value.as_bytes());
    }
    builder.body(Body::from(body)).unwrap_or_else(|err| {
        error!(error = %err, "failed to assemble proxied response");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}
