//! HTTP gateway: health, on-demand cycle and upstream passthrough routes.

use crate::dispatcher::{CycleResult, Delivery, Dispatcher};
use crate::notify::render_failure;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use garden_feed::{Endpoint, StockSource};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Shared handles for the route handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub dispatcher: Arc<Dispatcher>,
    pub source: Arc<dyn StockSource>,
}

/// Build the router. Every response allows any origin.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(gateway_health))
        .route("/api/send", get(send_now))
        .route("/api/stock", get(stock_passthrough))
        .route("/api/egg", get(egg_passthrough))
        .route("/api/weather", get(weather_passthrough))
        .layer(axum::middleware::map_response(allow_any_origin))
        .with_state(state)
}

/// Bind `host:port` and serve until `cancel` fires.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn run_gateway(
    host: &str,
    port: u16,
    state: GatewayState,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    serve(listener, state, cancel).await
}

/// Serve on an already bound listener until `cancel` fires.
///
/// # Errors
///
/// Returns an error if the server fails.
pub async fn serve(
    listener: TcpListener,
    state: GatewayState,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let local_addr = listener.local_addr()?;
    tracing::info!("stock gateway listening on http://{local_addr}");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    tracing::info!("stock gateway stopped");
    Ok(())
}

async fn allow_any_origin(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

async fn gateway_health() -> impl IntoResponse {
    Json(json!({
        "status": "ok"
    }))
}

/// Run one cycle and return what was observed, changed or not.
async fn send_now(State(state): State<GatewayState>) -> impl IntoResponse {
    let result = state.dispatcher.run_cycle().await;
    tracing::info!(outcome = result.outcome(), "on-demand cycle via http");

    let CycleResult::Failed(reason) = &result else {
        let delivery = match result.delivery() {
            Some(Delivery::Sent) => json!("sent"),
            Some(Delivery::Skipped) => json!("skipped"),
            Some(Delivery::Failed(reason)) => json!({"failed": reason}),
            None => json!(null),
        };
        return (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "outcome": result.outcome(),
                "delivery": delivery,
                "changes": result.deltas(),
                "content": result.render(),
            })),
        );
    };

    (
        StatusCode::BAD_GATEWAY,
        Json(json!({
            "success": false,
            "outcome": result.outcome(),
            "error": reason,
            "content": render_failure(),
        })),
    )
}

async fn passthrough(state: &GatewayState, endpoint: Endpoint, label: &str) -> Response {
    match state.source.fetch_endpoint(endpoint).await {
        Ok(document) => Json(document).into_response(),
        Err(e) => {
            tracing::warn!(%endpoint, error = %e, "passthrough fetch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("Failed to fetch {label} data.")})),
            )
                .into_response()
        }
    }
}

async fn stock_passthrough(State(state): State<GatewayState>) -> Response {
    passthrough(&state, Endpoint::GearSeeds, "stock").await
}

async fn egg_passthrough(State(state): State<GatewayState>) -> Response {
    passthrough(&state, Endpoint::Eggs, "egg").await
}

async fn weather_passthrough(State(state): State<GatewayState>) -> Response {
    passthrough(&state, Endpoint::Weather, "weather").await
}
