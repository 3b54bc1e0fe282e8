use crate::config::Config;
use crate::errors::AppError;
use crate::gateway::{Gateway, GatewayRequest, GatewayResponse};
use crate::models::{ActionQuery, ErrorBody};
use axum::{
    body::Body,
    extract::{RawQuery, State},
    http::{Method, StatusCode},
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Request bodies above 1MB are answered with a JSON 413.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Stateless proxy to the ledger provider.
    pub gateway: Gateway,
}

impl AppState {
    pub fn new(config: Config, gateway: Gateway) -> Self {
        Self { config, gateway }
    }
}

/// Health check endpoint.
///
/// Liveness only; unlike `?action=health` it does not require the API key.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "service"
)]
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-wallet-gateway",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// /api?action=...
///
/// Action-multiplexed gateway endpoint, mounted for every method. `OPTIONS`
/// answers `{ok: true}`; mutating actions (`topup`, `transfer`,
/// `create_card`) require `POST` with a JSON body.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `method` - HTTP method of the call.
/// * `query` - Raw query string; repeated keys keep their first value.
/// * `body` - Raw body, read up to [`MAX_BODY_BYTES`] and parsed leniently as JSON.
#[utoipa::path(
    post,
    path = "/api",
    params(ActionQuery),
    responses(
        (status = 200, description = "Normalized success envelope (shape depends on the action)"),
        (status = 400, description = "Missing or invalid field", body = ErrorBody),
        (status = 404, description = "Unknown action", body = ErrorBody),
        (status = 405, description = "Mutating action called without POST", body = ErrorBody),
        (status = 413, description = "Request body too large", body = ErrorBody),
        (status = 500, description = "Missing API key or transport failure", body = ErrorBody)
    ),
    tag = "gateway"
)]
pub async fn gateway(
    State(state): State<Arc<AppState>>,
    method: Method,
    RawQuery(query): RawQuery,
    body: Body,
) -> GatewayResponse {
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Rejected request body: {}", e);
            return AppError::PayloadTooLarge(MAX_BODY_BYTES).into();
        }
    };

    let query = ActionQuery::from_raw(query.as_deref());
    let request = GatewayRequest::new(method, query, GatewayRequest::parse_body(&bytes));
    state.gateway.handle(request).await
}
