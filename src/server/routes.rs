//! HTTP routes: token issuance and a gated sample resource

use crate::auth::AuthorizationPolicy;
use crate::config::ParamNames;
use crate::gate::{AuthorizationGate, GateError, RequestContext};

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

const API_KEY_PARAM: &str = "api_key";
const API_KEY_HELP: &str =
    "Missing required parameter in the query string. You must provide your api secret key";

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct ServerState {
    pub gate: Arc<AuthorizationGate>,
    pub policy: Arc<dyn AuthorizationPolicy>,
}

/// Response body of a successful token request
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub apptoken: String,
}

/// Errors rendered as `{"message": ...}`
#[derive(Debug)]
pub enum ApiError {
    Gate(GateError),
    MissingParameter { name: &'static str, help: &'static str },
}

impl From<GateError> for ApiError {
    fn from(e: GateError) -> Self {
        ApiError::Gate(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Gate(e) => {
                let status = StatusCode::from_u16(e.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                if status.is_server_error() {
                    error!(error = %e, "Request failed");
                }
                (status, Json(json!({ "message": e.client_message() }))).into_response()
            }
            ApiError::MissingParameter { name, help } => {
                let mut detail = serde_json::Map::new();
                detail.insert(name.to_string(), help.into());
                (StatusCode::BAD_REQUEST, Json(json!({ "message": detail }))).into_response()
            }
        }
    }
}

/// Create the HTTP router
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/token", get(token_handler))
        .route("/devices", get(device_handler).post(device_handler))
        .with_state(state)
}

/// Build the gate's request context from query parameters and a raw body
///
/// A body that is not JSON is ignored.
pub fn request_context(
    params: &ParamNames,
    query: &[(String, String)],
    body: &[u8],
) -> RequestContext {
    let body: Option<serde_json::Value> = if body.is_empty() {
        None
    } else {
        serde_json::from_slice(body).ok()
    };
    RequestContext::from_params(params, query, body.as_ref())
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn token_handler(
    State(state): State<ServerState>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<TokenResponse>, ApiError> {
    // Present but empty still goes to the lookup
    let api_key = query
        .iter()
        .find(|(key, _)| key == API_KEY_PARAM)
        .map(|(_, value)| value.as_str())
        .ok_or(ApiError::MissingParameter {
            name: API_KEY_PARAM,
            help: API_KEY_HELP,
        })?;

    let apptoken = state.gate.request_token(api_key)?;
    Ok(Json(TokenResponse { apptoken }))
}

async fn device_handler(
    State(state): State<ServerState>,
    Query(query): Query<Vec<(String, String)>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let ctx = request_context(state.gate.params(), &query, &body);

    let response = state.gate.authorize(&ctx, state.policy.as_ref(), |auth| {
        Json(json!({
            "application_id": auth.application.id(),
            "device_id": auth.target.as_ref().map(|t| t.as_str()),
        }))
        .into_response()
    })?;

    Ok(response)
}

/// Run the HTTP server until `shutdown` resolves
pub async fn run_http_server(
    bind_addr: SocketAddr,
    state: ServerState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
