//! HTTP surface for the gate
//!
//! Issues tokens over `GET /token` and exposes a sample protected resource.

mod routes;

pub use routes::{
    create_router, request_context, run_http_server, ApiError, ServerState, TokenResponse,
};
