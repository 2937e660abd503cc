//! apptoken - short-lived application tokens and a token-gated authorization layer
//!
//! An application trades its long-lived API key for a signed, expiring token,
//! then presents that token on each protected call. The gate verifies it,
//! resolves the application, and asks a policy whether that application may
//! act on the requested object.

pub mod auth;
pub mod config;
pub mod directory;
pub mod gate;
pub mod server;

pub use auth::{AuthorizationPolicy, Claims, TargetId, TokenCodec, TokenSecret, Verification};
pub use config::{GateConfig, ParamNames};
pub use directory::{Application, ApplicationDirectory, MemoryDirectory};
pub use gate::{AuthorizationGate, Authorized, GateError, RequestContext};
