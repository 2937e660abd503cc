//! Tokens and authorization policies
//!
//! - `tokens`: HMAC-signed, expiring tokens carrying an application id
//! - `policy`: per-resource decisions on whether an application may act on
//!   a target object

mod policy;
mod tokens;

pub use policy::{AllowAll, AuthorizationPolicy, DenyAll, OwnsTarget, TargetId};
pub use tokens::{
    ApplicationId, Claims, TokenCodec, TokenError, TokenSecret, Verification, DEFAULT_TOKEN_TTL,
};
