//! Token issuance and token-gated invocation
//!
//! Issue: API key → directory lookup → signed token.
//!
//! Gated call: token present? → verified? → application resolved? → policy
//! passed? → delegate. A missing token is reported as such; every later "no"
//! ends the call with one and the same error.

mod context;
mod error;

pub use context::{Authorized, RequestContext};
pub use error::GateError;

use crate::auth::{AuthorizationPolicy, Claims, TokenCodec, Verification};
use crate::config::{GateConfig, ParamNames};
use crate::directory::ApplicationDirectory;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Issues tokens and guards protected operations
pub struct AuthorizationGate {
    codec: TokenCodec,
    directory: Option<Arc<dyn ApplicationDirectory>>,
    params: ParamNames,
}

impl AuthorizationGate {
    pub fn new(config: GateConfig, directory: Arc<dyn ApplicationDirectory>) -> Self {
        Self::with_directory(config, Some(directory))
    }

    /// A gate whose directory may be missing; token requests then fail with
    /// [`GateError::Configuration`]
    pub fn with_directory(
        config: GateConfig,
        directory: Option<Arc<dyn ApplicationDirectory>>,
    ) -> Self {
        Self {
            codec: TokenCodec::new(config.secret).with_ttl(config.token_ttl),
            directory,
            params: config.params,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn params(&self) -> &ParamNames {
        &self.params
    }

    /// Exchange an API key for a token
    pub fn request_token(&self, api_key: &str) -> Result<String, GateError> {
        let directory = self.directory.as_ref().ok_or(GateError::Configuration)?;

        let application = directory
            .find_by_api_key(api_key)?
            .ok_or(GateError::NotFound)?;

        let Some(id) = application.id() else {
            error!("Refusing to issue a token for an application without an id");
            return Err(GateError::IncompleteApplication);
        };

        let token = self.codec.issue(&Claims::new(id))?;
        info!(application_id = %id, "Issued application token");

        Ok(token)
    }

    /// Check a request against the gate without running anything
    pub fn authenticate(
        &self,
        ctx: &RequestContext,
        policy: &dyn AuthorizationPolicy,
    ) -> Result<Authorized, GateError> {
        let Some(token) = ctx.token.as_deref() else {
            debug!("Denied: no token");
            return Err(GateError::MissingToken {
                param: self.params.token.clone(),
            });
        };

        let claims = match self.codec.verify(token) {
            Verification::Valid(claims) => claims,
            Verification::Expired | Verification::BadSignature => return Err(self.denied()),
        };

        let Some(id) = claims.application_id() else {
            debug!("Denied: claims carry no application id");
            return Err(self.denied());
        };

        let Some(directory) = self.directory.as_ref() else {
            warn!("Denied: no application directory configured");
            return Err(self.denied());
        };

        let application = match directory.find_by_id(id) {
            Ok(Some(application)) => application,
            Ok(None) => {
                debug!(application_id = %id, "Denied: application not found");
                return Err(self.denied());
            }
            Err(e) => {
                error!(application_id = %id, error = %e, "Denied: directory lookup failed");
                return Err(self.denied());
            }
        };

        if !policy.evaluate(&application, ctx.target.as_ref()) {
            debug!(
                application_id = %id,
                target = ?ctx.target,
                "Denied: policy rejected target"
            );
            return Err(self.denied());
        }

        Ok(Authorized {
            application,
            target: ctx.target.clone(),
        })
    }

    /// Run `operation` if the request passes the gate, returning its result
    /// unchanged
    pub fn authorize<F, T>(
        &self,
        ctx: &RequestContext,
        policy: &dyn AuthorizationPolicy,
        operation: F,
    ) -> Result<T, GateError>
    where
        F: FnOnce(Authorized) -> T,
    {
        let authorized = self.authenticate(ctx, policy)?;
        Ok(operation(authorized))
    }

    fn denied(&self) -> GateError {
        GateError::InvalidToken {
            param: self.params.token.clone(),
        }
    }
}
