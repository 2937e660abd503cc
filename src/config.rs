//! Gate configuration

use crate::auth::{TokenSecret, DEFAULT_TOKEN_TTL};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TOKEN_PARAM: &str = "apptoken";
pub const DEFAULT_OBJECT_PARAM: &str = "device_id";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} is invalid: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Request parameter names the gate reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamNames {
    /// Query parameter carrying the token
    pub token: String,
    /// Body or query parameter carrying the target object id
    pub object_id: String,
}

impl Default for ParamNames {
    fn default() -> Self {
        Self {
            token: DEFAULT_TOKEN_PARAM.to_string(),
            object_id: DEFAULT_OBJECT_PARAM.to_string(),
        }
    }
}

/// Process-wide configuration for an [`AuthorizationGate`](crate::gate::AuthorizationGate)
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Token signing secret
    pub secret: TokenSecret,

    /// Lifetime of issued tokens
    pub token_ttl: Duration,

    /// Request parameter names
    pub params: ParamNames,
}

impl GateConfig {
    /// Create a configuration with the given secret and default settings
    pub fn new(secret: impl Into<TokenSecret>) -> Self {
        Self {
            secret: secret.into(),
            token_ttl: DEFAULT_TOKEN_TTL,
            params: ParamNames::default(),
        }
    }

    /// Read from `APPTOKEN_SECRET`, `APPTOKEN_TTL`, `APPTOKEN_PARAM` and
    /// `APPTOKEN_OBJECT_PARAM`
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = std::env::var("APPTOKEN_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("APPTOKEN_SECRET"))?;

        Self::new(secret).with_env_overrides()
    }

    /// Apply `APPTOKEN_TTL`, `APPTOKEN_PARAM` and `APPTOKEN_OBJECT_PARAM`
    /// when set, keeping the secret
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(ttl) = std::env::var("APPTOKEN_TTL") {
            let secs = ttl.parse().map_err(|_| ConfigError::Invalid {
                name: "APPTOKEN_TTL",
                value: ttl.clone(),
            })?;
            self = self.token_ttl(Duration::from_secs(secs));
        }
        if let Ok(name) = std::env::var("APPTOKEN_PARAM") {
            self = self.token_param(name);
        }
        if let Ok(name) = std::env::var("APPTOKEN_OBJECT_PARAM") {
            self = self.object_param(name);
        }

        Ok(self)
    }

    /// Set the token lifetime
    pub fn token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Set the query parameter that carries the token
    pub fn token_param(mut self, name: impl Into<String>) -> Self {
        self.params.token = name.into();
        self
    }

    /// Set the parameter that carries the target object id
    pub fn object_param(mut self, name: impl Into<String>) -> Self {
        self.params.object_id = name.into();
        self
    }
}
