//! Signed, expiring application tokens
//!
//! Token layout: `<payload>.<signature>`, both segments base64url without
//! padding. The payload is the JSON of [`Claims`] plus an `exp_ms` field
//! holding the expiration instant in unix milliseconds. The signature is HMAC-SHA256 over
//! the encoded payload segment.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;

/// Default token lifetime: 24 hours
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60 * 24);

type HmacSha256 = Hmac<sha2::Sha256>;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("system clock is before the unix epoch")]
    Clock,
}

/// Identifier of an application record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub u64);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ApplicationId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Data embedded in a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Absent only when a correctly signed payload was produced without one
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    application_id: Option<ApplicationId>,
}

impl Claims {
    pub fn new(application_id: ApplicationId) -> Self {
        Self {
            application_id: Some(application_id),
        }
    }

    pub fn application_id(&self) -> Option<ApplicationId> {
        self.application_id
    }
}

/// Claims plus expiration, as written into the payload segment
#[derive(Serialize, Deserialize)]
struct Payload {
    #[serde(flatten)]
    claims: Claims,
    exp_ms: u64,
}

/// Outcome of verifying a token
///
/// `Expired` and `BadSignature` are kept apart for diagnostics only. Callers
/// that report to a client must treat them the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Valid(Claims),
    Expired,
    BadSignature,
}

impl Verification {
    /// The claims if the token is valid, `None` for either failure
    pub fn into_claims(self) -> Option<Claims> {
        match self {
            Verification::Valid(claims) => Some(claims),
            Verification::Expired | Verification::BadSignature => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid(_))
    }
}

/// Token signing secret, shared read-only for the process lifetime
#[derive(Clone)]
pub struct TokenSecret {
    key: Vec<u8>,
}

impl TokenSecret {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size")
    }
}

impl fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenSecret([REDACTED])")
    }
}

impl From<&str> for TokenSecret {
    fn from(key: &str) -> Self {
        Self::new(key.as_bytes())
    }
}

impl From<String> for TokenSecret {
    fn from(key: String) -> Self {
        Self::new(key.into_bytes())
    }
}

/// Signs and verifies application tokens
///
/// Stateless apart from the secret and the default lifetime; verification is
/// a pure function of the token, the secret and the clock.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    secret: TokenSecret,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: TokenSecret) -> Self {
        Self {
            secret,
            ttl: DEFAULT_TOKEN_TTL,
        }
    }

    /// Set the lifetime used by [`TokenCodec::issue`]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token with the default lifetime
    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        self.issue_with_ttl(claims, self.ttl)
    }

    /// Issue a token with an explicit lifetime
    pub fn issue_with_ttl(&self, claims: &Claims, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(claims, ttl, SystemTime::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(
        &self,
        claims: &Claims,
        ttl: Duration,
        now: SystemTime,
    ) -> Result<String, TokenError> {
        let exp_ms = unix_millis(now)?.saturating_add(ttl_millis(ttl));
        let payload = Payload {
            claims: claims.clone(),
            exp_ms,
        };
        let payload_json = serde_json::to_vec(&payload)?;
        let payload_b64 = URL_SAFE_NO_PAD.encode(&payload_json);

        let mut mac = self.secret.mac();
        mac.update(payload_b64.as_bytes());
        let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", payload_b64, signature_b64))
    }

    /// Verify a token against the current time
    pub fn verify(&self, token: &str) -> Verification {
        self.verify_at(token, SystemTime::now())
    }

    /// Verify a token as if the current time were `now`
    pub fn verify_at(&self, token: &str, now: SystemTime) -> Verification {
        let Some((payload_b64, signature_b64)) = token.split_once('.') else {
            debug!("Token rejected: missing signature segment");
            return Verification::BadSignature;
        };

        let Ok(signature) = URL_SAFE_NO_PAD.decode(signature_b64) else {
            debug!("Token rejected: signature is not base64url");
            return Verification::BadSignature;
        };

        // Constant-time comparison
        let mut mac = self.secret.mac();
        mac.update(payload_b64.as_bytes());
        if mac.verify_slice(&signature).is_err() {
            debug!("Token rejected: signature mismatch");
            return Verification::BadSignature;
        }

        let payload: Payload = match URL_SAFE_NO_PAD
            .decode(payload_b64)
            .ok()
            .and_then(|json| serde_json::from_slice(&json).ok())
        {
            Some(payload) => payload,
            None => {
                debug!("Token rejected: undecodable payload");
                return Verification::BadSignature;
            }
        };

        // A clock before the epoch can only mean the token is not yet usable
        let Ok(now_ms) = unix_millis(now) else {
            return Verification::Expired;
        };

        if now_ms >= payload.exp_ms {
            debug!(exp_ms = payload.exp_ms, now_ms, "Token rejected: expired");
            return Verification::Expired;
        }

        Verification::Valid(payload.claims)
    }
}

/// Whole milliseconds, rounded up so no lifetime is shortened
fn ttl_millis(ttl: Duration) -> u64 {
    let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
    millis.saturating_add(u64::from(ttl.subsec_nanos() % 1_000_000 > 0))
}

fn unix_millis(time: SystemTime) -> Result<u64, TokenError> {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .map_err(|_| TokenError::Clock)
}
