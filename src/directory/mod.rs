//! Application records and the directory they are looked up in
//!
//! The directory is read-only from this crate's point of view. Persistence is
//! the adapter's business; [`MemoryDirectory`] is the bundled adapter.

mod memory;

pub use memory::MemoryDirectory;

use crate::auth::ApplicationId;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Directory errors
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    #[error("directory backend error: {0}")]
    Backend(String),

    #[error("invalid application record: {0}")]
    InvalidRecord(String),
}

/// Long-lived secret an application exchanges for tokens
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct ApiKey {
    key: String,
}

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Generate a random key (32 bytes, base64url)
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rng().fill(&mut bytes);
        Self::new(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn matches(&self, candidate: &str) -> bool {
        // Constant-time comparison to prevent timing attacks
        if candidate.len() != self.key.len() {
            return false;
        }

        let mut result = 0u8;
        for (a, b) in candidate.bytes().zip(self.key.bytes()) {
            result |= a ^ b;
        }
        result == 0
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey([REDACTED])")
    }
}

/// An application allowed to request tokens
#[derive(Debug, Clone, Deserialize)]
pub struct Application {
    /// `None` for a record that has not been persisted yet
    #[serde(default)]
    id: Option<ApplicationId>,
    api_key: ApiKey,
    #[serde(default)]
    name: Option<String>,
}

impl Application {
    pub fn new(id: ApplicationId, api_key: ApiKey) -> Self {
        Self {
            id: Some(id),
            api_key,
            name: None,
        }
    }

    /// A record without an identifier
    pub fn unsaved(api_key: ApiKey) -> Self {
        Self {
            id: None,
            api_key,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> Option<ApplicationId> {
        self.id
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Read-only lookup of application records
///
/// Lookups must be free of side effects. Implementations own their own
/// concurrency and latency bounds; callers never retry.
pub trait ApplicationDirectory: Send + Sync {
    /// Find the application holding `api_key`
    fn find_by_api_key(&self, api_key: &str) -> Result<Option<Application>, DirectoryError>;

    /// Find an application by identifier
    fn find_by_id(&self, id: ApplicationId) -> Result<Option<Application>, DirectoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_matches() {
        let key = ApiKey::new("my-secret-api-key");
        assert!(key.matches("my-secret-api-key"));
        assert!(!key.matches("wrong-key"));
        assert!(!key.matches("my-secret-api-key-extra"));
        assert!(!key.matches(""));
    }

    #[test]
    fn test_api_key_generate() {
        let a = ApiKey::generate();
        let b = ApiKey::generate();

        assert_eq!(a.as_str().len(), 43);
        assert_ne!(a.as_str(), b.as_str());
    }

    #[test]
    fn test_api_key_debug_redacted() {
        let app = Application::new(ApplicationId(1), ApiKey::new("VALID"));
        let debug = format!("{:?}", app);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("VALID"));
    }

    #[test]
    fn test_application_deserialize() {
        let app: Application =
            serde_json::from_str(r#"{"id": 3, "api_key": "k3", "name": "partner"}"#).unwrap();
        assert_eq!(app.id(), Some(ApplicationId(3)));
        assert!(app.api_key().matches("k3"));
        assert_eq!(app.name(), Some("partner"));

        let unsaved: Application = serde_json::from_str(r#"{"api_key": "k"}"#).unwrap();
        assert_eq!(unsaved.id(), None);
    }
}
