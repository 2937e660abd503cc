//! Authorization policies
//!
//! A policy decides whether a resolved application may act on a target
//! object. It is the only place authorization logic lives; the gate itself
//! has no opinion.

use crate::directory::Application;
use std::fmt;

/// Identifier of the object a request acts on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build from a JSON value; strings and numbers are accepted
    ///
    /// An integral float such as `1.0` yields the same id as `1`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            serde_json::Value::Number(n) => Some(Self(number_id(n))),
            _ => None,
        }
    }
}

// Largest magnitude below which every integral f64 is exact
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn number_id(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER => {
            (f as i64).to_string()
        }
        _ => n.to_string(),
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TargetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Decides whether an application may act on a target object
pub trait AuthorizationPolicy: Send + Sync {
    fn evaluate(&self, application: &Application, target: Option<&TargetId>) -> bool;
}

impl<F> AuthorizationPolicy for F
where
    F: Fn(&Application, Option<&TargetId>) -> bool + Send + Sync,
{
    fn evaluate(&self, application: &Application, target: Option<&TargetId>) -> bool {
        self(application, target)
    }
}

/// Permits every resolved application
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AuthorizationPolicy for AllowAll {
    fn evaluate(&self, _application: &Application, _target: Option<&TargetId>) -> bool {
        true
    }
}

/// Denies everything
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl AuthorizationPolicy for DenyAll {
    fn evaluate(&self, _application: &Application, _target: Option<&TargetId>) -> bool {
        false
    }
}

/// Permits an application only on the target whose id equals its own
///
/// A request without a target is denied.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnsTarget;

impl AuthorizationPolicy for OwnsTarget {
    fn evaluate(&self, application: &Application, target: Option<&TargetId>) -> bool {
        match (application.id(), target) {
            (Some(id), Some(target)) => target.as_str() == id.to_string(),
            _ => false,
        }
    }
}
