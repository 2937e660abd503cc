//! Per-request values consumed and produced by the gate

use crate::auth::TargetId;
use crate::config::ParamNames;
use crate::directory::Application;

/// What a gated request presented: its token and the object it targets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub token: Option<String>,
    pub target: Option<TargetId>,
}

impl RequestContext {
    pub fn new(token: Option<String>, target: Option<TargetId>) -> Self {
        Self { token, target }
    }

    /// Extract the token from the query string and the target from the JSON
    /// body, falling back to the query string. Empty values count as absent;
    /// a repeated query parameter takes its first value.
    pub fn from_params(
        params: &ParamNames,
        query: &[(String, String)],
        body: Option<&serde_json::Value>,
    ) -> Self {
        let token = first_value(query, &params.token)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        let target = body
            .and_then(|b| b.get(&params.object_id))
            .and_then(TargetId::from_json)
            .or_else(|| {
                first_value(query, &params.object_id)
                    .filter(|id| !id.is_empty())
                    .map(TargetId::new)
            });

        Self { token, target }
    }
}

fn first_value<'a>(query: &'a [(String, String)], name: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// A request that passed the gate
#[derive(Debug, Clone)]
pub struct Authorized {
    pub application: Application,
    pub target: Option<TargetId>,
}
