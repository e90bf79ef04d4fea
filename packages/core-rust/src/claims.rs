use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Claims of a token that an upstream step has already verified.
///
/// The authentication layer inserts this into request extensions; tenant
/// identification only reads it and never decodes or verifies tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenClaims(BTreeMap<String, serde_json::Value>);

impl TokenClaims {
    #[must_use]
    pub fn new(claims: BTreeMap<String, serde_json::Value>) -> Self {
        Self(claims)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }

    /// Returns the claim as a non-empty string.
    ///
    /// Numeric claims use their decimal form; any other JSON type is absent.
    #[must_use]
    pub fn claim_str(&self, name: &str) -> Option<String> {
        match self.0.get(name)? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl FromIterator<(String, serde_json::Value)> for TokenClaims {
    fn from_iter<I: IntoIterator<Item = (String, serde_json::Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
