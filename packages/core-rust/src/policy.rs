//! Static tenant resolution policy: which strategy runs and what happens
//! when it finds nothing.

use std::fmt;
use std::str::FromStr;

use http::HeaderName;
use serde::{Deserialize, Serialize};

use crate::types::TenantId;

/// Default header carrying the tenant identifier.
pub const DEFAULT_HEADER_NAME: &str = "X-Tenant-ID";
/// Default cookie carrying the tenant identifier.
pub const DEFAULT_COOKIE_NAME: &str = "tenant_id";
/// Default token claim carrying the tenant identifier.
pub const DEFAULT_CLAIM_NAME: &str = "tenant_id";

/// How a candidate tenant identifier is extracted from a request.
///
/// Exactly one strategy is active per deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentificationStrategy {
    #[default]
    Header,
    Subdomain,
    Cookie,
    #[serde(alias = "path")]
    PathSegment,
    #[serde(alias = "jwt_claim")]
    TokenClaim,
}

impl IdentificationStrategy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Subdomain => "subdomain",
            Self::Cookie => "cookie",
            Self::PathSegment => "path_segment",
            Self::TokenClaim => "token_claim",
        }
    }
}

impl fmt::Display for IdentificationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from parsing or validating a [`ResolutionPolicy`].
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("unknown identification strategy: {0}")]
    UnknownStrategy(String),
    #[error("invalid header name: {0}")]
    InvalidHeaderName(String),
    #[error("{field} must not be empty")]
    EmptyName { field: &'static str },
}

impl FromStr for IdentificationStrategy {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "header" => Ok(Self::Header),
            "subdomain" => Ok(Self::Subdomain),
            "cookie" => Ok(Self::Cookie),
            "path_segment" | "path" => Ok(Self::PathSegment),
            "token_claim" | "jwt_claim" => Ok(Self::TokenClaim),
            other => Err(PolicyError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Deployment-wide configuration for identifying and enforcing tenants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionPolicy {
    /// Active identification strategy.
    pub strategy: IdentificationStrategy,
    /// Reject requests whose tenant is unidentified or unknown.
    pub require_tenant: bool,
    /// Header read by [`IdentificationStrategy::Header`].
    pub header_name: String,
    /// Cookie read by [`IdentificationStrategy::Cookie`].
    pub cookie_name: String,
    /// Claim read by [`IdentificationStrategy::TokenClaim`].
    pub claim_name: String,
    /// Zero-based Host label read by [`IdentificationStrategy::Subdomain`].
    pub subdomain_position: usize,
    /// Used when the strategy yields no candidate.
    pub default_tenant: Option<TenantId>,
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self {
            strategy: IdentificationStrategy::Header,
            require_tenant: true,
            header_name: DEFAULT_HEADER_NAME.to_string(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            claim_name: DEFAULT_CLAIM_NAME.to_string(),
            subdomain_position: 0,
            default_tenant: None,
        }
    }
}

impl ResolutionPolicy {
    /// Policy using `strategy` with every other knob at its default.
    #[must_use]
    pub fn with_strategy(strategy: IdentificationStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Checks that the configured names are usable.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if the header name is not a valid HTTP header
    /// name, or the cookie or claim name is empty.
    pub fn validate(&self) -> Result<(), PolicyError> {
        HeaderName::from_bytes(self.header_name.as_bytes())
            .map_err(|_| PolicyError::InvalidHeaderName(self.header_name.clone()))?;
        if self.cookie_name.is_empty() {
            return Err(PolicyError::EmptyName { field: "cookie_name" });
        }
        if self.claim_name.is_empty() {
            return Err(PolicyError::EmptyName { field: "claim_name" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_require_tenant_via_header() {
        let policy = ResolutionPolicy::default();
        assert_eq!(policy.strategy, IdentificationStrategy::Header);
        assert!(policy.require_tenant);
        assert_eq!(policy.header_name, "X-Tenant-ID");
        assert_eq!(policy.cookie_name, "tenant_id");
        assert_eq!(policy.claim_name, "tenant_id");
        assert_eq!(policy.subdomain_position, 0);
        assert!(policy.default_tenant.is_none());
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn strategy_parses_aliases() {
        assert_eq!(
            "path".parse::<IdentificationStrategy>().unwrap(),
            IdentificationStrategy::PathSegment
        );
        assert_eq!(
            "JWT_CLAIM".parse::<IdentificationStrategy>().unwrap(),
            IdentificationStrategy::TokenClaim
        );
        assert!(matches!(
            "query".parse::<IdentificationStrategy>(),
            Err(PolicyError::UnknownStrategy(s)) if s == "query"
        ));
    }

    #[test]
    fn strategy_display_round_trips_through_from_str() {
        for strategy in [
            IdentificationStrategy::Header,
            IdentificationStrategy::Subdomain,
            IdentificationStrategy::Cookie,
            IdentificationStrategy::PathSegment,
            IdentificationStrategy::TokenClaim,
        ] {
            assert_eq!(strategy.to_string().parse::<IdentificationStrategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn policy_deserializes_partial_json() {
        let policy: ResolutionPolicy = serde_json::from_str(
            r#"{ "strategy": "subdomain", "subdomain_position": 1, "default_tenant": "public" }"#,
        )
        .unwrap();
        assert_eq!(policy.strategy, IdentificationStrategy::Subdomain);
        assert_eq!(policy.subdomain_position, 1);
        assert_eq!(policy.default_tenant.unwrap().as_str(), "public");
        assert!(policy.require_tenant);
    }

    #[test]
    fn validate_rejects_bad_names() {
        let mut policy = ResolutionPolicy {
            header_name: "bad header".to_string(),
            ..ResolutionPolicy::default()
        };
        assert!(matches!(policy.validate(), Err(PolicyError::InvalidHeaderName(_))));

        policy.header_name = DEFAULT_HEADER_NAME.to_string();
        policy.cookie_name.clear();
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::EmptyName { field: "cookie_name" })
        ));
    }
}
