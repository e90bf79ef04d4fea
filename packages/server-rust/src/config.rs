//! Command-line and environment configuration for the gateway binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tenantgate_core::{IdentificationStrategy, PolicyError, ResolutionPolicy, TenantId};

use crate::network::NetworkConfig;

/// TenantGate: resolves the tenant of every request before it reaches a handler.
#[derive(Debug, Clone, Parser)]
#[command(name = "tenantgate", version, about)]
pub struct GatewayArgs {
    /// Address to bind.
    #[arg(long, env = "TENANTGATE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "TENANTGATE_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Identification strategy: header, subdomain, cookie, path_segment, token_claim.
    #[arg(long, env = "TENANTGATE_STRATEGY", default_value = "header")]
    pub strategy: IdentificationStrategy,

    /// Header carrying the tenant id.
    #[arg(long, env = "TENANTGATE_HEADER", default_value = tenantgate_core::policy::DEFAULT_HEADER_NAME)]
    pub header_name: String,

    /// Cookie carrying the tenant id.
    #[arg(long, env = "TENANTGATE_COOKIE", default_value = tenantgate_core::policy::DEFAULT_COOKIE_NAME)]
    pub cookie_name: String,

    /// Token claim carrying the tenant id.
    #[arg(long, env = "TENANTGATE_CLAIM", default_value = tenantgate_core::policy::DEFAULT_CLAIM_NAME)]
    pub claim_name: String,

    /// Zero-based Host label holding the tenant id.
    #[arg(long, env = "TENANTGATE_SUBDOMAIN_POSITION", default_value_t = 0)]
    pub subdomain_position: usize,

    /// Tenant used when the strategy finds none.
    #[arg(long, env = "TENANTGATE_DEFAULT_TENANT")]
    pub default_tenant: Option<String>,

    /// Let requests without a known tenant through instead of rejecting them.
    #[arg(long, env = "TENANTGATE_OPTIONAL_TENANT")]
    pub optional_tenant: bool,

    /// JSON file with an array of tenant contexts.
    #[arg(long, env = "TENANTGATE_TENANTS_FILE")]
    pub tenants_file: Option<PathBuf>,

    /// Expire cached tenant contexts after this many seconds. Unset: never.
    #[arg(long, env = "TENANTGATE_CACHE_TTL_SECS")]
    pub cache_ttl_secs: Option<u64>,

    /// Seconds between sweeps of expired cache entries.
    #[arg(long, env = "TENANTGATE_CACHE_CLEANUP_SECS", default_value_t = 60)]
    pub cache_cleanup_secs: u64,

    /// Request timeout in seconds.
    #[arg(long, env = "TENANTGATE_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Emit logs as JSON lines.
    #[arg(long, env = "TENANTGATE_LOG_JSON")]
    pub log_json: bool,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, env = "TENANTGATE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl GatewayArgs {
    /// Builds and validates the resolution policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if a configured name is unusable.
    pub fn policy(&self) -> Result<ResolutionPolicy, PolicyError> {
        let policy = ResolutionPolicy {
            strategy: self.strategy,
            require_tenant: !self.optional_tenant,
            header_name: self.header_name.clone(),
            cookie_name: self.cookie_name.clone(),
            claim_name: self.claim_name.clone(),
            subdomain_position: self.subdomain_position,
            default_tenant: self.default_tenant.as_deref().and_then(TenantId::parse),
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Cache TTL, if expiry is enabled. Zero disables it.
    #[must_use]
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    #[must_use]
    pub fn cache_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cache_cleanup_secs.max(1))
    }

    #[must_use]
    pub fn network(&self) -> NetworkConfig {
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}
