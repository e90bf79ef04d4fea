//! Request → candidate tenant identifier.
//!
//! Every strategy is a pure function over the request head with the same
//! signature; [`identify`] dispatches on the configured
//! [`IdentificationStrategy`]. Nothing here performs I/O or fails.

use std::net::IpAddr;

use http::header::{HeaderValue, COOKIE, HOST};
use http::request::Parts;

use crate::claims::TokenClaims;
use crate::policy::{IdentificationStrategy, ResolutionPolicy};
use crate::types::TenantId;

/// Host label that never names a tenant.
const WWW_LABEL: &str = "www";

/// Minimum number of Host labels for a subdomain to exist (`tenant.example.com`).
const MIN_SUBDOMAIN_LABELS: usize = 3;

/// Outcome of running the configured strategy against one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identification {
    /// The strategy extracted a candidate.
    Found {
        id: TenantId,
        strategy: IdentificationStrategy,
    },
    /// The strategy found nothing and the configured default was used.
    Defaulted { id: TenantId },
    /// The strategy found nothing and no default is configured.
    Missing,
    /// Token-claim strategy selected but no upstream step populated claims.
    /// Policy treats it like [`Identification::Missing`].
    PrerequisiteMissing,
}

impl Identification {
    #[must_use]
    pub fn candidate(&self) -> Option<&TenantId> {
        match self {
            Self::Found { id, .. } | Self::Defaulted { id } => Some(id),
            Self::Missing | Self::PrerequisiteMissing => None,
        }
    }

    #[must_use]
    pub fn into_candidate(self) -> Option<TenantId> {
        match self {
            Self::Found { id, .. } | Self::Defaulted { id } => Some(id),
            Self::Missing | Self::PrerequisiteMissing => None,
        }
    }

    /// Short label used in log fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Found { .. } => "found",
            Self::Defaulted { .. } => "defaulted",
            Self::Missing => "missing",
            Self::PrerequisiteMissing => "prerequisite_missing",
        }
    }
}

/// Strategy result before the default-tenant fallback is applied.
enum Extracted {
    Candidate(TenantId),
    Absent,
    PrerequisiteMissing,
}

impl From<Option<TenantId>> for Extracted {
    fn from(value: Option<TenantId>) -> Self {
        value.map_or(Self::Absent, Self::Candidate)
    }
}

/// Identifies the candidate tenant for a request.
#[must_use]
pub fn identify(parts: &Parts, policy: &ResolutionPolicy) -> Identification {
    let extracted = match policy.strategy {
        IdentificationStrategy::Header => from_header(parts, &policy.header_name).into(),
        IdentificationStrategy::Subdomain => {
            from_subdomain(parts, policy.subdomain_position).into()
        }
        IdentificationStrategy::Cookie => from_cookie(parts, &policy.cookie_name).into(),
        IdentificationStrategy::PathSegment => from_path(parts.uri.path()).into(),
        IdentificationStrategy::TokenClaim => from_claims(parts, &policy.claim_name),
    };

    match (extracted, &policy.default_tenant) {
        (Extracted::Candidate(id), _) => Identification::Found {
            id,
            strategy: policy.strategy,
        },
        (_, Some(default)) => Identification::Defaulted {
            id: default.clone(),
        },
        (Extracted::Absent, None) => Identification::Missing,
        (Extracted::PrerequisiteMissing, None) => Identification::PrerequisiteMissing,
    }
}

/// Header bytes as UTF-8. `HeaderValue::to_str` would reject non-ASCII ids.
fn header_text(value: &HeaderValue) -> Option<&str> {
    std::str::from_utf8(value.as_bytes()).ok()
}

fn from_header(parts: &Parts, name: &str) -> Option<TenantId> {
    TenantId::parse(header_text(parts.headers.get(name)?)?)
}

fn from_subdomain(parts: &Parts, position: usize) -> Option<TenantId> {
    let host = parts
        .headers
        .get(HOST)
        .and_then(header_text)
        .or_else(|| parts.uri.host())?;
    subdomain_label(host, position)
}

/// Picks the label at `position` from a Host value.
///
/// The port is ignored. IP literals and hosts with fewer than three labels
/// have no subdomain. `www` is never a tenant.
#[must_use]
pub fn subdomain_label(host: &str, position: usize) -> Option<TenantId> {
    let host = strip_port(host);
    if host.parse::<IpAddr>().is_ok() {
        return None;
    }
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < MIN_SUBDOMAIN_LABELS {
        return None;
    }
    let label = *labels.get(position)?;
    if label.eq_ignore_ascii_case(WWW_LABEL) {
        return None;
    }
    TenantId::parse(label)
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.bytes().all(|b| b.is_ascii_digit()) => {
            name
        }
        _ => host,
    }
}

fn from_cookie(parts: &Parts, name: &str) -> Option<TenantId> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(header_text)
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .and_then(|(_, value)| TenantId::parse(unquote(value)))
}

/// Strips one pair of surrounding double quotes (`"acme"` → `acme`).
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

/// Returns the first path component: `/acme/orders/42` → `acme`.
#[must_use]
pub fn from_path(path: &str) -> Option<TenantId> {
    TenantId::parse(path.split('/').nth(1)?)
}

fn from_claims(parts: &Parts, claim: &str) -> Extracted {
    match parts.extensions.get::<TokenClaims>() {
        Some(claims) => claims
            .claim_str(claim)
            .and_then(|value| TenantId::parse(&value))
            .into(),
        None => Extracted::PrerequisiteMissing,
    }
}
