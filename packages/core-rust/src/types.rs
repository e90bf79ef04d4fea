use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a tenant identifier is constructed from an empty string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tenant identifier must not be empty")]
pub struct InvalidTenantId;

/// Opaque, non-empty string naming a tenant.
///
/// Produced by exactly one identification strategy per request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Creates a tenant identifier.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTenantId`] if `value` is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidTenantId> {
        let value = value.into();
        if value.is_empty() {
            Err(InvalidTenantId)
        } else {
            Ok(Self(value))
        }
    }

    /// Lenient constructor for values read from requests: empty means absent.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::new(value).ok()
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TenantId {
    type Error = InvalidTenantId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

/// How a tenant's data is kept apart from other tenants' data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationStrategy {
    /// Dedicated schema inside a shared database.
    Schema,
    /// Dedicated database.
    Database,
    /// Shared tables, rows discriminated by tenant id.
    Row,
}

/// Resolved, immutable description of a tenant.
///
/// Built once per successful directory lookup and shared read-only (behind
/// an `Arc`) by every code path that handles the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantContext {
    tenant_id: TenantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    database_name: Option<String>,
    /// `BTreeMap` keeps serialization deterministic; lookup order is irrelevant.
    #[serde(default)]
    metadata: BTreeMap<String, serde_json::Value>,
}

impl TenantContext {
    #[must_use]
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            schema_name: None,
            database_name: None,
            metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }

    #[must_use]
    pub fn with_database(mut self, database_name: impl Into<String>) -> Self {
        self.database_name = Some(database_name.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    #[must_use]
    pub fn schema_name(&self) -> Option<&str> {
        self.schema_name.as_deref()
    }

    #[must_use]
    pub fn database_name(&self) -> Option<&str> {
        self.database_name.as_deref()
    }

    #[must_use]
    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }

    /// Derives the isolation strategy from the configured names.
    ///
    /// A dedicated database takes precedence over a schema; a context with
    /// neither is row-isolated.
    #[must_use]
    pub fn isolation(&self) -> IsolationStrategy {
        if self.database_name.is_some() {
            IsolationStrategy::Database
        } else if self.schema_name.is_some() {
            IsolationStrategy::Schema
        } else {
            IsolationStrategy::Row
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tenant_id_rejects_empty() {
        assert_eq!(TenantId::new(""), Err(InvalidTenantId));
        assert!(TenantId::parse("").is_none());
        assert_eq!(TenantId::new("acme").unwrap().as_str(), "acme");
    }

    #[test]
    fn tenant_id_deserialize_rejects_empty() {
        let err = serde_json::from_str::<TenantId>("\"\"");
        assert!(err.is_err());
        let id: TenantId = serde_json::from_str("\"acme\"").unwrap();
        assert_eq!(id.to_string(), "acme");
    }

    #[test]
    fn isolation_prefers_database_over_schema() {
        let id = TenantId::new("acme").unwrap();
        let row = TenantContext::new(id.clone());
        assert_eq!(row.isolation(), IsolationStrategy::Row);

        let schema = row.clone().with_schema("acme_schema");
        assert_eq!(schema.isolation(), IsolationStrategy::Schema);

        let both = schema.with_database("acme_db");
        assert_eq!(both.isolation(), IsolationStrategy::Database);
    }

    #[test]
    fn context_deserializes_with_missing_optional_fields() {
        let ctx: TenantContext =
            serde_json::from_value(json!({ "tenant_id": "acme" })).unwrap();
        assert_eq!(ctx.tenant_id().as_str(), "acme");
        assert!(ctx.schema_name().is_none());
        assert!(ctx.metadata().is_empty());
    }

    #[test]
    fn context_serializes_metadata() {
        let ctx = TenantContext::new(TenantId::new("acme").unwrap())
            .with_schema("acme")
            .with_metadata("plan", json!("enterprise"));
        let value = serde_json::to_value(&ctx).unwrap();
        assert_eq!(value["tenant_id"], "acme");
        assert_eq!(value["schema_name"], "acme");
        assert_eq!(value["metadata"]["plan"], "enterprise");
        assert!(value.get("database_name").is_none());
    }
}
