//! Request rejections produced by tenant injection and the tenant extractors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tenantgate_core::TenantId;

/// Why a request was refused before reaching its handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TenantRejection {
    /// No candidate tenant and the policy requires one.
    #[error("tenant not identified")]
    NotIdentified,
    /// The candidate is unknown to the directory and the policy requires a tenant.
    #[error("tenant '{0}' not found")]
    NotFound(TenantId),
    /// The directory could not answer; never reported as "not found".
    #[error("tenant directory unavailable")]
    DirectoryUnavailable,
    /// A handler asked for a tenant context that was not bound.
    #[error("tenant context not available")]
    ContextUnavailable,
    /// A handler asked for a tenant id that was not bound.
    #[error("tenant id not available")]
    IdUnavailable,
}

impl TenantRejection {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotIdentified | Self::ContextUnavailable | Self::IdUnavailable => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::DirectoryUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for TenantRejection {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
