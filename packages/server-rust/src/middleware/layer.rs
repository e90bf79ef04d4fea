//! Tower middleware that binds a tenant to every request.
//!
//! Rejected requests are answered here and never reach the inner service.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::Request;
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use super::context::with_tenant;
use super::injector::TenantInjector;

// ---------------------------------------------------------------------------
// TenantLayer
// ---------------------------------------------------------------------------

/// Tower layer that wraps services with tenant identification and resolution.
#[derive(Debug, Clone)]
pub struct TenantLayer {
    injector: TenantInjector,
}

impl TenantLayer {
    #[must_use]
    pub fn new(injector: TenantInjector) -> Self {
        Self { injector }
    }
}

impl<S> Layer<S> for TenantLayer {
    type Service = TenantService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TenantService {
            inner,
            injector: self.injector.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// TenantService
// ---------------------------------------------------------------------------

/// Service wrapper that injects the request's tenant or rejects the request.
#[derive(Debug, Clone)]
pub struct TenantService<S> {
    inner: S,
    injector: TenantInjector,
}

impl<S, B> Service<Request<B>> for TenantService<S>
where
    S: Service<Request<B>> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        // Take the instance that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let injector = self.injector.clone();

        let span = info_span!(
            "tenant",
            strategy = %injector.policy().strategy,
            identification = tracing::field::Empty,
            tenant_id = tracing::field::Empty,
        );

        Box::pin(
            async move {
                let (mut parts, body) = request.into_parts();
                match injector.inject(&mut parts).await {
                    Ok(scope) => {
                        let call = inner.call(Request::from_parts(parts, body));
                        let response = match scope.context() {
                            Some(context) => with_tenant(Arc::clone(context), call).await?,
                            None => call.await?,
                        };
                        Ok(response.into_response())
                    }
                    Err(rejection) => Ok(rejection.into_response()),
                }
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::Body;
    use axum::http::StatusCode;
    use tenantgate_core::{ResolutionPolicy, TenantContext};
    use tower::ServiceExt;

    use super::*;
    use crate::middleware::{current_tenant, TenantScope};
    use crate::resolver::TenantResolver;
    use crate::test_support::CountingDirectory;

    /// Inner service that records how often it ran and echoes the bound tenant.
    #[derive(Clone)]
    struct EchoTenant {
        calls: Arc<AtomicUsize>,
    }

    impl Service<Request<Body>> for EchoTenant {
        type Response = Response;
        type Error = Infallible;
        type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<Body>) -> Self::Future {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let tenant = req
                .extensions()
                .get::<Arc<TenantContext>>()
                .map_or_else(|| "none".to_string(), |ctx| ctx.tenant_id().to_string());
            let scoped = req.extensions().get::<TenantScope>().is_some();
            Box::pin(async move {
                let local = current_tenant()
                    .map_or_else(|| "none".to_string(), |ctx| ctx.tenant_id().to_string());
                Ok(format!("{tenant}:{scoped}:{local}").into_response())
            })
        }
    }

    fn service(
        policy: ResolutionPolicy,
        directory: Arc<CountingDirectory>,
    ) -> (TenantService<EchoTenant>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let injector = TenantInjector::new(policy, TenantResolver::new(directory));
        let svc = TenantLayer::new(injector).layer(EchoTenant {
            calls: Arc::clone(&calls),
        });
        (svc, calls)
    }

    fn request(tenant: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/orders");
        if let Some(tenant) = tenant {
            builder = builder.header("X-Tenant-ID", tenant);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn known_tenant_reaches_inner_service() {
        let directory = Arc::new(CountingDirectory::with_tenants(["acme"]));
        let (svc, calls) = service(ResolutionPolicy::default(), directory);

        let response = svc.oneshot(request(Some("acme"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "acme:true:acme");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejection_short_circuits_inner_service() {
        let directory = Arc::new(CountingDirectory::default());
        let (svc, calls) = service(ResolutionPolicy::default(), directory);

        let response = svc.clone().oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = svc.oneshot(request(Some("ghost"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_string(response).await.contains("tenant 'ghost' not found"));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn optional_policy_proceeds_with_absent_scope() {
        let directory = Arc::new(CountingDirectory::default());
        let policy = ResolutionPolicy {
            require_tenant: false,
            ..ResolutionPolicy::default()
        };
        let (svc, calls) = service(policy, directory);

        let response = svc.oneshot(request(Some("ghost"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "none:true:none");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn directory_failure_returns_503() {
        let directory = Arc::new(CountingDirectory::with_tenants(["acme"]));
        directory.set_failing(true);
        let (svc, calls) = service(ResolutionPolicy::default(), directory);

        let response = svc.oneshot(request(Some("acme"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
