//! Request-id, tracing and timeout layers shared by every gateway route.

use axum::http::header::HeaderName;
use axum::http::StatusCode;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::config::NetworkConfig;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Wraps `router` in the transport layers.
///
/// A request is first given an `x-request-id` (an incoming one is kept),
/// then traced, then bounded by `config.request_timeout`. The id is copied
/// back onto the response. Tenant spans and tenant resolution both run
/// inside the trace span and count against the timeout.
pub fn with_transport_layers(router: Router, config: &NetworkConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                config.request_timeout,
            ))
            .layer(PropagateRequestIdLayer::new(request_id)),
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use tower::ServiceExt;

    use super::*;

    fn app(timeout: Duration) -> Router {
        let routes = Router::new()
            .route("/fast", get(|| async { "ok" }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    "late"
                }),
            );
        with_transport_layers(
            routes,
            &NetworkConfig {
                request_timeout: timeout,
                ..NetworkConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn response_carries_generated_request_id() {
        let request = Request::get("/fast").body(Body::empty()).unwrap();
        let response = app(Duration::from_secs(5)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let id = response.headers().get(REQUEST_ID_HEADER).unwrap();
        assert!(!id.is_empty());
    }

    #[tokio::test]
    async fn incoming_request_id_is_kept() {
        let request = Request::get("/fast")
            .header(REQUEST_ID_HEADER, "req-42")
            .body(Body::empty())
            .unwrap();
        let response = app(Duration::from_secs(5)).oneshot(request).await.unwrap();

        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-42");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_request_times_out_with_408() {
        let request = Request::get("/slow").body(Body::empty()).unwrap();
        let response = app(Duration::from_secs(5)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }
}
