use crate::infra::{AppState, MemoryConnector};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{middleware, Extension, Json, Router};
use casavista::auth::{require_access, AccessGate};
use casavista::content::router::{content_router, ContentState};
use serde_json::json;
use std::sync::Arc;

/// Library content routes plus service plumbing, all behind the access
/// gate. The gate sees every request; health and metrics sit outside the
/// guarded prefixes and stay reachable without credentials.
pub(crate) fn build_router(
    content: Arc<ContentState<MemoryConnector>>,
    gate: Arc<AccessGate>,
) -> Router {
    content_router(content)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .layer(middleware::from_fn_with_state(gate, require_access))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::MemoryRepository;
    use axum::body::{to_bytes, Body};
    use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
    use axum::http::{Method, Request};
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use casavista::config::AdminConfig;
    use casavista::content::{
        Apartment, ApartmentId, ContentRepository, MediaResolver,
    };
    use casavista::storage::ConnectionPool;
    use serde_json::Value;
    use tower::ServiceExt;

    fn admin() -> AdminConfig {
        AdminConfig {
            user: "editor".to_string(),
            pass: "s3cret".to_string(),
        }
    }

    fn credentials() -> String {
        format!("Basic {}", BASE64.encode("editor:s3cret"))
    }

    fn seeded_repository() -> Arc<MemoryRepository> {
        let repository = Arc::new(MemoryRepository::default());
        for (id, rank) in [("a", 0), ("b", 1), ("c", 2)] {
            repository
                .upsert_apartment(Apartment {
                    id: ApartmentId(id.to_string()),
                    name: format!("Apartment {id}"),
                    published: true,
                    order_show: rank,
                })
                .expect("seed apartment");
        }
        repository
    }

    fn router_with(repository: Arc<MemoryRepository>) -> Router {
        let state = Arc::new(ContentState {
            pool: ConnectionPool::new(MemoryConnector::with_repository(repository)),
            media: MediaResolver::new("https://casavista.example"),
        });
        build_router(state, Arc::new(AccessGate::new(&admin())))
    }

    fn put_order(body: &str, authorized: bool) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::PUT)
            .uri("/api/v1/apartments/order")
            .header(header::CONTENT_TYPE, "application/json");
        if authorized {
            builder = builder.header(AUTHORIZATION, credentials());
        }
        builder.body(Body::from(body.to_string())).expect("request")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn safe_api_method_needs_no_credentials() {
        let router = router_with(seeded_repository());
        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/v1/apartments")
            .body(Body::empty())
            .expect("request");

        let response = router.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn mutating_api_method_without_credentials_is_challenged() {
        let repository = seeded_repository();
        let router = router_with(Arc::clone(&repository));

        let response = router
            .oneshot(put_order(r#"{ "order": [ { "id": "a", "orderShow": 9 } ] }"#, false))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .expect("challenge header")
            .to_str()
            .expect("ascii header");
        assert_eq!(challenge, "Basic realm=\"Admin API\"");

        // Denied before the handler: no write happened.
        let entries = repository.apartments().expect("list");
        let a = entries.iter().find(|e| e.id.0 == "a").expect("a exists");
        assert_eq!(a.order_show, 0);
    }

    #[tokio::test]
    async fn admin_path_without_credentials_is_challenged() {
        let router = router_with(seeded_repository());
        let request = Request::builder()
            .method(Method::GET)
            .uri("/admin/content")
            .body(Body::empty())
            .expect("request");

        let response = router.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .expect("challenge header")
            .to_str()
            .expect("ascii header");
        assert_eq!(challenge, "Basic realm=\"Admin Area\"");
    }

    #[tokio::test]
    async fn malformed_authorization_header_is_denied_cleanly() {
        let router = router_with(seeded_repository());
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/api/v1/apartments/order")
            .header(header::CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, "Basic %%%not-base64%%%")
            .body(Body::from(r#"{ "order": [] }"#))
            .expect("request");

        let response = router.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn order_rejects_non_sequence_payload_without_writing() {
        let repository = seeded_repository();
        let router = router_with(Arc::clone(&repository));

        let response = router
            .oneshot(put_order(r#"{ "order": 5 }"#, true))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "order must be an array");

        let entries = repository.apartments().expect("list");
        let ranks: Vec<_> = entries.iter().map(|e| e.order_show).collect();
        assert!(ranks.contains(&0) && ranks.contains(&1) && ranks.contains(&2));
    }

    #[tokio::test]
    async fn empty_order_returns_ok_with_zero_writes() {
        let router = router_with(seeded_repository());

        let response = router
            .oneshot(put_order(r#"{ "order": [] }"#, true))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["updated"], 0);
    }

    #[tokio::test]
    async fn order_rewrite_changes_read_back_sequence() {
        let repository = seeded_repository();
        let router = router_with(Arc::clone(&repository));

        let payload = r#"{ "order": [
            { "id": "a", "orderShow": 2 },
            { "id": "b", "orderShow": 0 },
            { "id": "c", "orderShow": 1 }
        ] }"#;
        let response = router
            .clone()
            .oneshot(put_order(payload, true))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["updated"], 3);

        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/v1/apartments")
            .body(Body::empty())
            .expect("request");
        let response = router.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let ids: Vec<_> = body
            .as_array()
            .expect("array body")
            .iter()
            .map(|entry| entry["id"].as_str().expect("id").to_string())
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn messages_endpoint_404s_for_unknown_locale() {
        let router = router_with(seeded_repository());
        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/v1/messages/fr")
            .body(Body::empty())
            .expect("request");

        let response = router.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn healthcheck_is_reachable_without_credentials() {
        let router = router_with(seeded_repository());
        let request = Request::builder()
            .method(Method::GET)
            .uri("/health")
            .body(Body::empty())
            .expect("request");

        let response = router.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
