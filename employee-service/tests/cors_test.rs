use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use employee_service::services::{EmployeeStore, InMemoryEmployeeStore};
use employee_service::{build_router, AppState};
use std::sync::Arc;
use tower::ServiceExt;

fn router(store: Arc<InMemoryEmployeeStore>) -> axum::Router {
    let store: Arc<dyn EmployeeStore> = store;
    build_router(AppState::new(store), None)
}

#[tokio::test]
async fn preflight_is_answered_for_every_route() {
    for (path, method) in [
        ("/add-employee", "POST"),
        ("/employees", "GET"),
        ("/delete-employee", "DELETE"),
        ("/update-employee", "PUT"),
    ] {
        let response = router(Arc::new(InMemoryEmployeeStore::new()))
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri(path)
                    .header(header::ORIGIN, "http://frontend.local")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, method)
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "path: {}", path);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
        let allowed = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(allowed.contains(method), "allowed methods: {}", allowed);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }
}

#[tokio::test]
async fn bare_options_returns_empty_200_without_touching_storage() {
    let store = Arc::new(InMemoryEmployeeStore::new());

    let response = router(store.clone())
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/add-employee")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(body.is_empty());
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn simple_requests_carry_allow_origin_header() {
    let response = router(Arc::new(InMemoryEmployeeStore::new()))
        .oneshot(
            Request::builder()
                .uri("/employees")
                .header(header::ORIGIN, "http://frontend.local")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test]
async fn responses_carry_request_id() {
    let response = router(Arc::new(InMemoryEmployeeStore::new()))
        .oneshot(
            Request::builder()
                .uri("/employees")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "req-123"
    );
}
