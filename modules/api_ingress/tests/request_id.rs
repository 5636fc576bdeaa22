use axum::{
    body::Body,
    extract::Extension,
    http::{Request, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::Json,
    routing::get,
    Router,
};
use modkit::api::problem;
use modkit::ApiResult;
use runtime::Environment;
use serde_json::json;
use tower::util::ServiceExt;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};

use api_ingress::error_layer::finalize_problem;
use api_ingress::request_id::{header as request_id_header, MakeReqId, XRequestId};

fn test_app(env: Environment) -> Router {
    let x_request_id = request_id_header();

    Router::new()
        .route("/test", get(success_handler))
        .route("/error", get(error_handler))
        .layer(from_fn_with_state(env, finalize_problem))
        .layer(from_fn(api_ingress::request_id::push_req_id_to_extensions))
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeReqId))
}

async fn success_handler(
    Extension(XRequestId(request_id)): Extension<XRequestId>,
) -> Json<serde_json::Value> {
    Json(json!({"status": "ok", "request_id": request_id}))
}

async fn error_handler() -> ApiResult {
    Err(problem::internal_error("sqlite: database is locked"))
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn generates_request_id_when_missing() {
    let response = test_app(Environment::Development)
        .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let header_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .expect("x-request-id should be generated");
    assert!(!header_id.is_empty());

    let json = body_json(response).await;
    assert_eq!(json["request_id"], header_id.as_str());
}

#[tokio::test]
async fn preserves_incoming_request_id() {
    let response = test_app(Environment::Development)
        .oneshot(
            Request::builder()
                .uri("/test")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok());
    assert_eq!(request_id, Some("abc-123"));
}

#[tokio::test]
async fn problem_carries_request_id_and_instance() {
    let response = test_app(Environment::Development)
        .oneshot(
            Request::builder()
                .uri("/error")
                .header("x-request-id", "error-test-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/problem+json"
    );
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("error-test-123")
    );

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Server Error");
    assert_eq!(json["request_id"], "error-test-123");
    assert_eq!(json["instance"], "/error");
    assert_eq!(json["debug"], "sqlite: database is locked");
}

#[tokio::test]
async fn production_hides_debug_detail() {
    let response = test_app(Environment::Production)
        .oneshot(Request::builder().uri("/error").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Server Error");
    assert!(json.get("debug").is_none());
}
