//! The host wired end to end: init from a context, REST phases, then requests
//! through the finished router.

use std::sync::Arc;
use std::time::Duration;

use api_ingress::ApiIngress;
use axum::{body::Body, http::Request, Router};
use modkit::api::{problem, response, OpenApiRegistry, OperationBuilder};
use modkit::contracts::RestHostModule;
use modkit::{ApiResult, ClientHub, ConfigProvider, Identity, Module, ModuleCtx, ModuleCtxBuilder, Role, TokenCodec};
use runtime::Environment;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

fn codec() -> Arc<TokenCodec> {
    Arc::new(TokenCodec::new(
        b"host-tests-secret-host-tests-secret",
        Duration::from_secs(600),
    ))
}

async fn whoami(who: Identity) -> ApiResult {
    Ok(response::ok_json(serde_json::json!({ "role": who.role })))
}

async fn missing() -> ApiResult {
    Err(problem::not_found("Note not found"))
}

struct Section(serde_json::Value);

impl ConfigProvider for Section {
    fn get_module_config(&self, _module_name: &str) -> Option<&serde_json::Value> {
        Some(&self.0)
    }
}

fn ctx(codec: Arc<TokenCodec>, env: Environment) -> ModuleCtx {
    let hub = Arc::new(ClientHub::new());
    hub.register::<TokenCodec>(codec);
    ModuleCtxBuilder::new(CancellationToken::new())
        .with_client_hub(hub)
        .with_config_provider(Arc::new(Section(
            serde_json::json!({ "bind_addr": "127.0.0.1:0" }),
        )))
        .with_environment(env)
        .for_module("api_ingress")
        .build()
}

async fn app(codec: Arc<TokenCodec>, env: Environment) -> (Arc<ApiIngress>, Router) {
    let host = Arc::new(ApiIngress::default());
    let ctx = ctx(codec, env);
    host.init(&ctx).await.unwrap();

    let router = host.rest_prepare(&ctx, Router::new()).unwrap();
    let registry: &dyn OpenApiRegistry = host.as_ref();
    let router = OperationBuilder::get("/api/me")
        .operation_id("test.me")
        .tag("Test")
        .require_auth()
        .handler(whoami)
        .json_response(200, "Caller")
        .standard_errors(registry)
        .register(router, registry);
    let router = OperationBuilder::get("/api/missing")
        .operation_id("test.missing")
        .handler(missing)
        .json_response(200, "Never")
        .problem_response(registry, 404, "Not found")
        .register(router, registry);
    let router = host.rest_finalize(&ctx, router).unwrap();
    (host, router)
}

async fn get(router: Router, uri: &str, token: Option<&str>) -> (u16, serde_json::Value) {
    let mut req = Request::builder().uri(uri);
    if let Some(t) = token {
        req = req.header("authorization", format!("Bearer {t}"));
    }
    let resp = router.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
    let status = resp.status().as_u16();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or_default())
}

#[tokio::test]
async fn health_reports_environment_and_missing_database() {
    let (_, router) = app(codec(), Environment::Development).await;
    let (status, body) = get(router, "/health", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "disconnected");
    assert_eq!(body["environment"], "development");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn bearer_routes_see_the_installed_codec() {
    let c = codec();
    let token = c.issue(uuid::Uuid::new_v4(), Role::Organizer).unwrap().token;
    let (_, router) = app(c, Environment::Development).await;

    let (status, body) = get(router.clone(), "/api/me", Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["role"], "organizer");

    let (status, body) = get(router, "/api/me", None).await;
    assert_eq!(status, 401);
    assert_eq!(body["message"], "Not authorized, no token");
    assert_eq!(body["instance"], "/api/me");
}

#[tokio::test]
async fn problems_are_enriched_with_path() {
    let (_, router) = app(codec(), Environment::Production).await;
    let (status, body) = get(router, "/api/missing", None).await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Note not found");
    assert_eq!(body["instance"], "/api/missing");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn openapi_lists_registered_operations() {
    let (host, router) = app(codec(), Environment::Development).await;
    let (status, doc) = get(router, "/openapi.json", None).await;
    assert_eq!(status, 200);
    assert_eq!(doc["openapi"], "3.1.0");
    assert_eq!(doc["paths"]["/api/me"]["get"]["operationId"], "test.me");
    assert_eq!(
        doc["paths"]["/api/me"]["get"]["security"][0]["bearerAuth"],
        serde_json::json!([])
    );
    assert!(doc["components"]["schemas"]["Problem"].is_object());
    assert!(doc["paths"]["/api/missing"]["get"].get("security").is_none());

    assert!(host.router().is_some());
}

#[tokio::test]
async fn init_requires_a_token_codec() {
    let host = ApiIngress::default();
    let ctx = ModuleCtxBuilder::new(CancellationToken::new())
        .for_module("api_ingress")
        .build();
    assert!(host.init(&ctx).await.is_err());
}

#[tokio::test]
async fn serves_until_cancelled() {
    use modkit::contracts::StatefulModule;

    let host = Arc::new(ApiIngress::default());
    let c = ctx(codec(), Environment::Development);
    host.init(&c).await.unwrap();
    assert_eq!(host.get_config().bind_addr, "127.0.0.1:0");
    let router = host.rest_prepare(&c, Router::new()).unwrap();
    host.rest_finalize(&c, router).unwrap();

    let cancel = CancellationToken::new();
    host.start(cancel.clone()).await.unwrap();
    cancel.cancel();
    host.stop(cancel).await.unwrap();
}
