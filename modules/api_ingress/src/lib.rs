//! REST host: owns the HTTP server, the global middleware stack and the single
//! OpenAPI document every module contributes operations to.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use arc_swap::{ArcSwap, ArcSwapOption};
use async_trait::async_trait;
use axum::http::Method;
use axum::{
    http::header,
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::get,
    Extension, Router,
};
use dashmap::DashMap;
use modkit::api::{OpenApiRegistry, OperationSpec, SchemaCollection};
use modkit::{ModuleCtx, TokenCodec};
use modkit_db::DbHandle;
use parking_lot::Mutex;
use runtime::Environment;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod error_layer;
pub mod openapi;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;
use openapi::ComponentsRegistry;

const STOP_TIMEOUT: Duration = Duration::from_secs(30);

/// Process-wide pieces the host picks up during init.
struct Wiring {
    codec: Arc<TokenCodec>,
    db: Option<Arc<DbHandle>>,
    environment: Environment,
}

pub struct ApiIngress {
    config: ArcSwap<ApiIngressConfig>,
    wiring: ArcSwapOption<Wiring>,
    components_registry: ArcSwap<ComponentsRegistry>,
    final_router: Mutex<Option<Router>>,
    server: Mutex<Option<JoinHandle<Result<()>>>>,

    // Duplicate detection (per (method, path) and per handler id)
    registered_routes: DashMap<(Method, String), ()>,
    registered_handlers: DashMap<String, ()>,
    operation_specs: DashMap<String, OperationSpec>,
}

impl Default for ApiIngress {
    fn default() -> Self {
        Self::new(ApiIngressConfig::default())
    }
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            wiring: ArcSwapOption::empty(),
            components_registry: ArcSwap::from_pointee(ComponentsRegistry::default()),
            final_router: Mutex::new(None),
            server: Mutex::new(None),
            registered_routes: DashMap::new(),
            registered_handlers: DashMap::new(),
            operation_specs: DashMap::new(),
        }
    }

    pub fn get_config(&self) -> ApiIngressConfig {
        (**self.config.load()).clone()
    }

    fn wiring(&self) -> Result<Arc<Wiring>> {
        self.wiring
            .load_full()
            .context("api_ingress used before init")
    }

    /// OpenAPI document for everything registered so far.
    pub fn build_openapi(&self) -> Result<openapi::OpenApi> {
        let components = self.components_registry.load();
        let specs: Vec<OperationSpec> = self
            .operation_specs
            .iter()
            .map(|e| e.value().clone())
            .collect();
        tracing::info!(operations = specs.len(), "building OpenAPI document");
        openapi::build(&components, &specs)
    }

    /// Final router as produced by the REST phase, if it ran.
    pub fn router(&self) -> Option<Router> {
        self.final_router.lock().clone()
    }

    fn apply_middleware(&self, router: Router, wiring: &Wiring) -> Router {
        let cfg = self.get_config();
        let x_request_id = request_id::header();

        // Innermost first: the last layer added sees the request first.
        let mut router = router
            .layer(from_fn_with_state(
                wiring.environment,
                error_layer::finalize_problem,
            ))
            .layer(Extension(wiring.codec.clone()))
            .layer(RequestBodyLimitLayer::new(cfg.body_limit_bytes));
        if cfg.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }
        router
            .layer(TimeoutLayer::new(Duration::from_secs(cfg.request_timeout_secs)))
            .layer(request_id::create_trace_layer())
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId))
    }
}

#[async_trait]
impl modkit::Module for ApiIngress {
    async fn init(&self, ctx: &ModuleCtx) -> Result<()> {
        let cfg: ApiIngressConfig = ctx.module_config()?;
        self.config.store(Arc::new(cfg));

        let codec = ctx
            .client_hub()
            .get::<TokenCodec>()
            .context("token codec must be registered before api_ingress init")?;
        self.wiring.store(Some(Arc::new(Wiring {
            codec,
            db: ctx.db(),
            environment: ctx.environment(),
        })));
        tracing::debug!(bind_addr = %self.get_config().bind_addr, "api_ingress initialized");
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl modkit::contracts::RestHostModule for ApiIngress {
    fn rest_prepare(&self, _ctx: &ModuleCtx, router: Router) -> Result<Router> {
        let wiring = self.wiring()?;
        let health = web::HealthState {
            db: wiring.db.clone(),
            environment: wiring.environment,
        };
        tracing::debug!("REST host prepared base router with health check");
        Ok(router.route("/health", get(web::health_check).with_state(health)))
    }

    fn rest_finalize(&self, _ctx: &ModuleCtx, mut router: Router) -> Result<Router> {
        let config = self.get_config();
        let wiring = self.wiring()?;

        let doc = Arc::new(serde_json::to_value(self.build_openapi()?)?);
        router = router.route(
            "/openapi.json",
            get(move || {
                let doc = doc.clone();
                async move {
                    (
                        [(header::CACHE_CONTROL, "no-store")],
                        axum::Json((*doc).clone()),
                    )
                        .into_response()
                }
            }),
        );
        if config.enable_docs {
            router = router.route("/docs", get(web::serve_docs));
        }

        let router = self.apply_middleware(router, &wiring);
        *self.final_router.lock() = Some(router.clone());
        tracing::debug!("REST host finalized router");
        Ok(router)
    }

    fn as_registry(&self) -> &dyn OpenApiRegistry {
        self
    }
}

#[async_trait]
impl modkit::contracts::StatefulModule for ApiIngress {
    async fn start(&self, cancel: CancellationToken) -> Result<()> {
        let cfg = self.get_config();
        let addr: SocketAddr = cfg
            .bind_addr
            .parse()
            .with_context(|| format!("invalid bind address '{}'", cfg.bind_addr))?;
        let router = self
            .final_router
            .lock()
            .take()
            .context("REST phase did not produce a router")?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        tracing::info!(%addr, "HTTP server listening");

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel.cancelled().await;
                    tracing::info!("HTTP server shutting down gracefully");
                })
                .await
                .map_err(anyhow::Error::from)
        });
        *self.server.lock() = Some(handle);
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> Result<()> {
        let Some(handle) = self.server.lock().take() else {
            return Ok(());
        };
        match tokio::time::timeout(STOP_TIMEOUT, handle).await {
            Ok(joined) => joined.context("HTTP server task panicked")?,
            Err(_) => anyhow::bail!("HTTP server did not stop within {STOP_TIMEOUT:?}"),
        }
    }
}

impl OpenApiRegistry for ApiIngress {
    fn register_operation(&self, spec: &OperationSpec) {
        if self
            .registered_handlers
            .insert(spec.handler_id.clone(), ())
            .is_some()
        {
            tracing::error!(
                handler_id = %spec.handler_id,
                method = %spec.method,
                path = %spec.path,
                "duplicate handler_id; ignoring subsequent registration"
            );
            return;
        }
        if self
            .registered_routes
            .insert((spec.method.clone(), spec.path.clone()), ())
            .is_some()
        {
            tracing::error!(
                method = %spec.method,
                path = %spec.path,
                "duplicate (method, path); ignoring subsequent registration"
            );
            return;
        }

        let key = format!("{}:{}", spec.method, spec.path);
        self.operation_specs.insert(key, spec.clone());
        tracing::debug!(
            handler_id = %spec.handler_id,
            method = %spec.method,
            path = %spec.path,
            total_operations = self.operation_specs.len(),
            "registered API operation"
        );
    }

    fn ensure_schema_raw(&self, name: &str, schemas: SchemaCollection) -> String {
        // Copy-on-write; first registration of a name wins.
        let current = self.components_registry.load();
        let mut reg = (**current).clone();
        let mut changed = false;
        for (key, schema) in schemas {
            if let Some(existing) = reg.schemas.get(&key) {
                let same = serde_json::to_value(existing).ok() == serde_json::to_value(&schema).ok();
                if !same {
                    tracing::warn!(%key, "conflicting schema under the same component name; keeping the first");
                }
                continue;
            }
            reg.schemas.insert(key, schema);
            changed = true;
        }
        if changed {
            self.components_registry.store(Arc::new(reg));
        }
        name.to_string()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
