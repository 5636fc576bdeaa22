//! Runner orchestration: phase order, storage wiring, config delivery and
//! failure propagation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use modkit::{
    api::{OpenApiRegistry, OperationSpec},
    context::{ConfigProvider, ModuleCtx},
    contracts::{DbModule, Module, RestHostModule, RestfulModule, StatefulModule},
    registry::RegistryBuilder,
    runtime::{run, DbOptions, RunOptions, ShutdownOptions},
    ClientHub,
};
use modkit_db::{ConnectOpts, DbHandle};
use runtime::Environment;
use serde::Deserialize;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

type Calls = Arc<Mutex<Vec<String>>>;

struct MapConfig(HashMap<String, serde_json::Value>);

impl ConfigProvider for MapConfig {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.0.get(module_name)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WidgetCfg {
    greeting: String,
}

struct Widget {
    calls: Calls,
    fail_init: bool,
}

#[async_trait::async_trait]
impl Module for Widget {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        let cfg: WidgetCfg = ctx.module_config()?;
        self.calls
            .lock()
            .unwrap()
            .push(format!("widget.init:{}:{}", cfg.greeting, ctx.db().is_some()));
        if self.fail_init {
            anyhow::bail!("widget refused to start");
        }
        Ok(())
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait::async_trait]
impl DbModule for Widget {
    async fn migrate(&self, db: &DbHandle) -> anyhow::Result<()> {
        assert!(db.ping().await);
        self.calls.lock().unwrap().push("widget.migrate".into());
        Ok(())
    }
}

impl RestfulModule for Widget {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: axum::Router,
        _openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<axum::Router> {
        self.calls.lock().unwrap().push("widget.rest".into());
        Ok(router)
    }
}

#[async_trait::async_trait]
impl StatefulModule for Widget {
    async fn start(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push("widget.start".into());
        Ok(())
    }
    async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push("widget.stop".into());
        Ok(())
    }
}

struct NoopRegistry;

impl OpenApiRegistry for NoopRegistry {
    fn register_operation(&self, _spec: &OperationSpec) {}
    fn ensure_schema_raw(
        &self,
        name: &str,
        _schemas: Vec<(
            String,
            utoipa::openapi::RefOr<utoipa::openapi::schema::Schema>,
        )>,
    ) -> String {
        name.to_string()
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

struct Host(NoopRegistry);

#[async_trait::async_trait]
impl Module for Host {
    async fn init(&self, _ctx: &ModuleCtx) -> anyhow::Result<()> {
        Ok(())
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl RestHostModule for Host {
    fn rest_prepare(&self, _ctx: &ModuleCtx, router: axum::Router) -> anyhow::Result<axum::Router> {
        Ok(router)
    }
    fn rest_finalize(&self, _ctx: &ModuleCtx, router: axum::Router) -> anyhow::Result<axum::Router> {
        Ok(router)
    }
    fn as_registry(&self) -> &dyn OpenApiRegistry {
        &self.0
    }
}

fn options(widget: Arc<Widget>, db: DbOptions, cancel: CancellationToken) -> RunOptions {
    let host = Arc::new(Host(NoopRegistry));
    let mut b = RegistryBuilder::default();
    b.register_core("api_ingress", &[], host.clone())
        .register_rest_host("api_ingress", host)
        .register_core("widget", &["api_ingress"], widget.clone())
        .register_db("widget", widget.clone())
        .register_rest("widget", widget.clone())
        .register_stateful("widget", widget);

    let mut cfg = HashMap::new();
    cfg.insert("widget".to_string(), serde_json::json!({"greeting": "hi"}));

    RunOptions {
        registry: b.build_topo_sorted().unwrap(),
        modules_cfg: Arc::new(MapConfig(cfg)),
        db,
        client_hub: Arc::new(ClientHub::new()),
        environment: Environment::Development,
        shutdown: ShutdownOptions::Token(cancel),
    }
}

#[tokio::test]
async fn full_cycle_with_database() {
    let calls = Calls::default();
    let widget = Arc::new(Widget {
        calls: calls.clone(),
        fail_init: false,
    });
    let db = Arc::new(
        DbHandle::connect("sqlite::memory:", ConnectOpts::default())
            .await
            .unwrap(),
    );

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(run(options(widget, DbOptions::Handle(db), cancel.clone())));

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            "widget.init:hi:true",
            "widget.migrate",
            "widget.rest",
            "widget.start",
            "widget.stop",
        ]
    );
}

#[tokio::test]
async fn without_database_the_migration_phase_is_skipped() {
    let calls = Calls::default();
    let widget = Arc::new(Widget {
        calls: calls.clone(),
        fail_init: false,
    });
    let cancel = CancellationToken::new();
    cancel.cancel();

    run(options(widget, DbOptions::None, cancel)).await.unwrap();

    let got = calls.lock().unwrap().clone();
    assert_eq!(got[0], "widget.init:hi:false");
    assert!(!got.iter().any(|c| c == "widget.migrate"));
}

#[tokio::test]
async fn init_failure_aborts_the_run() {
    let calls = Calls::default();
    let widget = Arc::new(Widget {
        calls: calls.clone(),
        fail_init: true,
    });

    let err = run(options(widget, DbOptions::None, CancellationToken::new()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("widget"));
    assert_eq!(calls.lock().unwrap().len(), 1);
}
