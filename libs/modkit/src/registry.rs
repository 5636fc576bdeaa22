//! Module registry: capability tables keyed by module name, topo-sorted by
//! declared dependencies, and the ordered lifecycle phases that drive them.
//!
//! The binary fills a [`RegistryBuilder`] explicitly:
//!
//! ```rust,ignore
//! let mut b = RegistryBuilder::default();
//! b.register_core("identity", &[], identity.clone());
//! b.register_db("identity", identity.clone());
//! b.register_rest("identity", identity);
//! let registry = b.build_topo_sorted()?;
//! ```

use axum::Router;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use thiserror::Error;

use crate::context;
use crate::contracts;

type RestHostEntry = (&'static str, Arc<dyn contracts::RestHostModule>);

pub struct ModuleEntry {
    pub name: &'static str,
    pub deps: &'static [&'static str],
    pub core: Arc<dyn contracts::Module>,
    pub rest: Option<Arc<dyn contracts::RestfulModule>>,
    pub rest_host: Option<Arc<dyn contracts::RestHostModule>>,
    pub db: Option<Arc<dyn contracts::DbModule>>,
    pub stateful: Option<Arc<dyn contracts::StatefulModule>>,
}

impl std::fmt::Debug for ModuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleEntry")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .field("has_rest", &self.rest.is_some())
            .field("is_rest_host", &self.rest_host.is_some())
            .field("has_db", &self.db.is_some())
            .field("has_stateful", &self.stateful.is_some())
            .finish()
    }
}

/// The final, topo-sorted runtime registry.
pub struct ModuleRegistry {
    modules: Vec<ModuleEntry>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&'static str> = self.modules.iter().map(|m| m.name).collect();
        f.debug_struct("ModuleRegistry")
            .field("modules", &names)
            .finish()
    }
}

impl ModuleRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn modules(&self) -> &[ModuleEntry] {
        &self.modules
    }

    // Ordered phases: init → DB → REST (sync) → start → stop

    pub async fn run_init_phase(&self, base_ctx: &context::ModuleCtx) -> Result<(), RegistryError> {
        for e in &self.modules {
            let ctx = base_ctx.clone().for_module(e.name);
            tracing::debug!(module = e.name, "init");
            e.core
                .init(&ctx)
                .await
                .map_err(|source| RegistryError::Init {
                    module: e.name,
                    source,
                })?;
        }
        Ok(())
    }

    pub async fn run_db_phase(&self, db: &modkit_db::DbHandle) -> Result<(), RegistryError> {
        for e in &self.modules {
            if let Some(dbm) = &e.db {
                tracing::debug!(module = e.name, "migrate");
                dbm.migrate(db)
                    .await
                    .map_err(|source| RegistryError::DbMigrate {
                        module: e.name,
                        source,
                    })?;
            }
        }
        Ok(())
    }

    /// Host prepare → every REST provider in topo order → host finalize.
    pub fn run_rest_phase(
        &self,
        base_ctx: &context::ModuleCtx,
        mut router: Router,
    ) -> Result<Router, RegistryError> {
        let mut hosts = self.modules.iter().filter(|e| e.rest_host.is_some());
        let host_entry = match (hosts.next(), hosts.next()) {
            (None, _) => {
                return if self.modules.iter().any(|e| e.rest.is_some()) {
                    Err(RegistryError::RestRequiresHost)
                } else {
                    Ok(router)
                };
            }
            (Some(h), None) => h,
            (Some(_), Some(_)) => return Err(RegistryError::MultipleRestHosts),
        };
        let Some(host) = host_entry.rest_host.as_ref() else {
            return Err(RegistryError::RestRequiresHost);
        };
        let host_ctx = base_ctx.clone().for_module(host_entry.name);
        let registry: &dyn contracts::OpenApiRegistry = host.as_registry();

        router = host
            .rest_prepare(&host_ctx, router)
            .map_err(|source| RegistryError::RestPrepare {
                module: host_entry.name,
                source,
            })?;

        for e in &self.modules {
            if let Some(rest) = &e.rest {
                let ctx = base_ctx.clone().for_module(e.name);
                router = rest
                    .register_rest(&ctx, router, registry)
                    .map_err(|source| RegistryError::RestRegister {
                        module: e.name,
                        source,
                    })?;
            }
        }

        router = host.rest_finalize(&host_ctx, router).map_err(|source| {
            RegistryError::RestFinalize {
                module: host_entry.name,
                source,
            }
        })?;

        Ok(router)
    }

    pub async fn run_start_phase(&self, cancel: CancellationToken) -> Result<(), RegistryError> {
        for e in &self.modules {
            if let Some(s) = &e.stateful {
                s.start(cancel.clone())
                    .await
                    .map_err(|source| RegistryError::Start {
                        module: e.name,
                        source,
                    })?;
            }
        }
        Ok(())
    }

    /// Reverse topo order; failures are logged and do not stop the sweep.
    pub async fn run_stop_phase(&self, cancel: CancellationToken) {
        for e in self.modules.iter().rev() {
            if let Some(s) = &e.stateful {
                if let Err(err) = s.stop(cancel.clone()).await {
                    tracing::warn!(module = e.name, error = %err, "Failed to stop module");
                }
            }
        }
    }

    pub fn get_module(&self, name: &str) -> Option<Arc<dyn contracts::Module>> {
        self.modules
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.core.clone())
    }
}

/// Collects modules and their capabilities; uniqueness and references are
/// validated in [`RegistryBuilder::build_topo_sorted`].
#[derive(Default)]
pub struct RegistryBuilder {
    core: HashMap<&'static str, Arc<dyn contracts::Module>>,
    deps: HashMap<&'static str, &'static [&'static str]>,
    rest: HashMap<&'static str, Arc<dyn contracts::RestfulModule>>,
    rest_host: Option<RestHostEntry>,
    db: HashMap<&'static str, Arc<dyn contracts::DbModule>>,
    stateful: HashMap<&'static str, Arc<dyn contracts::StatefulModule>>,
    errors: Vec<String>,
}

impl RegistryBuilder {
    pub fn register_core(
        &mut self,
        name: &'static str,
        deps: &'static [&'static str],
        m: Arc<dyn contracts::Module>,
    ) -> &mut Self {
        if self.core.contains_key(name) {
            self.errors
                .push(format!("Module '{name}' is already registered"));
            return self;
        }
        self.core.insert(name, m);
        self.deps.insert(name, deps);
        self
    }

    pub fn register_rest(
        &mut self,
        name: &'static str,
        m: Arc<dyn contracts::RestfulModule>,
    ) -> &mut Self {
        self.rest.insert(name, m);
        self
    }

    pub fn register_rest_host(
        &mut self,
        name: &'static str,
        m: Arc<dyn contracts::RestHostModule>,
    ) -> &mut Self {
        if let Some((existing, _)) = &self.rest_host {
            self.errors.push(format!(
                "Multiple REST host modules detected: '{existing}' and '{name}'"
            ));
            return self;
        }
        self.rest_host = Some((name, m));
        self
    }

    pub fn register_db(&mut self, name: &'static str, m: Arc<dyn contracts::DbModule>) -> &mut Self {
        self.db.insert(name, m);
        self
    }

    pub fn register_stateful(
        &mut self,
        name: &'static str,
        m: Arc<dyn contracts::StatefulModule>,
    ) -> &mut Self {
        self.stateful.insert(name, m);
        self
    }

    /// DFS with a gray/black coloring; returns the cycle path, closed on its first node.
    fn detect_cycle_with_path(
        names: &[&'static str],
        adj: &[Vec<usize>],
    ) -> Option<Vec<&'static str>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        fn dfs(
            node: usize,
            names: &[&'static str],
            adj: &[Vec<usize>],
            colors: &mut [Color],
            path: &mut Vec<usize>,
        ) -> Option<Vec<&'static str>> {
            colors[node] = Color::Gray;
            path.push(node);

            for &next in &adj[node] {
                match colors[next] {
                    Color::Gray => {
                        if let Some(start) = path.iter().position(|&n| n == next) {
                            let mut cycle: Vec<&'static str> =
                                path[start..].iter().map(|&i| names[i]).collect();
                            cycle.push(names[next]);
                            return Some(cycle);
                        }
                    }
                    Color::White => {
                        if let Some(cycle) = dfs(next, names, adj, colors, path) {
                            return Some(cycle);
                        }
                    }
                    Color::Black => {}
                }
            }

            path.pop();
            colors[node] = Color::Black;
            None
        }

        let mut colors = vec![Color::White; names.len()];
        let mut path = Vec::new();
        for i in 0..names.len() {
            if colors[i] == Color::White {
                if let Some(cycle) = dfs(i, names, adj, &mut colors, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn ensure_known<'a>(
        &self,
        names: impl Iterator<Item = &'a &'static str>,
    ) -> Result<(), RegistryError> {
        for n in names {
            if !self.core.contains_key(n) {
                return Err(RegistryError::UnknownModule((*n).to_string()));
            }
        }
        Ok(())
    }

    /// Validate, detect cycles and order modules so dependencies come first.
    /// Ties are broken by name so the order is stable across runs.
    pub fn build_topo_sorted(self) -> Result<ModuleRegistry, RegistryError> {
        if !self.errors.is_empty() {
            return Err(RegistryError::InvalidRegistryConfiguration {
                errors: self.errors,
            });
        }

        self.ensure_known(self.rest.keys())?;
        self.ensure_known(self.db.keys())?;
        self.ensure_known(self.stateful.keys())?;
        self.ensure_known(self.rest_host.iter().map(|(n, _)| n))?;

        let mut names: Vec<&'static str> = self.core.keys().copied().collect();
        names.sort_unstable();
        let idx: HashMap<&'static str, usize> =
            names.iter().enumerate().map(|(i, &n)| (n, i)).collect();

        // edge dep -> module
        let mut adj = vec![Vec::<usize>::new(); names.len()];
        for (u, &n) in names.iter().enumerate() {
            let deps = self.deps.get(n).copied().unwrap_or(&[]);
            for &d in deps {
                let v = *idx.get(d).ok_or_else(|| RegistryError::UnknownDependency {
                    module: n.to_string(),
                    depends_on: d.to_string(),
                })?;
                adj[v].push(u);
            }
        }

        if let Some(path) = Self::detect_cycle_with_path(&names, &adj) {
            return Err(RegistryError::CycleDetected { path });
        }

        // Kahn
        let mut indeg = vec![0usize; names.len()];
        for targets in &adj {
            for &t in targets {
                indeg[t] += 1;
            }
        }
        let mut q: VecDeque<usize> = (0..names.len()).filter(|&i| indeg[i] == 0).collect();
        let mut order = Vec::with_capacity(names.len());
        while let Some(u) = q.pop_front() {
            order.push(u);
            for &w in &adj[u] {
                indeg[w] -= 1;
                if indeg[w] == 0 {
                    q.push_back(w);
                }
            }
        }

        let mut entries = Vec::with_capacity(order.len());
        for i in order {
            let name = names[i];
            let core = self
                .core
                .get(name)
                .cloned()
                .ok_or_else(|| RegistryError::UnknownModule(name.to_string()))?;
            entries.push(ModuleEntry {
                name,
                deps: self.deps.get(name).copied().unwrap_or(&[]),
                core,
                rest: self.rest.get(name).cloned(),
                rest_host: self
                    .rest_host
                    .as_ref()
                    .filter(|(host, _)| *host == name)
                    .map(|(_, m)| m.clone()),
                db: self.db.get(name).cloned(),
                stateful: self.stateful.get(name).cloned(),
            });
        }

        tracing::info!(
            modules = ?entries.iter().map(|e| e.name).collect::<Vec<_>>(),
            "Module dependency order resolved (topo)"
        );

        Ok(ModuleRegistry { modules: entries })
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("initialization failed for module '{module}'")]
    Init {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("start failed for '{module}'")]
    Start {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("DB migration failed for module '{module}'")]
    DbMigrate {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST prepare failed for host module '{module}'")]
    RestPrepare {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST registration failed for module '{module}'")]
    RestRegister {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST finalize failed for host module '{module}'")]
    RestFinalize {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("modules with REST routes found, but no REST host module is registered")]
    RestRequiresHost,
    #[error("multiple REST host modules detected; exactly one is allowed")]
    MultipleRestHosts,

    #[error("unknown module '{0}'")]
    UnknownModule(String),
    #[error("module '{module}' depends on unknown '{depends_on}'")]
    UnknownDependency { module: String, depends_on: String },
    #[error("cyclic dependency detected: {}", path.join(" -> "))]
    CycleDetected { path: Vec<&'static str> },
    #[error("invalid registry configuration:\n{errors:#?}")]
    InvalidRegistryConfiguration { errors: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::OpenApiRegistry;
    use crate::context::{ModuleCtx, ModuleCtxBuilder};
    use parking_lot::Mutex;

    type Calls = Arc<Mutex<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        calls: Calls,
    }

    #[async_trait::async_trait]
    impl contracts::Module for Recorder {
        async fn init(&self, _ctx: &ModuleCtx) -> anyhow::Result<()> {
            self.calls.lock().push(format!("{}.init", self.name));
            Ok(())
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    impl contracts::RestfulModule for Recorder {
        fn register_rest(
            &self,
            _ctx: &ModuleCtx,
            router: Router,
            _openapi: &dyn OpenApiRegistry,
        ) -> anyhow::Result<Router> {
            self.calls.lock().push(format!("{}.rest", self.name));
            Ok(router.route("/ping", axum::routing::get(|| async { "pong" })))
        }
    }

    #[async_trait::async_trait]
    impl contracts::StatefulModule for Recorder {
        async fn start(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
            self.calls.lock().push(format!("{}.start", self.name));
            Ok(())
        }
        async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
            self.calls.lock().push(format!("{}.stop", self.name));
            Ok(())
        }
    }

    struct NoopRegistry;
    impl OpenApiRegistry for NoopRegistry {
        fn register_operation(&self, _spec: &crate::api::OperationSpec) {}
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

    struct Host {
        reg: NoopRegistry,
        calls: Calls,
    }

    impl contracts::RestHostModule for Host {
        fn rest_prepare(&self, _ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router> {
            self.calls.lock().push("host.prepare".into());
            Ok(router)
        }
        fn rest_finalize(&self, _ctx: &ModuleCtx, router: Router) -> anyhow::Result<Router> {
            self.calls.lock().push("host.finalize".into());
            Ok(router)
        }
        fn as_registry(&self) -> &dyn OpenApiRegistry {
            &self.reg
        }
    }

    fn recorder(name: &'static str, calls: &Calls) -> Arc<Recorder> {
        Arc::new(Recorder {
            name,
            calls: calls.clone(),
        })
    }

    fn order(reg: &ModuleRegistry) -> Vec<&'static str> {
        reg.modules().iter().map(|m| m.name).collect()
    }

    #[test]
    fn dependencies_come_first() {
        let calls = Calls::default();
        let mut b = RegistryBuilder::default();
        b.register_core("opportunities", &["identity", "notifications"], recorder("o", &calls))
            .register_core("notifications", &[], recorder("n", &calls))
            .register_core("identity", &[], recorder("i", &calls));

        let reg = b.build_topo_sorted().unwrap();
        assert_eq!(order(&reg), vec!["identity", "notifications", "opportunities"]);
    }

    #[test]
    fn unknown_dependency_is_reported() {
        let calls = Calls::default();
        let mut b = RegistryBuilder::default();
        b.register_core("events", &["identity"], recorder("e", &calls));

        match b.build_topo_sorted().unwrap_err() {
            RegistryError::UnknownDependency { module, depends_on } => {
                assert_eq!(module, "events");
                assert_eq!(depends_on, "identity");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn cycle_path_is_reported() {
        let calls = Calls::default();
        let mut b = RegistryBuilder::default();
        b.register_core("a", &["b"], recorder("a", &calls))
            .register_core("b", &["c"], recorder("b", &calls))
            .register_core("c", &["a"], recorder("c", &calls))
            .register_core("d", &[], recorder("d", &calls));

        match b.build_topo_sorted().unwrap_err() {
            RegistryError::CycleDetected { path } => {
                for n in ["a", "b", "c"] {
                    assert!(path.contains(&n));
                }
                assert!(!path.contains(&"d"));
                assert_eq!(path.first(), path.last());
            }
            other => panic!("expected CycleDetected, got: {other:?}"),
        }
    }

    #[test]
    fn duplicate_core_and_capability_without_core() {
        let calls = Calls::default();
        let mut b = RegistryBuilder::default();
        b.register_core("a", &[], recorder("a", &calls))
            .register_core("a", &[], recorder("a", &calls));
        match b.build_topo_sorted().unwrap_err() {
            RegistryError::InvalidRegistryConfiguration { errors } => {
                assert!(errors.iter().any(|e| e.contains("already registered")));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let mut b = RegistryBuilder::default();
        b.register_rest("ghost", recorder("ghost", &calls));
        assert!(matches!(
            b.build_topo_sorted().unwrap_err(),
            RegistryError::UnknownModule(name) if name == "ghost"
        ));
    }

    #[test]
    fn rest_without_host_fails() {
        let calls = Calls::default();
        let svc = recorder("svc", &calls);
        let mut b = RegistryBuilder::default();
        b.register_core("svc", &[], svc.clone()).register_rest("svc", svc);
        let reg = b.build_topo_sorted().unwrap();

        let ctx = ModuleCtxBuilder::new(CancellationToken::new()).build();
        assert!(matches!(
            reg.run_rest_phase(&ctx, Router::new()),
            Err(RegistryError::RestRequiresHost)
        ));
    }

    #[tokio::test]
    async fn phases_run_in_order() {
        let calls = Calls::default();
        let host = Arc::new(Host {
            reg: NoopRegistry,
            calls: calls.clone(),
        });
        let svc = recorder("svc", &calls);
        let dep = recorder("dep", &calls);

        let mut b = RegistryBuilder::default();
        b.register_core("api_ingress", &[], recorder("api_ingress", &calls))
            .register_rest_host("api_ingress", host)
            .register_core("svc", &["dep"], svc.clone())
            .register_rest("svc", svc.clone())
            .register_stateful("svc", svc)
            .register_core("dep", &[], dep.clone())
            .register_stateful("dep", dep);
        let reg = b.build_topo_sorted().unwrap();

        let ctx = ModuleCtxBuilder::new(CancellationToken::new()).build();
        reg.run_init_phase(&ctx).await.unwrap();
        reg.run_rest_phase(&ctx, Router::new()).unwrap();
        let cancel = CancellationToken::new();
        reg.run_start_phase(cancel.clone()).await.unwrap();
        reg.run_stop_phase(cancel).await;

        let got = calls.lock().clone();
        assert_eq!(
            got,
            vec![
                "api_ingress.init",
                "dep.init",
                "svc.init",
                "host.prepare",
                "svc.rest",
                "host.finalize",
                "dep.start",
                "svc.start",
                "svc.stop",
                "dep.stop",
            ]
        );
    }
}
