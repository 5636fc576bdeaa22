use anyhow::{anyhow, Context};
use runtime::Environment;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::client_hub::ClientHub;

/// Provider of module-specific configuration (raw JSON sections only).
pub trait ConfigProvider: Send + Sync {
    /// Returns raw JSON section for the module, if any.
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value>;
}

impl ConfigProvider for runtime::AppConfigProvider {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        runtime::AppConfigProvider::get_module_config(self, module_name)
    }
}

/// Per-module view of the process: storage handle, config, clients and the
/// shutdown token. Cheap to clone.
#[derive(Clone)]
pub struct ModuleCtx {
    pub(crate) db: Option<Arc<modkit_db::DbHandle>>,
    pub(crate) config_provider: Option<Arc<dyn ConfigProvider>>,
    pub(crate) client_hub: Arc<ClientHub>,
    pub(crate) cancellation_token: CancellationToken,
    pub(crate) environment: Environment,
    pub(crate) module_name: Option<Arc<str>>,
}

pub struct ModuleCtxBuilder {
    inner: ModuleCtx,
}

impl ModuleCtxBuilder {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            inner: ModuleCtx {
                db: None,
                config_provider: None,
                client_hub: Arc::new(ClientHub::default()),
                cancellation_token: token,
                environment: Environment::default(),
                module_name: None,
            },
        }
    }

    pub fn with_db(mut self, db: Arc<modkit_db::DbHandle>) -> Self {
        self.inner.db = Some(db);
        self
    }

    pub fn with_config_provider(mut self, p: Arc<dyn ConfigProvider>) -> Self {
        self.inner.config_provider = Some(p);
        self
    }

    pub fn with_client_hub(mut self, hub: Arc<ClientHub>) -> Self {
        self.inner.client_hub = hub;
        self
    }

    pub fn with_environment(mut self, env: Environment) -> Self {
        self.inner.environment = env;
        self
    }

    /// Scope the context to a module up front (tests drive a single module).
    pub fn for_module(mut self, name: &str) -> Self {
        self.inner.module_name = Some(Arc::<str>::from(name));
        self
    }

    pub fn build(self) -> ModuleCtx {
        self.inner
    }
}

impl ModuleCtx {
    /// Scope context to a specific module name (used by the registry).
    pub(crate) fn for_module(mut self, name: &str) -> Self {
        self.module_name = Some(Arc::<str>::from(name));
        self
    }

    pub fn db(&self) -> Option<Arc<modkit_db::DbHandle>> {
        self.db.clone()
    }

    /// Storage handle, or an error naming the module that needed it.
    pub fn db_required(&self) -> anyhow::Result<Arc<modkit_db::DbHandle>> {
        self.db.clone().ok_or_else(|| {
            anyhow!(
                "module '{}' requires a database but none is configured",
                self.current_module().unwrap_or("?")
            )
        })
    }

    pub fn client_hub(&self) -> Arc<ClientHub> {
        self.client_hub.clone()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation_token
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn current_module(&self) -> Option<&str> {
        self.module_name.as_deref()
    }

    /// Typed module config. A missing section yields `T::default()`;
    /// a present but malformed section is an error.
    pub fn module_config<T: DeserializeOwned + Default>(&self) -> anyhow::Result<T> {
        let (Some(name), Some(p)) = (&self.module_name, &self.config_provider) else {
            return Ok(T::default());
        };
        match p.get_module_config(name) {
            None => Ok(T::default()),
            Some(raw) => serde_json::from_value::<T>(raw.clone())
                .with_context(|| format!("invalid '{name}' module config")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(deny_unknown_fields, default)]
    struct SampleCfg {
        page_size: u32,
    }

    struct MapProvider(HashMap<String, serde_json::Value>);

    impl ConfigProvider for MapProvider {
        fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
            self.0.get(module_name)
        }
    }

    fn ctx_with(section: Option<serde_json::Value>) -> ModuleCtx {
        let mut map = HashMap::new();
        if let Some(v) = section {
            map.insert("notes".to_string(), v);
        }
        ModuleCtxBuilder::new(CancellationToken::new())
            .with_config_provider(Arc::new(MapProvider(map)))
            .build()
            .for_module("notes")
    }

    #[test]
    fn missing_section_falls_back_to_default() {
        let cfg: SampleCfg = ctx_with(None).module_config().unwrap();
        assert_eq!(cfg, SampleCfg::default());
    }

    #[test]
    fn present_section_is_parsed() {
        let cfg: SampleCfg = ctx_with(Some(serde_json::json!({"page_size": 7})))
            .module_config()
            .unwrap();
        assert_eq!(cfg.page_size, 7);
    }

    #[test]
    fn malformed_section_is_an_error() {
        let err = ctx_with(Some(serde_json::json!({"pagesize": 7})))
            .module_config::<SampleCfg>()
            .unwrap_err();
        assert!(err.to_string().contains("notes"));
    }

    #[test]
    fn db_required_names_the_module() {
        let err = ctx_with(None).db_required().unwrap_err();
        assert!(err.to_string().contains("notes"));
    }
}
