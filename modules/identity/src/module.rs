use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use modkit::api::OpenApiRegistry;
use modkit::{DbModule, Module, ModuleCtx, RestfulModule, TokenCodec};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::IdentityConfig;
use crate::contract::client::IdentityApi;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::IdentityLocalClient;
use crate::infra::storage::{migrations::Migrator, SeaOrmUsersRepository};

/// Accounts and sessions. Publishes [`IdentityApi`] to the client hub during init.
#[derive(Default)]
pub struct IdentityModule {
    service: arc_swap::ArcSwapOption<Service>,
}

impl IdentityModule {
    /// Service wired to the given connection, outside the module lifecycle.
    pub fn build_service(
        conn: sea_orm::DatabaseConnection,
        tokens: Arc<TokenCodec>,
        cfg: &IdentityConfig,
    ) -> anyhow::Result<Service> {
        cfg.validate()?;
        let repo = SeaOrmUsersRepository::new(conn);
        Ok(Service::new(
            Arc::new(repo),
            tokens,
            ServiceConfig {
                bcrypt_cost: cfg.bcrypt_cost,
                ..ServiceConfig::default()
            },
        ))
    }
}

#[async_trait]
impl Module for IdentityModule {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        info!("Initializing identity module");
        let cfg: IdentityConfig = ctx.module_config()?;
        debug!(bcrypt_cost = cfg.bcrypt_cost, "loaded identity config");

        let db = ctx.db_required()?;
        let tokens = ctx
            .client_hub()
            .get::<TokenCodec>()
            .context("token codec is not registered")?;
        let service = Arc::new(Self::build_service(db.sea(), tokens, &cfg)?);
        self.service.store(Some(service.clone()));

        let api: Arc<dyn IdentityApi> = Arc::new(IdentityLocalClient::new(service));
        ctx.client_hub().register::<dyn IdentityApi>(api);
        info!("IdentityApi exposed to ClientHub");
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait]
impl DbModule for IdentityModule {
    async fn migrate(&self, db: &modkit_db::DbHandle) -> anyhow::Result<()> {
        info!("Running identity database migrations");
        Migrator::up(db.seaorm(), None)
            .await
            .context("identity migrations failed")?;
        Ok(())
    }
}

impl RestfulModule for IdentityModule {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: axum::Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<axum::Router> {
        let service = self
            .service
            .load_full()
            .context("identity service not initialized")?;
        let router = routes::register_routes(router, openapi, service)?;
        info!("Identity REST routes registered");
        Ok(router)
    }
}
