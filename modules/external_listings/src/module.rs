use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use identity::contract::IdentityApi;
use modkit::api::OpenApiRegistry;
use modkit::{DbModule, Module, ModuleCtx, RestfulModule};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::ExternalListingsConfig;
use crate::domain::catalog::Catalog;
use crate::domain::service::{Service, ServiceConfig};
use crate::infra::storage::{migrations::Migrator, SeaOrmInteractionsRepository};

/// Curated courses, internships and tech events, plus who looked at or signed up for them.
#[derive(Default)]
pub struct ExternalListingsModule {
    service: arc_swap::ArcSwapOption<Service>,
}

impl ExternalListingsModule {
    /// Catalog dates are resolved against the clock once, here.
    pub fn build_service(
        conn: sea_orm::DatabaseConnection,
        users: Arc<dyn IdentityApi>,
        cfg: &ExternalListingsConfig,
    ) -> anyhow::Result<Service> {
        let catalog = Catalog::load(Utc::now()).context("failed to load embedded catalog")?;
        Ok(Service::new(
            Arc::new(catalog),
            Arc::new(SeaOrmInteractionsRepository::new(conn)),
            users,
            ServiceConfig {
                default_limit: cfg.default_limit,
            },
        ))
    }
}

#[async_trait]
impl Module for ExternalListingsModule {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        info!("Initializing external_listings module");
        let cfg: ExternalListingsConfig = ctx.module_config()?;
        debug!(default_limit = cfg.default_limit, "loaded external_listings config");

        let db = ctx.db_required()?;
        let users = ctx
            .client_hub()
            .get::<dyn IdentityApi>()
            .context("IdentityApi is not registered")?;
        let service = Self::build_service(db.sea(), users, &cfg)?;
        self.service.store(Some(Arc::new(service)));
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait]
impl DbModule for ExternalListingsModule {
    async fn migrate(&self, db: &modkit_db::DbHandle) -> anyhow::Result<()> {
        info!("Running external_listings database migrations");
        Migrator::up(db.seaorm(), None)
            .await
            .context("external_listings migrations failed")?;
        Ok(())
    }
}

impl RestfulModule for ExternalListingsModule {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: axum::Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<axum::Router> {
        let service = self
            .service
            .load_full()
            .context("external_listings service not initialized")?;
        let router = routes::register_routes(router, openapi, service)?;
        info!("External listings REST routes registered");
        Ok(router)
    }
}
