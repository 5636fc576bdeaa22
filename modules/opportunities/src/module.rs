use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use identity::contract::IdentityApi;
use modkit::api::OpenApiRegistry;
use modkit::{DbModule, Module, ModuleCtx, RestfulModule};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::OpportunitiesConfig;
use crate::domain::lifecycle::Lifecycle;
use crate::domain::service::{Service, ServiceConfig};
use crate::infra::storage::{
    migrations::Migrator, SeaOrmApplicationsRepository, SeaOrmPostingsRepository,
};

struct Services {
    postings: Arc<Service>,
    lifecycle: Arc<Lifecycle>,
}

/// Postings, applications and the apply/review flow.
#[derive(Default)]
pub struct OpportunitiesModule {
    services: arc_swap::ArcSwapOption<Services>,
}

impl OpportunitiesModule {
    pub fn build_services(
        conn: sea_orm::DatabaseConnection,
        users: Arc<dyn IdentityApi>,
        cfg: &OpportunitiesConfig,
    ) -> anyhow::Result<(Service, Lifecycle)> {
        cfg.validate()?;
        let postings = Arc::new(SeaOrmPostingsRepository::new(conn.clone()));
        let applications = Arc::new(SeaOrmApplicationsRepository::new(conn));
        let service = Service::new(
            postings.clone(),
            users.clone(),
            ServiceConfig {
                default_location: cfg.default_location.clone(),
                list_limit: cfg.list_limit,
            },
        );
        let lifecycle = Lifecycle::new(postings, applications, users);
        Ok((service, lifecycle))
    }
}

#[async_trait]
impl Module for OpportunitiesModule {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        info!("Initializing opportunities module");
        let cfg: OpportunitiesConfig = ctx.module_config()?;
        debug!(list_limit = cfg.list_limit, "loaded opportunities config");

        let db = ctx.db_required()?;
        let users = ctx
            .client_hub()
            .get::<dyn IdentityApi>()
            .context("IdentityApi is not registered")?;
        let (postings, lifecycle) = Self::build_services(db.sea(), users, &cfg)?;
        self.services.store(Some(Arc::new(Services {
            postings: Arc::new(postings),
            lifecycle: Arc::new(lifecycle),
        })));
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait]
impl DbModule for OpportunitiesModule {
    async fn migrate(&self, db: &modkit_db::DbHandle) -> anyhow::Result<()> {
        info!("Running opportunities database migrations");
        Migrator::up(db.seaorm(), None)
            .await
            .context("opportunities migrations failed")?;
        Ok(())
    }
}

impl RestfulModule for OpportunitiesModule {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: axum::Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<axum::Router> {
        let services = self
            .services
            .load_full()
            .context("opportunities services not initialized")?;
        let router = routes::register_routes(
            router,
            openapi,
            services.postings.clone(),
            services.lifecycle.clone(),
        )?;
        info!("Opportunities REST routes registered");
        Ok(router)
    }
}
