use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use identity::contract::IdentityApi;
use modkit::api::OpenApiRegistry;
use modkit::{DbModule, Module, ModuleCtx, RestfulModule};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::NotificationsConfig;
use crate::domain::service::{Service, ServiceConfig};
use crate::infra::storage::{migrations::Migrator, SeaOrmNotificationsRepository};

/// Inboxes and organizer broadcasts.
#[derive(Default)]
pub struct NotificationsModule {
    service: arc_swap::ArcSwapOption<Service>,
}

impl NotificationsModule {
    pub fn build_service(
        conn: sea_orm::DatabaseConnection,
        users: Arc<dyn IdentityApi>,
        cfg: &NotificationsConfig,
    ) -> Service {
        Service::new(
            Arc::new(SeaOrmNotificationsRepository::new(conn)),
            users,
            ServiceConfig {
                list_limit: cfg.list_limit,
            },
        )
    }
}

#[async_trait]
impl Module for NotificationsModule {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        info!("Initializing notifications module");
        let cfg: NotificationsConfig = ctx.module_config()?;
        debug!(list_limit = cfg.list_limit, "loaded notifications config");

        let db = ctx.db_required()?;
        let users = ctx
            .client_hub()
            .get::<dyn IdentityApi>()
            .context("IdentityApi is not registered")?;
        let service = Self::build_service(db.sea(), users, &cfg);
        self.service.store(Some(Arc::new(service)));
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait]
impl DbModule for NotificationsModule {
    async fn migrate(&self, db: &modkit_db::DbHandle) -> anyhow::Result<()> {
        info!("Running notifications database migrations");
        Migrator::up(db.seaorm(), None)
            .await
            .context("notifications migrations failed")?;
        Ok(())
    }
}

impl RestfulModule for NotificationsModule {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: axum::Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<axum::Router> {
        let service = self
            .service
            .load_full()
            .context("notifications service not initialized")?;
        let router = routes::register_routes(router, openapi, service)?;
        info!("Notifications REST routes registered");
        Ok(router)
    }
}
