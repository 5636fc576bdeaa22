use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use modkit::api::OpenApiRegistry;
use modkit::{DbModule, Module, ModuleCtx, RestfulModule};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::NotesConfig;
use crate::domain::service::{Service, ServiceConfig};
use crate::infra::storage::{migrations::Migrator, SeaOrmNotesRepository};

/// Private notes for any signed-in user.
#[derive(Default)]
pub struct NotesModule {
    service: arc_swap::ArcSwapOption<Service>,
}

impl NotesModule {
    pub fn build_service(conn: sea_orm::DatabaseConnection, cfg: &NotesConfig) -> Service {
        Service::new(
            Arc::new(SeaOrmNotesRepository::new(conn)),
            ServiceConfig {
                list_limit: cfg.list_limit,
            },
        )
    }
}

#[async_trait]
impl Module for NotesModule {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        info!("Initializing notes module");
        let cfg: NotesConfig = ctx.module_config()?;
        debug!(list_limit = cfg.list_limit, "loaded notes config");

        let db = ctx.db_required()?;
        self.service
            .store(Some(Arc::new(Self::build_service(db.sea(), &cfg))));
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait]
impl DbModule for NotesModule {
    async fn migrate(&self, db: &modkit_db::DbHandle) -> anyhow::Result<()> {
        info!("Running notes database migrations");
        Migrator::up(db.seaorm(), None)
            .await
            .context("notes migrations failed")?;
        Ok(())
    }
}

impl RestfulModule for NotesModule {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: axum::Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<axum::Router> {
        let service = self
            .service
            .load_full()
            .context("notes service not initialized")?;
        let router = routes::register_routes(router, openapi, service)?;
        info!("Notes REST routes registered");
        Ok(router)
    }
}
