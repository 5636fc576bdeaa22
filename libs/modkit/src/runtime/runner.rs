//! Lifecycle runner.
//!
//! One base [`ModuleCtx`](crate::context::ModuleCtx) is built and reused by every phase:
//! init → db → rest → start → wait → stop.
//! Shutdown is driven by OS signals, an external `CancellationToken`, or any future.

use crate::client_hub::ClientHub;
use crate::context::{ConfigProvider, ModuleCtxBuilder};
use crate::registry::ModuleRegistry;
use crate::runtime::shutdown;
use modkit_db::DbHandle;
use runtime::Environment;
use std::{future::Future, pin::Pin, sync::Arc};
use tokio_util::sync::CancellationToken;

/// How the runtime provides storage to modules.
pub enum DbOptions {
    /// `ModuleCtx::db()` is `None` and the migration phase is skipped.
    None,
    /// A connected handle shared by all modules; migrations run against it.
    Handle(Arc<DbHandle>),
}

/// How the runtime decides when to stop.
pub enum ShutdownOptions {
    /// Listen for OS signals (Ctrl+C / SIGTERM).
    Signals,
    /// An external `CancellationToken` controls the lifecycle.
    Token(CancellationToken),
    /// When the future completes, shutdown starts.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

pub struct RunOptions {
    /// Modules to drive, already topo-sorted.
    pub registry: ModuleRegistry,
    /// Provider of module config sections (raw JSON by module name).
    pub modules_cfg: Arc<dyn ConfigProvider>,
    pub db: DbOptions,
    /// Hub pre-seeded with process-wide services (e.g. the token codec).
    pub client_hub: Arc<ClientHub>,
    pub environment: Environment,
    pub shutdown: ShutdownOptions,
}

pub async fn run(opts: RunOptions) -> anyhow::Result<()> {
    let cancel = match &opts.shutdown {
        ShutdownOptions::Token(t) => t.clone(),
        _ => CancellationToken::new(),
    };

    match opts.shutdown {
        ShutdownOptions::Signals => {
            let c = cancel.clone();
            tokio::spawn(async move {
                match shutdown::wait_for_shutdown().await {
                    Ok(()) => tracing::info!("shutdown: signal received"),
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            "shutdown: signal listener failed; falling back to ctrl_c()"
                        );
                        let _ = tokio::signal::ctrl_c().await;
                    }
                }
                c.cancel();
            });
        }
        ShutdownOptions::Future(waiter) => {
            let c = cancel.clone();
            tokio::spawn(async move {
                waiter.await;
                tracing::info!("shutdown: external future completed");
                c.cancel();
            });
        }
        ShutdownOptions::Token(_) => {
            tracing::debug!("shutdown: external token controls lifecycle");
        }
    }

    let registry = opts.registry;

    let mut ctx_builder = ModuleCtxBuilder::new(cancel.clone())
        .with_client_hub(opts.client_hub.clone())
        .with_config_provider(opts.modules_cfg.clone())
        .with_environment(opts.environment);
    if let DbOptions::Handle(db) = &opts.db {
        ctx_builder = ctx_builder.with_db(db.clone());
    }
    let base_ctx = ctx_builder.build();

    tracing::info!("Phase: init");
    registry.run_init_phase(&base_ctx).await?;

    if let DbOptions::Handle(db) = &opts.db {
        tracing::info!(engine = ?db.engine(), "Phase: db");
        registry.run_db_phase(db).await?;
    }

    tracing::info!("Phase: rest (sync)");
    let _ = registry.run_rest_phase(&base_ctx, axum::Router::new())?;

    tracing::info!("Phase: start");
    registry.run_start_phase(cancel.clone()).await?;

    cancel.cancelled().await;

    tracing::info!("Phase: stop");
    registry.run_stop_phase(cancel).await;
    Ok(())
}
