use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use modkit::runtime::{run, DbOptions, RunOptions, ShutdownOptions};
use modkit::{ClientHub, RegistryBuilder, TokenCodec};
use modkit_db::{absolutize_sqlite_dsn, ConnectOpts, DbHandle};
use runtime::{AppConfig, AppConfigProvider, CliArgs};
use sea_orm_migration::MigratorTrait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// InternEase Server - student opportunity platform backend
#[derive(Parser)]
#[command(name = "internease-server")]
#[command(about = "InternEase Server - student opportunity platform backend")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
    /// Set a new password for an existing account
    ResetPassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // home_dir is normalized and created inside
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);
    config.validate()?;

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!(
        environment = config.server.environment.as_str(),
        "InternEase Server starting"
    );

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config),
        Commands::ResetPassword { email, password } => {
            reset_password(config, &email, &password).await
        }
    }
}

/// `server.host`/`server.port` feed the ingress bind address unless the
/// `modules.api_ingress` section sets one explicitly.
fn seed_ingress_config(config: &mut AppConfig) {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let timeout_sec = config.server.timeout_sec;
    let entry = config
        .modules
        .entry("api_ingress".to_string())
        .or_insert_with(|| serde_json::json!({}));
    if let Some(section) = entry.as_object_mut() {
        section
            .entry("bind_addr")
            .or_insert_with(|| serde_json::Value::from(bind_addr));
        if timeout_sec > 0 {
            section
                .entry("request_timeout_secs")
                .or_insert_with(|| serde_json::Value::from(timeout_sec));
        }
    }
}

/// Backend named by the DSN scheme.
fn detect_backend(dsn: &str) -> Result<&'static str> {
    if dsn.is_empty() {
        anyhow::bail!("database.url is not configured");
    }
    let url = Url::parse(dsn).with_context(|| format!("invalid database url '{dsn}'"))?;
    match url.scheme() {
        "sqlite" => Ok("sqlite"),
        "postgres" | "postgresql" => Ok("postgres"),
        other => anyhow::bail!("unsupported database type: {other}"),
    }
}

async fn connect_db(config: &AppConfig) -> Result<Option<DbHandle>> {
    let Some(db_config) = config.database.as_ref() else {
        return Ok(None);
    };
    let raw = db_config.url.trim();
    let base_dir = PathBuf::from(&config.server.home_dir);
    let dsn = match detect_backend(raw)? {
        "sqlite" => absolutize_sqlite_dsn(raw, &base_dir, true)?,
        _ => raw.to_owned(),
    };

    let opts = ConnectOpts {
        max_conns: db_config.max_conns,
        acquire_timeout: Some(Duration::from_secs(5)),
        sqlite_busy_timeout: db_config
            .busy_timeout_ms
            .map(|ms| Duration::from_millis(u64::from(ms))),
        create_sqlite_dirs: true,
        ..Default::default()
    };

    tracing::info!(dsn = %dsn, "Connecting to database");
    let db = DbHandle::connect(&dsn, opts)
        .await
        .with_context(|| format!("failed to connect to '{dsn}'"))?;
    tracing::info!(engine = ?db.engine(), "Connected to database");
    Ok(Some(db))
}

fn token_codec(config: &AppConfig) -> TokenCodec {
    let ttl = config.auth.token_ttl;
    match config.auth.jwt_secret.as_deref() {
        Some(secret) => TokenCodec::new(secret.as_bytes(), ttl),
        None => {
            // validate() already rejected this combination in production.
            tracing::warn!("auth.jwt_secret is not set; using a per-process secret, tokens will not survive a restart");
            let secret = format!("{}{}", uuid::Uuid::new_v4(), uuid::Uuid::new_v4());
            TokenCodec::new(secret.as_bytes(), ttl)
        }
    }
}

async fn run_server(mut config: AppConfig) -> Result<()> {
    tracing::info!("Initializing modules...");
    seed_ingress_config(&mut config);

    let db = connect_db(&config)
        .await?
        .context("a database section is required to run the server")?;
    let db = Arc::new(db);

    let hub = Arc::new(ClientHub::new());
    hub.register::<TokenCodec>(Arc::new(token_codec(&config)));

    let ingress = Arc::new(api_ingress::ApiIngress::default());
    let identity = Arc::new(identity::IdentityModule::default());
    let notifications = Arc::new(notifications::NotificationsModule::default());
    let opportunities = Arc::new(opportunities::OpportunitiesModule::default());
    let notes = Arc::new(notes::NotesModule::default());
    let external = Arc::new(external_listings::ExternalListingsModule::default());
    let events = Arc::new(events::EventsModule::default());

    let mut b = RegistryBuilder::default();
    b.register_core("api_ingress", &[], ingress.clone())
        .register_rest_host("api_ingress", ingress.clone())
        .register_stateful("api_ingress", ingress);
    b.register_core("identity", &[], identity.clone())
        .register_db("identity", identity.clone())
        .register_rest("identity", identity);
    b.register_core("notifications", &["identity"], notifications.clone())
        .register_db("notifications", notifications.clone())
        .register_rest("notifications", notifications);
    b.register_core(
        "opportunities",
        &["identity", "notifications"],
        opportunities.clone(),
    )
    .register_db("opportunities", opportunities.clone())
    .register_rest("opportunities", opportunities);
    b.register_core("notes", &[], notes.clone())
        .register_db("notes", notes.clone())
        .register_rest("notes", notes);
    b.register_core("external_listings", &["identity"], external.clone())
        .register_db("external_listings", external.clone())
        .register_rest("external_listings", external);
    b.register_core("events", &["identity"], events.clone())
        .register_db("events", events.clone())
        .register_rest("events", events);
    let registry = b.build_topo_sorted()?;

    let environment = config.server.environment;
    let run_options = RunOptions {
        registry,
        modules_cfg: Arc::new(AppConfigProvider::new(config)),
        db: DbOptions::Handle(db.clone()),
        client_hub: hub,
        environment,
        shutdown: ShutdownOptions::Signals,
    };

    let result = run(run_options).await;
    if let Ok(db) = Arc::try_unwrap(db) {
        db.close().await;
    }
    result
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    println!("Configuration is valid");
    println!("{}", config.to_yaml()?);
    Ok(())
}

async fn reset_password(config: AppConfig, email: &str, password: &str) -> Result<()> {
    let db = connect_db(&config)
        .await?
        .context("a database section is required to reset a password")?;
    identity::infra::storage::migrations::Migrator::up(db.seaorm(), None)
        .await
        .context("identity migrations failed")?;

    let cfg: identity::config::IdentityConfig = match config.modules.get("identity") {
        Some(raw) => serde_json::from_value(raw.clone()).context("invalid 'identity' module config")?,
        None => Default::default(),
    };
    let service =
        identity::IdentityModule::build_service(db.sea(), Arc::new(token_codec(&config)), &cfg)?;

    let outcome = service.reset_password(email, password).await;
    db.close().await;
    outcome.with_context(|| format!("password reset for {email} failed"))?;

    tracing::info!(email, "password reset");
    println!("Password updated for {email}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingress_bind_addr_follows_server_section() {
        let mut cfg = AppConfig::default();
        cfg.server.port = 8087;
        cfg.server.timeout_sec = 12;
        seed_ingress_config(&mut cfg);
        let section = &cfg.modules["api_ingress"];
        assert_eq!(section["bind_addr"], "127.0.0.1:8087");
        assert_eq!(section["request_timeout_secs"], 12);
    }

    #[test]
    fn backend_follows_the_dsn_scheme() {
        assert_eq!(detect_backend("sqlite::memory:").unwrap(), "sqlite");
        assert_eq!(detect_backend("sqlite://database/internease.db").unwrap(), "sqlite");
        assert_eq!(detect_backend("postgresql://localhost/app").unwrap(), "postgres");
        assert!(detect_backend("mysql://localhost/app").is_err());
        assert!(detect_backend("").is_err());
    }

    #[test]
    fn explicit_ingress_bind_addr_wins() {
        let mut cfg = AppConfig::default();
        cfg.modules.insert(
            "api_ingress".into(),
            serde_json::json!({ "bind_addr": "0.0.0.0:9000" }),
        );
        seed_ingress_config(&mut cfg);
        assert_eq!(cfg.modules["api_ingress"]["bind_addr"], "0.0.0.0:9000");
        assert!(cfg.modules["api_ingress"].get("request_timeout_secs").is_none());
    }
}
