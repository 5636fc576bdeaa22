//! Storage handle for ModKit modules.
//!
//! A [`DbHandle`] is created once at startup from a DSN and handed to every module
//! through its context. It owns the sqlx pool and exposes a SeaORM
//! [`DatabaseConnection`] built on top of that pool.
//!
//! ```rust,no_run
//! # async fn demo() -> modkit_db::Result<()> {
//! use modkit_db::{ConnectOpts, DbHandle};
//!
//! let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default()).await?;
//! let conn = db.sea();
//! # let _ = conn;
//! db.close().await;
//! # Ok(())
//! # }
//! ```

pub mod json;
pub mod sqlite;

use std::time::Duration;

use sea_orm::DatabaseConnection;
use thiserror::Error;

#[cfg(feature = "pg")]
use sea_orm::SqlxPostgresConnector;
use sea_orm::SqlxSqliteConnector;
#[cfg(feature = "pg")]
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub use json::{is_unique_violation, is_unique_violation_any, StringList};
pub use sqlite::absolutize_sqlite_dsn;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Unknown DSN: {0}")]
    UnknownDsn(String),

    #[error("Feature not enabled: {0}")]
    FeatureDisabled(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Sea(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Supported engines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
    Postgres,
    Sqlite,
}

/// Pool knobs; each driver applies the subset it supports.
#[derive(Clone, Debug)]
pub struct ConnectOpts {
    pub max_conns: Option<u32>,
    pub acquire_timeout: Option<Duration>,
    pub idle_timeout: Option<Duration>,
    /// SQLite only; skipped for in-memory databases.
    pub sqlite_busy_timeout: Option<Duration>,
    /// For SQLite file DSNs, create parent directories if missing.
    pub create_sqlite_dirs: bool,
}

impl Default for ConnectOpts {
    fn default() -> Self {
        Self {
            max_conns: Some(10),
            acquire_timeout: Some(Duration::from_secs(30)),
            idle_timeout: None,
            sqlite_busy_timeout: None,
            create_sqlite_dirs: true,
        }
    }
}

#[derive(Clone, Debug)]
enum DbPool {
    #[cfg(feature = "pg")]
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

const DEFAULT_SQLITE_BUSY_TIMEOUT_MS: u64 = 5000;

/// Main handle.
#[derive(Debug)]
pub struct DbHandle {
    engine: DbEngine,
    pool: DbPool,
    dsn: String,
    sea: DatabaseConnection,
}

impl DbHandle {
    /// Detect engine by DSN scheme.
    pub fn detect(dsn: &str) -> Result<DbEngine> {
        let s = dsn.trim_start();
        if s.starts_with("postgres://") || s.starts_with("postgresql://") {
            Ok(DbEngine::Postgres)
        } else if s.starts_with("sqlite:") {
            Ok(DbEngine::Sqlite)
        } else {
            Err(DbError::UnknownDsn(dsn.to_string()))
        }
    }

    /// Connect and build handle.
    pub async fn connect(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        match Self::detect(dsn)? {
            DbEngine::Sqlite => Self::connect_sqlite(dsn, opts).await,
            #[cfg(feature = "pg")]
            DbEngine::Postgres => {
                let mut o = PgPoolOptions::new();
                if let Some(n) = opts.max_conns {
                    o = o.max_connections(n);
                }
                if let Some(t) = opts.acquire_timeout {
                    o = o.acquire_timeout(t);
                }
                o = o.idle_timeout(opts.idle_timeout);
                let pool = o.connect(dsn).await?;
                let sea = SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone());
                Ok(Self {
                    engine: DbEngine::Postgres,
                    pool: DbPool::Postgres(pool),
                    dsn: dsn.to_string(),
                    sea,
                })
            }
            #[cfg(not(feature = "pg"))]
            DbEngine::Postgres => Err(DbError::FeatureDisabled("PostgreSQL feature not enabled")),
        }
    }

    async fn connect_sqlite(dsn: &str, opts: ConnectOpts) -> Result<Self> {
        let memory = sqlite::is_memory(dsn);
        if opts.create_sqlite_dirs {
            sqlite::ensure_parent_dir(dsn)?;
        }

        let mut o = SqlitePoolOptions::new();
        if memory {
            // Every connection to `:memory:` is a separate database: pin exactly one
            // and never let it expire.
            o = o
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            if let Some(n) = opts.max_conns {
                o = o.max_connections(n);
            }
            o = o.idle_timeout(opts.idle_timeout);
        }
        if let Some(t) = opts.acquire_timeout {
            o = o.acquire_timeout(t);
        }

        let busy_ms = opts
            .sqlite_busy_timeout
            .map(|d| d.as_millis() as u64)
            .unwrap_or(DEFAULT_SQLITE_BUSY_TIMEOUT_MS);

        o = o.after_connect(move |conn, _meta| {
            Box::pin(async move {
                let journal = if memory { "DELETE" } else { "WAL" };
                sqlx::query(&format!("PRAGMA journal_mode = {journal}"))
                    .execute(&mut *conn)
                    .await?;
                sqlx::query("PRAGMA synchronous = NORMAL")
                    .execute(&mut *conn)
                    .await?;
                sqlx::query("PRAGMA foreign_keys = ON")
                    .execute(&mut *conn)
                    .await?;
                if !memory {
                    sqlx::query(&format!("PRAGMA busy_timeout = {busy_ms}"))
                        .execute(&mut *conn)
                        .await?;
                }
                Ok(())
            })
        });

        let url = sqlite::with_create_mode(dsn);
        let pool = o.connect(&url).await?;
        let sea = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool.clone());

        tracing::debug!(dsn = %dsn, memory, "sqlite pool ready");

        Ok(Self {
            engine: DbEngine::Sqlite,
            pool: DbPool::Sqlite(pool),
            dsn: dsn.to_string(),
            sea,
        })
    }

    /// Graceful pool close.
    pub async fn close(self) {
        match self.pool {
            #[cfg(feature = "pg")]
            DbPool::Postgres(p) => p.close().await,
            DbPool::Sqlite(p) => p.close().await,
        }
    }

    pub fn engine(&self) -> DbEngine {
        self.engine
    }

    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    /// SeaORM connection (cheap clone of the pooled handle).
    pub fn sea(&self) -> DatabaseConnection {
        self.sea.clone()
    }

    /// Borrowing accessor for callers that only need `&DatabaseConnection`.
    pub fn seaorm(&self) -> &DatabaseConnection {
        &self.sea
    }

    /// True when a round-trip to the database succeeds.
    pub async fn ping(&self) -> bool {
        self.sea.ping().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_engines() {
        assert_eq!(DbHandle::detect("sqlite::memory:").unwrap(), DbEngine::Sqlite);
        assert_eq!(DbHandle::detect("sqlite:///tmp/x.db").unwrap(), DbEngine::Sqlite);
        assert_eq!(
            DbHandle::detect("postgres://u:p@localhost/db").unwrap(),
            DbEngine::Postgres
        );
        assert!(matches!(
            DbHandle::detect("mysql://localhost/db"),
            Err(DbError::UnknownDsn(_))
        ));
    }

    #[tokio::test]
    async fn memory_database_survives_across_queries() {
        use sea_orm::{ConnectionTrait, Statement};

        let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default())
            .await
            .unwrap();
        let conn = db.sea();
        conn.execute(Statement::from_string(
            conn.get_database_backend(),
            "CREATE TABLE t (id INTEGER PRIMARY KEY)".to_owned(),
        ))
        .await
        .unwrap();
        conn.execute(Statement::from_string(
            conn.get_database_backend(),
            "INSERT INTO t (id) VALUES (1)".to_owned(),
        ))
        .await
        .unwrap();

        let row = db
            .seaorm()
            .query_one(Statement::from_string(
                conn.get_database_backend(),
                "SELECT COUNT(*) AS n FROM t".to_owned(),
            ))
            .await
            .unwrap()
            .unwrap();
        let n: i64 = row.try_get("", "n").unwrap();
        assert_eq!(n, 1);
        assert!(db.ping().await);
        db.close().await;
    }
}
