//! File-backed SQLite through `DbHandle`: directory creation, persistence across
//! reconnects and DSN absolutization against a home directory.

use modkit_db::{absolutize_sqlite_dsn, ConnectOpts, DbEngine, DbHandle};
use sea_orm::{ConnectionTrait, Statement};
use tempfile::TempDir;

#[tokio::test]
async fn file_database_is_created_and_persists() {
    let home = TempDir::new().unwrap();
    let dsn = absolutize_sqlite_dsn("sqlite://nested/dir/app.db", home.path(), true).unwrap();

    let db = DbHandle::connect(&dsn, ConnectOpts::default()).await.unwrap();
    assert_eq!(db.engine(), DbEngine::Sqlite);
    let conn = db.sea();
    let backend = conn.get_database_backend();
    conn.execute(Statement::from_string(
        backend,
        "CREATE TABLE kv (k TEXT PRIMARY KEY, v TEXT NOT NULL)".to_owned(),
    ))
    .await
    .unwrap();
    conn.execute(Statement::from_string(
        backend,
        "INSERT INTO kv (k, v) VALUES ('a', 'b')".to_owned(),
    ))
    .await
    .unwrap();
    db.close().await;

    assert!(home.path().join("nested/dir/app.db").exists());

    let db = DbHandle::connect(&dsn, ConnectOpts::default()).await.unwrap();
    let row = db
        .seaorm()
        .query_one(Statement::from_string(
            backend,
            "SELECT v FROM kv WHERE k = 'a'".to_owned(),
        ))
        .await
        .unwrap()
        .unwrap();
    let v: String = row.try_get("", "v").unwrap();
    assert_eq!(v, "b");
    db.close().await;
}

#[tokio::test]
async fn unknown_scheme_fails_fast() {
    let err = DbHandle::connect("mysql://localhost/x", ConnectOpts::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Unknown DSN"));
}
