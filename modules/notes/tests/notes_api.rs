//! Notes over an in-memory SQLite database: ownership, ordering, search and
//! the REST surface.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Extension, Router,
};
use modkit::{Identity, Role, TokenCodec};
use modkit_db::{ConnectOpts, DbHandle};
use notes::{
    config::NotesConfig,
    contract::model::{NewNote, NotePatch, NoteQuery},
    domain::{error::DomainError, service::Service},
    NotesModule,
};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

struct NoopRegistry;

impl modkit::api::OpenApiRegistry for NoopRegistry {
    fn register_operation(&self, _spec: &modkit::api::OperationSpec) {}
    fn ensure_schema_raw(&self, name: &str, _schemas: modkit::api::SchemaCollection) -> String {
        name.to_string()
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

async fn service() -> Arc<Service> {
    service_with(&NotesConfig::default()).await
}

async fn service_with(cfg: &NotesConfig) -> Arc<Service> {
    let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default())
        .await
        .unwrap();
    notes::infra::storage::migrations::Migrator::up(db.seaorm(), None)
        .await
        .unwrap();
    Arc::new(NotesModule::build_service(db.sea(), cfg))
}

fn someone(role: Role) -> Identity {
    Identity {
        user_id: Uuid::new_v4(),
        role,
    }
}

fn note(title: &str, content: &str) -> NewNote {
    NewNote {
        title: title.into(),
        content: content.into(),
        ..Default::default()
    }
}

async fn tick() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

#[tokio::test]
async fn create_applies_defaults_and_validates() {
    let svc = service().await;
    let me = someone(Role::Student);

    let n = svc.create(me, note("  Ideas ", "body")).await.unwrap();
    assert_eq!(n.title, "Ideas");
    assert_eq!(n.color, "#ffffff");
    assert!(!n.is_pinned);
    assert_eq!(n.owner_id, me.user_id);

    let err = svc.create(me, note("", "body")).await.unwrap_err();
    assert_eq!(err.to_string(), "Please provide a title");
    let err = svc.create(me, note("t", " ")).await.unwrap_err();
    assert_eq!(err.to_string(), "Please provide content");

    let err = svc
        .create(
            me,
            NewNote {
                color: Some("red".into()),
                ..note("t", "c")
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));
}

#[tokio::test]
async fn organizers_keep_notes_too() {
    let svc = service().await;
    let org = someone(Role::Organizer);
    svc.create(org, note("Shortlist", "Sam, Kim")).await.unwrap();
    assert_eq!(svc.list(org, NoteQuery::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn pinned_first_then_recently_updated() {
    let svc = service().await;
    let me = someone(Role::Student);
    let a = svc.create(me, note("a", "x")).await.unwrap();
    tick().await;
    let b = svc.create(me, note("b", "x")).await.unwrap();
    tick().await;
    let c = svc.create(me, note("c", "x")).await.unwrap();
    tick().await;

    svc.toggle_pin(me, a.id).await.unwrap();
    tick().await;
    svc.update(
        me,
        b.id,
        NotePatch {
            content: Some("edited".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let order: Vec<Uuid> = svc
        .list(me, NoteQuery::default())
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(order, vec![a.id, b.id, c.id]);

    let unpinned = svc.toggle_pin(me, a.id).await.unwrap();
    assert!(!unpinned.is_pinned);
}

#[tokio::test]
async fn search_and_tag_filters() {
    let svc = service().await;
    let me = someone(Role::Student);
    svc.create(
        me,
        NewNote {
            tags: vec!["rust".into(), " ".into()],
            ..note("Borrow checker", "lifetimes")
        },
    )
    .await
    .unwrap();
    svc.create(me, note("Groceries", "Rust remover, 50% off"))
        .await
        .unwrap();
    svc.create(someone(Role::Student), note("Rust", "not mine"))
        .await
        .unwrap();

    let hits = svc
        .list(
            me,
            NoteQuery {
                search: Some("RUST".into()),
                tag: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Groceries");

    let hits = svc
        .list(
            me,
            NoteQuery {
                search: Some("50%".into()),
                tag: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);

    let tagged = svc
        .list(
            me,
            NoteQuery {
                search: None,
                tag: Some("rust".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].tags, vec!["rust".to_string()]);
}

#[tokio::test]
async fn list_limit_counts_only_tagged_notes() {
    let svc = service_with(&NotesConfig { list_limit: 2 }).await;
    let me = someone(Role::Student);
    svc.create(
        me,
        NewNote {
            tags: vec!["ml".into()],
            ..note("Papers", "attention")
        },
    )
    .await
    .unwrap();
    tick().await;
    svc.create(me, note("Groceries", "milk")).await.unwrap();
    tick().await;
    svc.create(me, note("Chores", "laundry")).await.unwrap();

    let tagged = svc
        .list(
            me,
            NoteQuery {
                search: None,
                tag: Some("ml".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].title, "Papers");

    let all = svc.list(me, NoteQuery::default()).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].title, "Chores");
}

#[tokio::test]
async fn strangers_are_forbidden() {
    let svc = service().await;
    let me = someone(Role::Student);
    let other = someone(Role::Student);
    let n = svc.create(me, note("Private", "keep out")).await.unwrap();

    let cases = [
        (svc.get(other, n.id).await.unwrap_err(), "Not authorized to access this note"),
        (
            svc.update(other, n.id, NotePatch::default()).await.unwrap_err(),
            "Not authorized to update this note",
        ),
        (svc.delete(other, n.id).await.unwrap_err(), "Not authorized to delete this note"),
        (svc.toggle_pin(other, n.id).await.unwrap_err(), "Not authorized to modify this note"),
    ];
    for (err, msg) in cases {
        assert!(matches!(err, DomainError::Forbidden { .. }));
        assert_eq!(err.to_string(), msg);
    }

    svc.delete(me, n.id).await.unwrap();
    assert!(matches!(
        svc.get(me, n.id).await.unwrap_err(),
        DomainError::NotFound { .. }
    ));
}

#[tokio::test]
async fn rest_surface() {
    let svc = service().await;
    let codec = Arc::new(TokenCodec::new(
        b"notes-tests-secret-0123456789abcdef",
        Duration::from_secs(3600),
    ));
    let me = codec.issue(Uuid::new_v4(), Role::Student).unwrap().token;
    let other = codec.issue(Uuid::new_v4(), Role::Organizer).unwrap().token;
    let app = notes::api::rest::routes::register_routes(Router::new(), &NoopRegistry, svc)
        .unwrap()
        .layer(Extension(codec));

    let call = |method: &'static str, uri: String, token: Option<String>, body: Option<Value>| {
        let app = app.clone();
        async move {
            let mut req = Request::builder().method(method).uri(uri);
            if let Some(t) = token {
                req = req.header("authorization", format!("Bearer {t}"));
            }
            let req = match body {
                Some(b) => req
                    .header("content-type", "application/json")
                    .body(Body::from(b.to_string()))
                    .unwrap(),
                None => req.body(Body::empty()).unwrap(),
            };
            let resp = app.oneshot(req).await.unwrap();
            let status = resp.status();
            let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
                .await
                .unwrap();
            (status, serde_json::from_slice::<Value>(&bytes).unwrap_or(Value::Null))
        }
    };

    let (status, _) = call("GET", "/notes".into(), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        "POST",
        "/notes".into(),
        Some(me.clone()),
        Some(json!({"title": "Plan", "content": "Apply early", "tags": ["career"], "color": "#ffcc00"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["isPinned"], false);
    assert_eq!(body["data"]["color"], "#ffcc00");
    let id = body["data"]["id"].as_str().unwrap().to_owned();

    let (status, body) = call("PATCH", format!("/notes/{id}/pin"), Some(me.clone()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isPinned"], true);

    let (status, body) = call("GET", "/notes?tag=career".into(), Some(me.clone()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, _) = call("GET", "/notes?owner=x".into(), Some(me.clone()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call("GET", format!("/notes/{id}"), Some(other.clone()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized to access this note");

    let (status, body) = call("GET", "/notes/not-a-uuid".into(), Some(me.clone()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, body) = call("DELETE", format!("/notes/{id}"), Some(me.clone()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Note deleted successfully");

    let (status, body) = call("GET", format!("/notes/{id}"), Some(me), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Note not found");
}
