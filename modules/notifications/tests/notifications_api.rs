//! Notifications over one in-memory SQLite database shared with identity:
//! audience visibility, organizer broadcasts and the REST surface.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Extension, Router,
};
use identity::{
    config::IdentityConfig, contract::model::NewUser, contract::IdentityApi,
    gateways::local::IdentityLocalClient, IdentityModule,
};
use modkit::{Identity, Role, TokenCodec};
use modkit_db::{ConnectOpts, DbHandle};
use notifications::{
    config::NotificationsConfig,
    contract::model::{Audience, NewAddressedNotification, NotificationKind},
    domain::{error::DomainError, service::Service},
    model::NewNotification,
    NotificationsModule,
};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use tower::ServiceExt;

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

struct Fixture {
    db: DbHandle,
    svc: Arc<Service>,
    users: Arc<identity::domain::service::Service>,
    codec: Arc<TokenCodec>,
}

impl Fixture {
    async fn new() -> Self {
        let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default())
            .await
            .unwrap();
        identity::infra::storage::migrations::Migrator::up(db.seaorm(), None)
            .await
            .unwrap();
        notifications::infra::storage::migrations::Migrator::up(db.seaorm(), None)
            .await
            .unwrap();

        let codec = Arc::new(TokenCodec::new(
            b"notifications-tests-secret-0123456",
            Duration::from_secs(3600),
        ));
        let users = Arc::new(
            IdentityModule::build_service(db.sea(), codec.clone(), &IdentityConfig { bcrypt_cost: 4 })
                .unwrap(),
        );
        let api: Arc<dyn IdentityApi> = Arc::new(IdentityLocalClient::new(users.clone()));
        let svc = Arc::new(NotificationsModule::build_service(
            db.sea(),
            api,
            &NotificationsConfig::default(),
        ));
        Self {
            db,
            svc,
            users,
            codec,
        }
    }

    async fn user(&self, email: &str, role: Role) -> (Identity, String) {
        let s = self
            .users
            .register(NewUser {
                name: format!("{role} {email}"),
                email: email.into(),
                password: "secret1".into(),
                role: Some(role),
                ..Default::default()
            })
            .await
            .unwrap();
        (
            Identity {
                user_id: s.user.id,
                role,
            },
            s.token,
        )
    }

    fn router(&self) -> Router {
        notifications::api::rest::routes::register_routes(
            Router::new(),
            &NoopRegistry,
            self.svc.clone(),
        )
        .unwrap()
        .layer(Extension(self.codec.clone()))
    }
}

fn broadcast(audience: Option<Audience>) -> NewNotification {
    NewNotification {
        title: "Career fair".into(),
        message: "Friday at the main hall".into(),
        audience,
        ..Default::default()
    }
}

async fn call(
    router: &Router,
    method: &str,
    uri: &str,
    token: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"));
    let req = match body {
        Some(b) => req
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn student_broadcast_reaches_students_only() {
    let f = Fixture::new().await;
    let (org, _) = f.user("org@acme.io", Role::Organizer).await;
    let (other_org, _) = f.user("org2@acme.io", Role::Organizer).await;
    let (student, _) = f.user("sam@uni.edu", Role::Student).await;

    let n = f
        .svc
        .create(org, broadcast(Some(Audience::Students)))
        .await
        .unwrap();
    assert_eq!(n.kind, NotificationKind::General);
    assert_eq!(n.sender_name, "organizer org@acme.io");

    let inbox = f.svc.list_visible(student).await.unwrap();
    assert_eq!(inbox.items.len(), 1);
    assert_eq!(inbox.unread, 1);

    assert!(f.svc.list_visible(org).await.unwrap().items.is_empty());
    assert!(f.svc.list_visible(other_org).await.unwrap().items.is_empty());
}

#[tokio::test]
async fn create_is_gated_and_validated() {
    let f = Fixture::new().await;
    let (org, _) = f.user("org@acme.io", Role::Organizer).await;
    let (student, _) = f.user("sam@uni.edu", Role::Student).await;

    let err = f
        .svc
        .create(student, broadcast(Some(Audience::All)))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden { .. }));

    let err = f
        .svc
        .create(
            org,
            NewNotification {
                title: " ".into(),
                ..broadcast(Some(Audience::All))
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Please provide title and message");

    for audience in [None, Some(Audience::Specific)] {
        let err = f.svc.create(org, broadcast(audience)).await.unwrap_err();
        assert!(matches!(err, DomainError::NotImplemented { .. }));
    }
}

#[tokio::test]
async fn addressed_rows_are_private_and_mark_read_checks_visibility() {
    let f = Fixture::new().await;
    let (org, _) = f.user("org@acme.io", Role::Organizer).await;
    let (sam, _) = f.user("sam@uni.edu", Role::Student).await;
    let (kim, _) = f.user("kim@uni.edu", Role::Student).await;

    let n = notifications::insert_notification(
        f.db.seaorm(),
        NewAddressedNotification {
            recipient: sam.user_id,
            sender_id: org.user_id,
            sender_name: "Acme".into(),
            title: "Application update".into(),
            message: "accepted".into(),
            kind: NotificationKind::Application,
            link: Some("/applications/me".into()),
        },
    )
    .await
    .unwrap();
    assert_eq!(n.audience, Audience::Specific);

    assert_eq!(f.svc.list_visible(sam).await.unwrap().items.len(), 1);
    assert!(f.svc.list_visible(kim).await.unwrap().items.is_empty());

    let err = f.svc.mark_read(kim, n.id).await.unwrap_err();
    assert_eq!(err.to_string(), "Not authorized");

    let read = f.svc.mark_read(sam, n.id).await.unwrap();
    assert!(read.read);
    assert_eq!(f.svc.list_visible(sam).await.unwrap().unread, 0);
}

#[tokio::test]
async fn only_the_sender_deletes() {
    let f = Fixture::new().await;
    let (org, _) = f.user("org@acme.io", Role::Organizer).await;
    let (other, _) = f.user("org2@acme.io", Role::Organizer).await;

    let n = f
        .svc
        .create(org, broadcast(Some(Audience::All)))
        .await
        .unwrap();
    let err = f.svc.delete(other, n.id).await.unwrap_err();
    assert_eq!(err.to_string(), "Not authorized to delete this notification");

    f.svc.delete(org, n.id).await.unwrap();
    assert!(matches!(
        f.svc.delete(org, n.id).await.unwrap_err(),
        DomainError::NotFound { .. }
    ));
}

#[tokio::test]
async fn rest_surface() {
    let f = Fixture::new().await;
    let (_, org_token) = f.user("org@acme.io", Role::Organizer).await;
    let (_, student_token) = f.user("sam@uni.edu", Role::Student).await;
    let app = f.router();

    let (status, body) = call(
        &app,
        "POST",
        "/notifications",
        &student_token,
        Some(json!({"title": "x", "message": "y", "targetAudience": "all"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, body) = call(
        &app,
        "POST",
        "/notifications",
        &org_token,
        Some(json!({"title": "x", "message": "y", "targetAudience": "specific"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Specific user targeting not implemented yet");

    let (status, body) = call(
        &app,
        "POST",
        "/notifications",
        &org_token,
        Some(json!({"title": "Hackathon", "message": "Sign up", "type": "event", "targetAudience": "students"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Notification sent successfully");
    assert_eq!(body["data"]["type"], "event");
    assert_eq!(body["data"]["targetAudience"], "students");
    let id = body["data"]["id"].as_str().unwrap().to_owned();

    let (status, body) = call(&app, "GET", "/notifications", &student_token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["unread"], 1);

    let (status, body) = call(
        &app,
        "PUT",
        &format!("/notifications/{id}/read"),
        &student_token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["read"], true);

    let (status, _) = call(
        &app,
        "DELETE",
        &format!("/notifications/{id}"),
        &student_token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &app,
        "DELETE",
        &format!("/notifications/{id}"),
        &org_token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Notification deleted");

    let (status, _) = call(&app, "PUT", "/notifications/nope/read", &org_token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
