//! Identity over a fresh in-memory SQLite database: service rules and the
//! REST surface registered through the real routes.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Extension, Router,
};
use identity::{
    config::IdentityConfig,
    contract::model::{NewUser, Profile, ProfilePatch},
    domain::{error::DomainError, service::Service},
    gateways::local::IdentityLocalClient,
    infra::storage::migrations::Migrator,
    IdentityModule,
};
use identity::contract::client::IdentityApi;
use modkit::{Role, TokenCodec};
use modkit_db::{ConnectOpts, DbHandle};
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

fn codec() -> Arc<TokenCodec> {
    Arc::new(TokenCodec::new(
        b"identity-tests-secret-identity-tests",
        Duration::from_secs(3600),
    ))
}

async fn service(codec: Arc<TokenCodec>) -> Arc<Service> {
    let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default())
        .await
        .unwrap();
    Migrator::up(db.seaorm(), None).await.unwrap();
    let cfg = IdentityConfig { bcrypt_cost: 4 };
    Arc::new(IdentityModule::build_service(db.sea(), codec, &cfg).unwrap())
}

fn student(email: &str) -> NewUser {
    NewUser {
        name: "Sam Student".into(),
        email: email.into(),
        password: "hunter22".into(),
        ..Default::default()
    }
}

async fn app() -> (Router, Arc<TokenCodec>) {
    let c = codec();
    let svc = service(c.clone()).await;
    let router = identity::api::rest::routes::register_routes(Router::new(), &NoopRegistry, svc)
        .unwrap()
        .layer(Extension(c.clone()));
    (router, c)
}

async fn call(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
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
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn register_defaults_to_student_and_issues_a_token() {
    let c = codec();
    let svc = service(c.clone()).await;
    let s = svc.register(student("sam@uni.edu")).await.unwrap();

    assert_eq!(s.user.role(), Role::Student);
    let who = c.verify(&s.token).unwrap();
    assert_eq!(who.user_id, s.user.id);
    assert_eq!(who.role, Role::Student);
}

#[tokio::test]
async fn organizer_fields_are_kept_only_for_organizers() {
    let svc = service(codec()).await;
    let org = svc
        .register(NewUser {
            role: Some(Role::Organizer),
            organization_name: Some("Acme".into()),
            contact_info: Some("hr@acme.io".into()),
            ..student("org@acme.io")
        })
        .await
        .unwrap();
    assert_eq!(org.user.display_company(), "Acme");

    let stu = svc
        .register(NewUser {
            organization_name: Some("Ignored".into()),
            ..student("stu@uni.edu")
        })
        .await
        .unwrap();
    assert!(matches!(stu.user.profile, Profile::Student { .. }));
}

#[tokio::test]
async fn duplicate_email_conflicts_and_creates_nothing() {
    let svc = service(codec()).await;
    let first = svc.register(student("dup@uni.edu")).await.unwrap();
    let err = svc.register(student("dup@uni.edu")).await.unwrap_err();
    assert!(matches!(err, DomainError::EmailAlreadyExists { .. }));

    // email uniqueness is case-sensitive
    svc.register(student("Dup@uni.edu")).await.unwrap();
    assert_eq!(svc.get_user(first.user.id).await.unwrap().email, "dup@uni.edu");
}

#[tokio::test]
async fn registration_validation() {
    let svc = service(codec()).await;
    let missing = svc
        .register(NewUser {
            name: String::new(),
            ..student("a@b.io")
        })
        .await
        .unwrap_err();
    assert_eq!(missing.to_string(), "Please add all required fields");

    let bad_email = svc.register(student("not-an-email")).await.unwrap_err();
    assert_eq!(bad_email.to_string(), "Please add a valid email");

    let short = svc
        .register(NewUser {
            password: "12345".into(),
            ..student("short@uni.edu")
        })
        .await
        .unwrap_err();
    assert!(matches!(short, DomainError::Validation { .. }));
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let (router, _) = app().await;
    let (status, _) = call(
        &router,
        "POST",
        "/auth/register",
        None,
        Some(json!({"name": "Ana", "email": "ana@uni.edu", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (s1, wrong_pw) = call(
        &router,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "ana@uni.edu", "password": "nope123"})),
    )
    .await;
    let (s2, no_user) = call(
        &router,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "ghost@uni.edu", "password": "nope123"})),
    )
    .await;
    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s2, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw["message"], "Invalid email or password");
    assert_eq!(wrong_pw["message"], no_user["message"]);
    assert_eq!(wrong_pw["code"], no_user["code"]);

    let (ok, body) = call(
        &router,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "ana@uni.edu", "password": "secret1"})),
    )
    .await;
    assert_eq!(ok, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["role"], "student");
    assert!(body["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn register_over_http() {
    let (router, _) = app().await;
    let body = json!({
        "name": "Olga",
        "email": "olga@acme.io",
        "password": "secret1",
        "role": "organizer",
        "organizationName": "Acme"
    });
    let (status, created) = call(&router, "POST", "/auth/register", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["user"]["organizationName"], "Acme");
    assert!(created["data"]["user"].get("badges").is_none());

    let (status, dup) = call(&router, "POST", "/auth/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(dup["message"], "User already exists");

    let (status, missing) = call(
        &router,
        "POST",
        "/auth/register",
        None,
        Some(json!({"email": "x@y.io"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(missing["message"], "Please add all required fields");
}

#[tokio::test]
async fn me_and_profile_update() {
    let (router, _) = app().await;
    let (_, reg) = call(
        &router,
        "POST",
        "/auth/register",
        None,
        Some(json!({"name": "Sam", "email": "sam@uni.edu", "password": "secret1"})),
    )
    .await;
    let token = reg["data"]["token"].as_str().unwrap().to_owned();

    let (status, _) = call(&router, "GET", "/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, me) = call(&router, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["email"], "sam@uni.edu");

    let (status, upd) = call(
        &router,
        "PUT",
        "/auth/me",
        Some(&token),
        Some(json!({"resumeLink": "https://cv.example/sam", "badges": ["rust"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(upd["data"]["resumeLink"], "https://cv.example/sam");
    assert_eq!(upd["data"]["badges"], json!(["rust"]));

    let (status, _) = call(
        &router,
        "PUT",
        "/auth/me",
        Some(&token),
        Some(json!({"organizationName": "Nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reset_password_rehashes() {
    let svc = service(codec()).await;
    svc.register(student("reset@uni.edu")).await.unwrap();
    svc.reset_password("reset@uni.edu", "brandnew1").await.unwrap();

    assert!(svc.login("reset@uni.edu", "hunter22").await.is_err());
    svc.login("reset@uni.edu", "brandnew1").await.unwrap();

    let err = svc.reset_password("ghost@uni.edu", "brandnew1").await.unwrap_err();
    assert!(matches!(err, DomainError::EmailNotFound { .. }));
}

#[tokio::test]
async fn local_client_resolves_users() {
    let svc = service(codec()).await;
    let s = svc.register(student("client@uni.edu")).await.unwrap();
    let api: Arc<dyn IdentityApi> = Arc::new(IdentityLocalClient::new(svc.clone()));

    assert_eq!(api.get_user(s.user.id).await.unwrap().name, "Sam Student");
    assert!(api.get_user(uuid::Uuid::new_v4()).await.is_err());

    let updated = svc
        .update_profile(
            s.user.id,
            ProfilePatch {
                name: Some("Sam S.".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(api.get_user(updated.id).await.unwrap().name, "Sam S.");
}
