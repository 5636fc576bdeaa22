use std::sync::Arc;

use axum::{Extension, Router};
use modkit::api::{Missing, OpenApiRegistry, OperationBuilder};

use crate::api::rest::{dto, handlers};
use crate::domain::service::Service;

pub fn register_routes(
    mut router: Router,
    openapi: &dyn OpenApiRegistry,
    service: Arc<Service>,
) -> anyhow::Result<Router> {
    // POST /auth/register
    router = OperationBuilder::<Missing, Missing, ()>::post("/auth/register")
        .operation_id("identity.register")
        .summary("Register a new account")
        .description("Creates a student or organizer account and returns a session token")
        .tag("auth")
        .json_request::<dto::RegisterReq>(openapi, "Account data")
        .handler(handlers::register)
        .json_response_with_schema::<dto::AuthDto>(openapi, 201, "Account created")
        .problem_response(openapi, 409, "User already exists")
        .standard_errors(openapi)
        .register(router, openapi);

    // POST /auth/login
    router = OperationBuilder::<Missing, Missing, ()>::post("/auth/login")
        .operation_id("identity.login")
        .summary("Log in")
        .tag("auth")
        .json_request::<dto::LoginReq>(openapi, "Credentials")
        .handler(handlers::login)
        .json_response_with_schema::<dto::AuthDto>(openapi, 200, "Session issued")
        .problem_response(openapi, 401, "Invalid email or password")
        .standard_errors(openapi)
        .register(router, openapi);

    // GET /auth/me
    router = OperationBuilder::<Missing, Missing, ()>::get("/auth/me")
        .operation_id("identity.me")
        .summary("Current user")
        .tag("auth")
        .require_auth()
        .handler(handlers::me)
        .json_response_with_schema::<dto::UserDto>(openapi, 200, "Current user")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    // PUT /auth/me
    router = OperationBuilder::<Missing, Missing, ()>::put("/auth/me")
        .operation_id("identity.update_me")
        .summary("Update own profile")
        .description("Name plus the fields of the caller's own role")
        .tag("auth")
        .require_auth()
        .json_request::<dto::UpdateProfileReq>(openapi, "Profile changes")
        .handler(handlers::update_me)
        .json_response_with_schema::<dto::UserDto>(openapi, 200, "Updated user")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    router = router.layer(Extension(service));

    Ok(router)
}
