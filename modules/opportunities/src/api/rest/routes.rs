use std::sync::Arc;

use axum::{Extension, Router};
use modkit::api::{Missing, OpenApiRegistry, OperationBuilder};

use crate::api::rest::{dto, handlers};
use crate::domain::lifecycle::Lifecycle;
use crate::domain::service::Service;

pub fn register_routes(
    mut router: Router,
    openapi: &dyn OpenApiRegistry,
    service: Arc<Service>,
    lifecycle: Arc<Lifecycle>,
) -> anyhow::Result<Router> {
    // GET /opportunities
    router = OperationBuilder::<Missing, Missing, ()>::get("/opportunities")
        .operation_id("opportunities.list")
        .summary("List active opportunities")
        .description("Public listing with title search, typed filters and sorting")
        .tag("opportunities")
        .query_param("search", false, "Case-insensitive title substring")
        .query_param("type", false, "event, internship or course")
        .query_param("location", false, "Exact location")
        .query_param("company", false, "Exact company")
        .query_param("tag", false, "Postings carrying this tag")
        .query_param("skill", false, "Postings requiring this skill")
        .query_param_typed("views[gte]", false, "Minimum views (also gt, lt, lte)", "integer")
        .query_param("lastDate[gte]", false, "RFC 3339 deadline bound (also gt, lt, lte)")
        .query_param("sort", false, "Comma list of fields, '-' for descending")
        .handler(handlers::list_public)
        .json_response_with_schema::<dto::PostingListDto>(openapi, 200, "Opportunities")
        .standard_errors(openapi)
        .register(router, openapi);

    // POST /opportunities
    router = OperationBuilder::<Missing, Missing, ()>::post("/opportunities")
        .operation_id("opportunities.create")
        .summary("Create an opportunity")
        .tag("opportunities")
        .require_auth()
        .json_request::<dto::CreatePostingReq>(openapi, "Posting data")
        .handler(handlers::create)
        .json_response_with_schema::<dto::PostingDto>(openapi, 201, "Created")
        .standard_errors(openapi)
        .register(router, openapi);

    // GET /opportunities/mine
    router = OperationBuilder::<Missing, Missing, ()>::get("/opportunities/mine")
        .operation_id("opportunities.list_mine")
        .summary("Caller's own postings")
        .tag("opportunities")
        .require_auth()
        .handler(handlers::list_mine)
        .json_response_with_schema::<dto::PostingListDto>(openapi, 200, "Postings")
        .standard_errors(openapi)
        .register(router, openapi);

    // GET /opportunities/{id}
    router = OperationBuilder::<Missing, Missing, ()>::get("/opportunities/{id}")
        .operation_id("opportunities.get")
        .summary("Get an opportunity")
        .tag("opportunities")
        .path_param("id", "Opportunity ID")
        .handler(handlers::get)
        .json_response_with_schema::<dto::PostingDto>(openapi, 200, "Opportunity")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    // PUT /opportunities/{id}
    router = OperationBuilder::<Missing, Missing, ()>::put("/opportunities/{id}")
        .operation_id("opportunities.update")
        .summary("Update an owned opportunity")
        .tag("opportunities")
        .require_auth()
        .path_param("id", "Opportunity ID")
        .json_request::<dto::UpdatePostingReq>(openapi, "Fields to change")
        .handler(handlers::update)
        .json_response_with_schema::<dto::PostingDto>(openapi, 200, "Updated")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    // DELETE /opportunities/{id}
    router = OperationBuilder::<Missing, Missing, ()>::delete("/opportunities/{id}")
        .operation_id("opportunities.delete")
        .summary("Delete an owned opportunity and its applications")
        .tag("opportunities")
        .require_auth()
        .path_param("id", "Opportunity ID")
        .handler(handlers::delete)
        .json_response(200, "Opportunity deleted")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    // POST /opportunities/{id}/view
    router = OperationBuilder::<Missing, Missing, ()>::post("/opportunities/{id}/view")
        .operation_id("opportunities.track_view")
        .summary("Count a view")
        .tag("opportunities")
        .path_param("id", "Opportunity ID")
        .handler(handlers::track_view)
        .json_response_with_schema::<dto::ViewsDto>(openapi, 200, "New view count")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    // POST /opportunities/{id}/apply
    router = OperationBuilder::<Missing, Missing, ()>::post("/opportunities/{id}/apply")
        .operation_id("opportunities.apply")
        .summary("Apply to an opportunity")
        .tag("applications")
        .require_auth()
        .path_param("id", "Opportunity ID")
        .json_request::<dto::ApplyReq>(openapi, "Cover letter and resume")
        .request_optional()
        .handler(handlers::apply)
        .json_response_with_schema::<dto::ApplicationDto>(openapi, 201, "Application created")
        .problem_response(openapi, 404, "Not Found")
        .problem_response(openapi, 409, "Already applied")
        .standard_errors(openapi)
        .register(router, openapi);

    // POST /applications/apply/{opportunityId}
    router = OperationBuilder::<Missing, Missing, ()>::post("/applications/apply/{opportunityId}")
        .operation_id("applications.apply")
        .summary("Apply to an opportunity")
        .tag("applications")
        .require_auth()
        .path_param("opportunityId", "Opportunity ID")
        .json_request::<dto::ApplyReq>(openapi, "Cover letter and resume")
        .request_optional()
        .handler(handlers::apply)
        .json_response_with_schema::<dto::ApplicationDto>(openapi, 201, "Application created")
        .problem_response(openapi, 404, "Not Found")
        .problem_response(openapi, 409, "Already applied")
        .standard_errors(openapi)
        .register(router, openapi);

    // GET /applications/mine
    router = OperationBuilder::<Missing, Missing, ()>::get("/applications/mine")
        .operation_id("applications.list_mine")
        .summary("Student's own applications")
        .tag("applications")
        .require_auth()
        .handler(handlers::my_applications)
        .json_response_with_schema::<dto::ApplicationListDto>(openapi, 200, "Applications")
        .standard_errors(openapi)
        .register(router, openapi);

    // GET /applications/organizer
    router = OperationBuilder::<Missing, Missing, ()>::get("/applications/organizer")
        .operation_id("applications.list_for_organizer")
        .summary("Applications to the caller's postings")
        .tag("applications")
        .require_auth()
        .handler(handlers::organizer_applications)
        .json_response_with_schema::<dto::ApplicationListDto>(openapi, 200, "Applications")
        .standard_errors(openapi)
        .register(router, openapi);

    // GET /applications
    router = OperationBuilder::<Missing, Missing, ()>::get("/applications")
        .operation_id("applications.list")
        .summary("Applications visible to the caller")
        .tag("applications")
        .require_auth()
        .query_param("opportunity", false, "Restrict to one opportunity")
        .handler(handlers::list_applications)
        .json_response_with_schema::<dto::ApplicationListDto>(openapi, 200, "Applications")
        .standard_errors(openapi)
        .register(router, openapi);

    // PUT /applications/{id}/status
    router = OperationBuilder::<Missing, Missing, ()>::put("/applications/{id}/status")
        .operation_id("applications.update_status")
        .summary("Review an application")
        .description("Sets the status and notifies the student")
        .tag("applications")
        .require_auth()
        .path_param("id", "Application ID")
        .json_request::<dto::StatusReq>(openapi, "New status")
        .handler(handlers::update_status)
        .json_response_with_schema::<dto::ApplicationDto>(openapi, 200, "Updated application")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    router = router
        .layer(Extension(service))
        .layer(Extension(lifecycle));

    Ok(router)
}
