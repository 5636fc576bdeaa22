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
    // GET /events
    router = OperationBuilder::<Missing, Missing, ()>::get("/events")
        .operation_id("events.list")
        .summary("List events")
        .description("Newest first; `all` or an absent value disables a filter")
        .tag("events")
        .query_param("type", false, "Conference, Workshop, Hackathon, Competition, Webinar or TechFest")
        .query_param("status", false, "Live, Upcoming or Expired")
        .query_param("search", false, "Case-insensitive title or description substring")
        .handler(handlers::list)
        .json_response_with_schema::<dto::EventListDto>(openapi, 200, "Events")
        .standard_errors(openapi)
        .register(router, openapi);

    // POST /events
    router = OperationBuilder::<Missing, Missing, ()>::post("/events")
        .operation_id("events.create")
        .summary("Create an event")
        .tag("events")
        .require_auth()
        .json_request::<dto::CreateEventReq>(openapi, "Event details")
        .handler(handlers::create)
        .json_response_with_schema::<dto::EventDto>(openapi, 201, "Event created")
        .standard_errors(openapi)
        .register(router, openapi);

    // GET /events/mine
    router = OperationBuilder::<Missing, Missing, ()>::get("/events/mine")
        .operation_id("events.list_mine")
        .summary("Events organized by the caller")
        .tag("events")
        .require_auth()
        .handler(handlers::list_mine)
        .json_response_with_schema::<dto::EventListDto>(openapi, 200, "Events")
        .standard_errors(openapi)
        .register(router, openapi);

    // GET /events/{id}
    router = OperationBuilder::<Missing, Missing, ()>::get("/events/{id}")
        .operation_id("events.get")
        .summary("Get an event")
        .description("Counts as a view")
        .tag("events")
        .path_param("id", "Event ID")
        .handler(handlers::get)
        .json_response_with_schema::<dto::EventDto>(openapi, 200, "Event")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    // PUT /events/{id}
    router = OperationBuilder::<Missing, Missing, ()>::put("/events/{id}")
        .operation_id("events.update")
        .summary("Update an event")
        .tag("events")
        .require_auth()
        .path_param("id", "Event ID")
        .json_request::<dto::UpdateEventReq>(openapi, "Fields to change")
        .handler(handlers::update)
        .json_response_with_schema::<dto::EventDto>(openapi, 200, "Updated event")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    // DELETE /events/{id}
    router = OperationBuilder::<Missing, Missing, ()>::delete("/events/{id}")
        .operation_id("events.delete")
        .summary("Delete an event and its registrations")
        .tag("events")
        .require_auth()
        .path_param("id", "Event ID")
        .handler(handlers::delete)
        .json_response(200, "Event deleted")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    // POST /events/{id}/register
    router = OperationBuilder::<Missing, Missing, ()>::post("/events/{id}/register")
        .operation_id("events.register")
        .summary("Take a seat")
        .tag("events")
        .require_auth()
        .path_param("id", "Event ID")
        .handler(handlers::register)
        .json_response_with_schema::<dto::EventDto>(openapi, 200, "Registered")
        .problem_response(openapi, 404, "Not Found")
        .problem_response(openapi, 409, "Conflict")
        .standard_errors(openapi)
        .register(router, openapi);

    // POST /events/{id}/view
    router = OperationBuilder::<Missing, Missing, ()>::post("/events/{id}/view")
        .operation_id("events.track_view")
        .summary("Count a view")
        .tag("events")
        .path_param("id", "Event ID")
        .handler(handlers::track_view)
        .json_response_with_schema::<dto::ViewsDto>(openapi, 200, "Current view count")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    router = router.layer(Extension(service));

    Ok(router)
}
