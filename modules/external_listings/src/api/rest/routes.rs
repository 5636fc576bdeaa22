use std::sync::Arc;

use axum::{Extension, Router};
use modkit::api::{Missing, OpenApiRegistry, OperationBuilder};

use crate::api::rest::{dto, handlers};
use crate::contract::model::{Course, ExternalEvent, ExternalInternship};
use crate::domain::service::Service;

pub fn register_routes(
    mut router: Router,
    openapi: &dyn OpenApiRegistry,
    service: Arc<Service>,
) -> anyhow::Result<Router> {
    // GET /external-courses
    router = OperationBuilder::<Missing, Missing, ()>::get("/external-courses")
        .operation_id("external_listings.list_courses")
        .summary("List curated courses")
        .tag("external-listings")
        .query_param_typed("limit", false, "Maximum number of courses (default 50)", "integer")
        .handler(handlers::list_courses)
        .json_response_with_schema::<dto::CourseListDto>(openapi, 200, "Courses")
        .standard_errors(openapi)
        .register(router, openapi);

    // GET /external-courses/{id}
    router = OperationBuilder::<Missing, Missing, ()>::get("/external-courses/{id}")
        .operation_id("external_listings.get_course")
        .summary("Get a curated course")
        .tag("external-listings")
        .path_param("id", "Course ID, e.g. curated-course-1")
        .handler(handlers::get_course)
        .json_response_with_schema::<Course>(openapi, 200, "Course")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    // GET /external-internships
    router = OperationBuilder::<Missing, Missing, ()>::get("/external-internships")
        .operation_id("external_listings.list_internships")
        .summary("List curated internships")
        .tag("external-listings")
        .query_param_typed("limit", false, "Maximum number of internships (default 50)", "integer")
        .handler(handlers::list_internships)
        .json_response_with_schema::<dto::InternshipListDto>(openapi, 200, "Internships")
        .standard_errors(openapi)
        .register(router, openapi);

    // GET /external-internships/{id}
    router = OperationBuilder::<Missing, Missing, ()>::get("/external-internships/{id}")
        .operation_id("external_listings.get_internship")
        .summary("Get a curated internship")
        .tag("external-listings")
        .path_param("id", "Internship ID, e.g. curated-intern-1")
        .handler(handlers::get_internship)
        .json_response_with_schema::<ExternalInternship>(openapi, 200, "Internship")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    // GET /external-events
    router = OperationBuilder::<Missing, Missing, ()>::get("/external-events")
        .operation_id("external_listings.list_events")
        .summary("List upcoming tech events")
        .tag("external-listings")
        .query_param_typed("page_size", false, "Maximum number of events (default 50)", "integer")
        .handler(handlers::list_events)
        .json_response_with_schema::<dto::EventListDto>(openapi, 200, "Events")
        .standard_errors(openapi)
        .register(router, openapi);

    // GET /external-events/registrations/mine
    router = OperationBuilder::<Missing, Missing, ()>::get("/external-events/registrations/mine")
        .operation_id("external_listings.my_registrations")
        .summary("Events the caller registered for")
        .tag("external-listings")
        .require_auth()
        .handler(handlers::my_registrations)
        .json_response_with_schema::<dto::InteractionListDto>(openapi, 200, "Registrations")
        .standard_errors(openapi)
        .register(router, openapi);

    // GET /external-events/stats
    router = OperationBuilder::<Missing, Missing, ()>::get("/external-events/stats")
        .operation_id("external_listings.stats")
        .summary("View and registration counters per event")
        .tag("external-listings")
        .require_auth()
        .handler(handlers::stats)
        .json_response_with_schema::<dto::EventStatListDto>(openapi, 200, "Per-event counters")
        .standard_errors(openapi)
        .register(router, openapi);

    // GET /external-events/stats/{id}
    router = OperationBuilder::<Missing, Missing, ()>::get("/external-events/stats/{id}")
        .operation_id("external_listings.event_stats")
        .summary("Counters and registrants for one event")
        .tag("external-listings")
        .require_auth()
        .path_param("id", "Event ID")
        .handler(handlers::event_stats)
        .json_response_with_schema::<dto::EventReportDto>(openapi, 200, "Event report")
        .standard_errors(openapi)
        .register(router, openapi);

    // GET /external-events/admin/registrations
    router = OperationBuilder::<Missing, Missing, ()>::get("/external-events/admin/registrations")
        .operation_id("external_listings.admin_registrations")
        .summary("All registrations grouped by student")
        .tag("external-listings")
        .require_auth()
        .handler(handlers::admin_registrations)
        .json_response_with_schema::<dto::RegistrationsReportDto>(openapi, 200, "Registrations by student")
        .standard_errors(openapi)
        .register(router, openapi);

    // GET /external-events/admin/students/{studentId}
    router = OperationBuilder::<Missing, Missing, ()>::get(
        "/external-events/admin/students/{studentId}",
    )
    .operation_id("external_listings.student_activity")
    .summary("One student's views and registrations")
    .tag("external-listings")
    .require_auth()
    .path_param("studentId", "Student user ID")
    .handler(handlers::student_activity)
    .json_response_with_schema::<dto::StudentActivityDto>(openapi, 200, "Student activity")
    .problem_response(openapi, 404, "Not Found")
    .standard_errors(openapi)
    .register(router, openapi);

    // GET /external-events/{id}
    router = OperationBuilder::<Missing, Missing, ()>::get("/external-events/{id}")
        .operation_id("external_listings.get_event")
        .summary("Get an event")
        .tag("external-listings")
        .path_param("id", "Event ID, e.g. tech-event-1")
        .handler(handlers::get_event)
        .json_response_with_schema::<ExternalEvent>(openapi, 200, "Event")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    // POST /external-events/{id}/view
    router = OperationBuilder::<Missing, Missing, ()>::post("/external-events/{id}/view")
        .operation_id("external_listings.track_view")
        .summary("Record that the caller viewed an event")
        .tag("external-listings")
        .require_auth()
        .path_param("id", "Event ID")
        .handler(handlers::track_view)
        .json_response_with_schema::<dto::InteractionDto>(openapi, 201, "View recorded")
        .json_response(200, "View already tracked")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    // POST /external-events/{id}/register
    router = OperationBuilder::<Missing, Missing, ()>::post("/external-events/{id}/register")
        .operation_id("external_listings.track_registration")
        .summary("Record a registration and return the event page")
        .tag("external-listings")
        .require_auth()
        .path_param("id", "Event ID")
        .handler(handlers::track_registration)
        .json_response_with_schema::<dto::RegistrationDto>(openapi, 201, "Registration recorded")
        .json_response(200, "Already registered for this event")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    router = router.layer(Extension(service));

    Ok(router)
}
