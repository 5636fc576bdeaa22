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
    // GET /notes
    router = OperationBuilder::<Missing, Missing, ()>::get("/notes")
        .operation_id("notes.list")
        .summary("List the caller's notes")
        .description("Pinned notes first, then most recently updated")
        .tag("notes")
        .require_auth()
        .query_param("search", false, "Case-insensitive substring of title or content")
        .query_param("tag", false, "Notes carrying this tag")
        .handler(handlers::list)
        .json_response_with_schema::<dto::NoteListDto>(openapi, 200, "Notes")
        .standard_errors(openapi)
        .register(router, openapi);

    // POST /notes
    router = OperationBuilder::<Missing, Missing, ()>::post("/notes")
        .operation_id("notes.create")
        .summary("Create a note")
        .tag("notes")
        .require_auth()
        .json_request::<dto::CreateNoteReq>(openapi, "Note content")
        .handler(handlers::create)
        .json_response_with_schema::<dto::NoteDto>(openapi, 201, "Created note")
        .standard_errors(openapi)
        .register(router, openapi);

    // GET /notes/{id}
    router = OperationBuilder::<Missing, Missing, ()>::get("/notes/{id}")
        .operation_id("notes.get")
        .summary("Get one note")
        .tag("notes")
        .require_auth()
        .path_param("id", "Note ID")
        .handler(handlers::get)
        .json_response_with_schema::<dto::NoteDto>(openapi, 200, "Note")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    // PUT /notes/{id}
    router = OperationBuilder::<Missing, Missing, ()>::put("/notes/{id}")
        .operation_id("notes.update")
        .summary("Update a note")
        .tag("notes")
        .require_auth()
        .path_param("id", "Note ID")
        .json_request::<dto::UpdateNoteReq>(openapi, "Fields to change")
        .handler(handlers::update)
        .json_response_with_schema::<dto::NoteDto>(openapi, 200, "Updated note")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    // DELETE /notes/{id}
    router = OperationBuilder::<Missing, Missing, ()>::delete("/notes/{id}")
        .operation_id("notes.delete")
        .summary("Delete a note")
        .tag("notes")
        .require_auth()
        .path_param("id", "Note ID")
        .handler(handlers::delete)
        .json_response(200, "Note deleted")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    // PATCH /notes/{id}/pin
    router = OperationBuilder::<Missing, Missing, ()>::patch("/notes/{id}/pin")
        .operation_id("notes.toggle_pin")
        .summary("Flip the pinned flag")
        .tag("notes")
        .require_auth()
        .path_param("id", "Note ID")
        .handler(handlers::toggle_pin)
        .json_response_with_schema::<dto::NoteDto>(openapi, 200, "Updated note")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    router = router.layer(Extension(service));

    Ok(router)
}
