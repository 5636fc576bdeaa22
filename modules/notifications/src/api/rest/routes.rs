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
    // GET /notifications
    router = OperationBuilder::<Missing, Missing, ()>::get("/notifications")
        .operation_id("notifications.list")
        .summary("List visible notifications")
        .description("Rows addressed to the caller plus broadcasts to the caller's audience")
        .tag("notifications")
        .require_auth()
        .handler(handlers::list)
        .json_response_with_schema::<dto::InboxDto>(openapi, 200, "Inbox")
        .standard_errors(openapi)
        .register(router, openapi);

    // POST /notifications
    router = OperationBuilder::<Missing, Missing, ()>::post("/notifications")
        .operation_id("notifications.create")
        .summary("Broadcast a notification")
        .tag("notifications")
        .require_auth()
        .json_request::<dto::CreateNotificationReq>(openapi, "Notification content and audience")
        .handler(handlers::create)
        .json_response_with_schema::<dto::NotificationDto>(openapi, 201, "Notification sent")
        .standard_errors(openapi)
        .register(router, openapi);

    // PUT /notifications/{id}/read
    router = OperationBuilder::<Missing, Missing, ()>::put("/notifications/{id}/read")
        .operation_id("notifications.mark_read")
        .summary("Mark a notification read")
        .tag("notifications")
        .require_auth()
        .path_param("id", "Notification ID")
        .handler(handlers::mark_read)
        .json_response_with_schema::<dto::NotificationDto>(openapi, 200, "Updated notification")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    // DELETE /notifications/{id}
    router = OperationBuilder::<Missing, Missing, ()>::delete("/notifications/{id}")
        .operation_id("notifications.delete")
        .summary("Delete a sent notification")
        .tag("notifications")
        .require_auth()
        .path_param("id", "Notification ID")
        .handler(handlers::delete)
        .json_response(200, "Notification deleted")
        .problem_response(openapi, 404, "Not Found")
        .standard_errors(openapi)
        .register(router, openapi);

    router = router.layer(Extension(service));

    Ok(router)
}
