use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use modkit::api::response;
use modkit::{ApiResult, Identity, JsonBody, PathParam};
use tracing::error;
use uuid::Uuid;

use crate::api::rest::dto::{CreateNotificationReq, InboxDto, NotificationDto};
use crate::api::rest::error::map_domain_error;
use crate::domain::service::Service;

pub async fn list(Extension(svc): Extension<Arc<Service>>, who: Identity) -> ApiResult {
    match svc.list_visible(who).await {
        Ok(inbox) => {
            let data: Vec<NotificationDto> = inbox.items.into_iter().map(Into::into).collect();
            let body = InboxDto {
                success: true,
                count: data.len(),
                unread: inbox.unread,
                data,
            };
            Ok((StatusCode::OK, Json(body)).into_response())
        }
        Err(e) => {
            error!("Failed to list notifications: {}", e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn create(
    Extension(svc): Extension<Arc<Service>>,
    who: Identity,
    JsonBody(req): JsonBody<CreateNotificationReq>,
) -> ApiResult {
    match svc.create(who, req.into()).await {
        Ok(n) => Ok(response::created_with_message(
            NotificationDto::from(n),
            "Notification sent successfully",
        )),
        Err(e) => {
            error!("Failed to create notification: {}", e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn mark_read(
    Extension(svc): Extension<Arc<Service>>,
    who: Identity,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult {
    match svc.mark_read(who, id).await {
        Ok(n) => Ok(response::ok_json(NotificationDto::from(n))),
        Err(e) => {
            error!("Failed to mark notification {} read: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn delete(
    Extension(svc): Extension<Arc<Service>>,
    who: Identity,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult {
    match svc.delete(who, id).await {
        Ok(()) => Ok(response::ok_message("Notification deleted")),
        Err(e) => {
            error!("Failed to delete notification {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}
