use std::sync::Arc;

use axum::Extension;
use modkit::api::{problem, response};
use modkit::{ApiResult, Identity, JsonBody, PathParam, QueryParams};
use tracing::{error, info};
use uuid::Uuid;

use crate::api::rest::dto::{CreateEventReq, EventDto, ListEventsQuery, UpdateEventReq, ViewsDto};
use crate::api::rest::error::map_domain_error;
use crate::contract::model::EventQuery;
use crate::domain::service::Service;

pub async fn list(
    Extension(svc): Extension<Arc<Service>>,
    QueryParams(query): QueryParams<ListEventsQuery>,
) -> ApiResult {
    let query = EventQuery::try_from(query).map_err(problem::bad_request)?;
    match svc.list(query).await {
        Ok(items) => Ok(response::ok_list(
            items.into_iter().map(EventDto::from).collect(),
        )),
        Err(e) => {
            error!("Failed to list events: {}", e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn get(
    Extension(svc): Extension<Arc<Service>>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult {
    match svc.get(id).await {
        Ok(e) => Ok(response::ok_json(EventDto::from(e))),
        Err(e) => {
            error!("Failed to get event {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn create(
    Extension(svc): Extension<Arc<Service>>,
    who: Identity,
    JsonBody(req): JsonBody<CreateEventReq>,
) -> ApiResult {
    match svc.create(who, req.into()).await {
        Ok(e) => Ok(response::created_with_message(
            EventDto::from(e),
            "Event created successfully",
        )),
        Err(e) => {
            error!("Failed to create event: {}", e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn update(
    Extension(svc): Extension<Arc<Service>>,
    who: Identity,
    PathParam(id): PathParam<Uuid>,
    JsonBody(req): JsonBody<UpdateEventReq>,
) -> ApiResult {
    match svc.update(who, id, req.into()).await {
        Ok(e) => Ok(response::ok_with_message(
            EventDto::from(e),
            "Event updated successfully",
        )),
        Err(e) => {
            error!("Failed to update event {}: {}", id, e);
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
        Ok(()) => Ok(response::ok_message("Event deleted")),
        Err(e) => {
            error!("Failed to delete event {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn register(
    Extension(svc): Extension<Arc<Service>>,
    who: Identity,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult {
    info!(event_id = %id, user_id = %who.user_id, "event registration attempt");
    match svc.register(who, id).await {
        Ok(e) => Ok(response::ok_with_message(
            EventDto::from(e),
            "Successfully registered for event",
        )),
        Err(e) => {
            error!("Failed to register for event {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn list_mine(Extension(svc): Extension<Arc<Service>>, who: Identity) -> ApiResult {
    match svc.list_mine(who).await {
        Ok(items) => Ok(response::ok_list(
            items.into_iter().map(EventDto::from).collect(),
        )),
        Err(e) => {
            error!("Failed to list events of {}: {}", who.user_id, e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn track_view(
    Extension(svc): Extension<Arc<Service>>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult {
    match svc.track_view(id).await {
        Ok(views) => Ok(response::ok_json(ViewsDto { views })),
        Err(e) => {
            error!("Failed to track view of event {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}
