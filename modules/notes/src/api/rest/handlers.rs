use std::sync::Arc;

use axum::Extension;
use modkit::api::response;
use modkit::{ApiResult, Identity, JsonBody, PathParam, QueryParams};
use tracing::error;
use uuid::Uuid;

use crate::api::rest::dto::{CreateNoteReq, ListNotesQuery, NoteDto, UpdateNoteReq};
use crate::api::rest::error::map_domain_error;
use crate::domain::service::Service;

pub async fn list(
    Extension(svc): Extension<Arc<Service>>,
    who: Identity,
    QueryParams(query): QueryParams<ListNotesQuery>,
) -> ApiResult {
    match svc.list(who, query.into()).await {
        Ok(notes) => Ok(response::ok_list(
            notes.into_iter().map(NoteDto::from).collect(),
        )),
        Err(e) => {
            error!("Failed to list notes: {}", e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn get(
    Extension(svc): Extension<Arc<Service>>,
    who: Identity,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult {
    match svc.get(who, id).await {
        Ok(n) => Ok(response::ok_json(NoteDto::from(n))),
        Err(e) => {
            error!("Failed to get note {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn create(
    Extension(svc): Extension<Arc<Service>>,
    who: Identity,
    JsonBody(req): JsonBody<CreateNoteReq>,
) -> ApiResult {
    match svc.create(who, req.into()).await {
        Ok(n) => Ok(response::created_json(NoteDto::from(n))),
        Err(e) => {
            error!("Failed to create note: {}", e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn update(
    Extension(svc): Extension<Arc<Service>>,
    who: Identity,
    PathParam(id): PathParam<Uuid>,
    JsonBody(req): JsonBody<UpdateNoteReq>,
) -> ApiResult {
    match svc.update(who, id, req.into()).await {
        Ok(n) => Ok(response::ok_json(NoteDto::from(n))),
        Err(e) => {
            error!("Failed to update note {}: {}", id, e);
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
        Ok(()) => Ok(response::ok_message("Note deleted successfully")),
        Err(e) => {
            error!("Failed to delete note {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn toggle_pin(
    Extension(svc): Extension<Arc<Service>>,
    who: Identity,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult {
    match svc.toggle_pin(who, id).await {
        Ok(n) => Ok(response::ok_json(NoteDto::from(n))),
        Err(e) => {
            error!("Failed to toggle pin on note {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}
