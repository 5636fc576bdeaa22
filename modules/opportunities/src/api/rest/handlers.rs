use std::sync::Arc;

use axum::body::Bytes;
use axum::Extension;
use modkit::api::{problem, response};
use modkit::{ApiResult, Identity, JsonBody, PathParam, QueryParams};
use tracing::{error, info};
use uuid::Uuid;

use crate::api::rest::dto::{
    ApplicationDto, ApplicationsQuery, ApplyReq, CreatePostingReq, ListPostingsQuery, PostingDto,
    StatusReq, UpdatePostingReq, ViewsDto,
};
use crate::api::rest::error::map_domain_error;
use crate::domain::filter::PostingFilter;
use crate::domain::lifecycle::Lifecycle;
use crate::domain::service::Service;

pub async fn list_public(
    Extension(svc): Extension<Arc<Service>>,
    QueryParams(query): QueryParams<ListPostingsQuery>,
) -> ApiResult {
    let filter = PostingFilter::try_from(query).map_err(problem::bad_request)?;
    match svc.list_public(filter).await {
        Ok(items) => Ok(response::ok_list(
            items.into_iter().map(PostingDto::from).collect(),
        )),
        Err(e) => {
            error!("Failed to list opportunities: {}", e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn get(
    Extension(svc): Extension<Arc<Service>>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult {
    match svc.get(id).await {
        Ok(p) => Ok(response::ok_json(PostingDto::from(p))),
        Err(e) => {
            error!("Failed to get opportunity {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn create(
    Extension(svc): Extension<Arc<Service>>,
    who: Identity,
    JsonBody(req): JsonBody<CreatePostingReq>,
) -> ApiResult {
    match svc.create(who, req.into()).await {
        Ok(p) => Ok(response::created_with_message(
            PostingDto::from(p),
            "Opportunity created successfully",
        )),
        Err(e) => {
            error!("Failed to create opportunity: {}", e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn update(
    Extension(svc): Extension<Arc<Service>>,
    who: Identity,
    PathParam(id): PathParam<Uuid>,
    JsonBody(req): JsonBody<UpdatePostingReq>,
) -> ApiResult {
    match svc.update(who, id, req.into()).await {
        Ok(p) => Ok(response::ok_json(PostingDto::from(p))),
        Err(e) => {
            error!("Failed to update opportunity {}: {}", id, e);
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
        Ok(()) => Ok(response::ok_message("Opportunity deleted")),
        Err(e) => {
            error!("Failed to delete opportunity {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn list_mine(Extension(svc): Extension<Arc<Service>>, who: Identity) -> ApiResult {
    match svc.list_mine(who).await {
        Ok(items) => Ok(response::ok_list(
            items.into_iter().map(PostingDto::from).collect(),
        )),
        Err(e) => {
            error!("Failed to list opportunities of {}: {}", who.user_id, e);
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
            error!("Failed to track view of opportunity {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}

/// The apply body is optional; an empty body means no cover letter or resume.
fn apply_body(bytes: &Bytes) -> Result<ApplyReq, modkit::ProblemResponse> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(ApplyReq::default());
    }
    serde_json::from_slice(bytes).map_err(|e| problem::bad_request(e.to_string()))
}

pub async fn apply(
    Extension(lc): Extension<Arc<Lifecycle>>,
    who: Identity,
    PathParam(id): PathParam<Uuid>,
    body: Bytes,
) -> ApiResult {
    let req = apply_body(&body)?;
    info!(opportunity_id = %id, user_id = %who.user_id, "apply attempt");
    match lc.apply(who, id, req.into()).await {
        Ok(app) => Ok(response::created_json(ApplicationDto::from(app))),
        Err(e) => {
            error!("Failed to apply to opportunity {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn my_applications(
    Extension(lc): Extension<Arc<Lifecycle>>,
    who: Identity,
) -> ApiResult {
    match lc.list_mine(who).await {
        Ok(v) => Ok(response::ok_list(
            v.into_iter().map(ApplicationDto::from).collect(),
        )),
        Err(e) => {
            error!("Failed to list applications of {}: {}", who.user_id, e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn organizer_applications(
    Extension(lc): Extension<Arc<Lifecycle>>,
    who: Identity,
) -> ApiResult {
    match lc.list_for_organizer(who).await {
        Ok(v) => Ok(response::ok_list(
            v.into_iter().map(ApplicationDto::from).collect(),
        )),
        Err(e) => {
            error!("Failed to list applications for organizer {}: {}", who.user_id, e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn list_applications(
    Extension(lc): Extension<Arc<Lifecycle>>,
    who: Identity,
    QueryParams(q): QueryParams<ApplicationsQuery>,
) -> ApiResult {
    match lc.list(who, q.opportunity).await {
        Ok(v) => Ok(response::ok_list(
            v.into_iter().map(ApplicationDto::from).collect(),
        )),
        Err(e) => {
            error!("Failed to list applications: {}", e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn update_status(
    Extension(lc): Extension<Arc<Lifecycle>>,
    who: Identity,
    PathParam(id): PathParam<Uuid>,
    JsonBody(req): JsonBody<StatusReq>,
) -> ApiResult {
    let status = req.status.unwrap_or_default();
    match lc.review(who, id, &status).await {
        Ok(app) => Ok(response::ok_json(ApplicationDto::from(app))),
        Err(e) => {
            error!("Failed to update application {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}
