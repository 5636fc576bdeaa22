use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use modkit::api::response;
use modkit::{ApiResult, Identity, PathParam, QueryParams};
use tracing::error;
use uuid::Uuid;

use crate::api::rest::dto::{
    EventReportDto, EventStatDto, InteractionDto, LimitQuery, PageSizeQuery, RegistrationDto,
    RegistrationsReportDto, StudentActivityDto,
};
use crate::api::rest::error::map_domain_error;
use crate::contract::model::Tracked;
use crate::domain::service::Service;

pub async fn list_courses(
    Extension(svc): Extension<Arc<Service>>,
    QueryParams(q): QueryParams<LimitQuery>,
) -> ApiResult {
    Ok(response::ok_list(svc.list_courses(q.limit)))
}

pub async fn get_course(
    Extension(svc): Extension<Arc<Service>>,
    PathParam(id): PathParam<String>,
) -> ApiResult {
    match svc.get_course(&id) {
        Ok(v) => Ok(response::ok_json(v)),
        Err(e) => {
            error!("Failed to get course {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn list_internships(
    Extension(svc): Extension<Arc<Service>>,
    QueryParams(q): QueryParams<LimitQuery>,
) -> ApiResult {
    Ok(response::ok_list(svc.list_internships(q.limit)))
}

pub async fn get_internship(
    Extension(svc): Extension<Arc<Service>>,
    PathParam(id): PathParam<String>,
) -> ApiResult {
    match svc.get_internship(&id) {
        Ok(v) => Ok(response::ok_json(v)),
        Err(e) => {
            error!("Failed to get internship {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn list_events(
    Extension(svc): Extension<Arc<Service>>,
    QueryParams(q): QueryParams<PageSizeQuery>,
) -> ApiResult {
    Ok(response::ok_list(svc.list_events(q.page_size)))
}

pub async fn get_event(
    Extension(svc): Extension<Arc<Service>>,
    PathParam(id): PathParam<String>,
) -> ApiResult {
    match svc.get_event(&id) {
        Ok(v) => Ok(response::ok_json(v)),
        Err(e) => {
            error!("Failed to get external event {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn track_view(
    Extension(svc): Extension<Arc<Service>>,
    who: Identity,
    PathParam(id): PathParam<String>,
) -> ApiResult {
    match svc.track_view(who, &id).await {
        Ok(Tracked::Recorded(i)) => Ok(response::created_json(InteractionDto::from(i))),
        Ok(Tracked::AlreadyTracked(Some(i))) => Ok(response::ok_with_message(
            InteractionDto::from(i),
            "View already tracked",
        )),
        Ok(Tracked::AlreadyTracked(None)) => Ok(response::ok_message("View already tracked")),
        Err(e) => {
            error!("Failed to track view of {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn track_registration(
    Extension(svc): Extension<Arc<Service>>,
    who: Identity,
    PathParam(id): PathParam<String>,
) -> ApiResult {
    let reg = svc.track_registration(who, &id).await.map_err(|e| {
        error!("Failed to track registration for {}: {}", id, e);
        map_domain_error(&e)
    })?;
    let (status, body) = match reg.tracked {
        Tracked::Recorded(i) => (
            StatusCode::CREATED,
            RegistrationDto {
                success: true,
                message: None,
                data: Some(i.into()),
                redirect_url: reg.redirect_url,
            },
        ),
        Tracked::AlreadyTracked(existing) => (
            StatusCode::OK,
            RegistrationDto {
                success: true,
                message: Some("Already registered for this event".into()),
                data: existing.map(Into::into),
                redirect_url: reg.redirect_url,
            },
        ),
    };
    Ok((status, Json(body)).into_response())
}

pub async fn my_registrations(
    Extension(svc): Extension<Arc<Service>>,
    who: Identity,
) -> ApiResult {
    match svc.my_registrations(who).await {
        Ok(rows) => Ok(response::ok_list(
            rows.into_iter().map(InteractionDto::from).collect(),
        )),
        Err(e) => {
            error!("Failed to list registrations of {}: {}", who.user_id, e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn stats(Extension(svc): Extension<Arc<Service>>, who: Identity) -> ApiResult {
    match svc.stats(who).await {
        Ok(stats) => Ok(response::ok_list(
            stats.into_iter().map(EventStatDto::from).collect(),
        )),
        Err(e) => {
            error!("Failed to compute event stats: {}", e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn event_stats(
    Extension(svc): Extension<Arc<Service>>,
    who: Identity,
    PathParam(id): PathParam<String>,
) -> ApiResult {
    match svc.event_stats(who, &id).await {
        Ok(r) => Ok(response::ok_json(EventReportDto::from(r))),
        Err(e) => {
            error!("Failed to compute stats for {}: {}", id, e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn admin_registrations(
    Extension(svc): Extension<Arc<Service>>,
    who: Identity,
) -> ApiResult {
    match svc.admin_registrations(who).await {
        Ok(report) => Ok(Json(RegistrationsReportDto::from(report)).into_response()),
        Err(e) => {
            error!("Failed to collect registrations: {}", e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn student_activity(
    Extension(svc): Extension<Arc<Service>>,
    who: Identity,
    PathParam(student_id): PathParam<Uuid>,
) -> ApiResult {
    match svc.student_activity(who, student_id).await {
        Ok(a) => Ok(Json(StudentActivityDto::from(a)).into_response()),
        Err(e) => {
            error!("Failed to collect activity of {}: {}", student_id, e);
            Err(map_domain_error(&e))
        }
    }
}

