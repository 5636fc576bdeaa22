use std::sync::Arc;

use axum::Extension;
use modkit::api::response;
use modkit::{ApiResult, Identity, JsonBody};
use tracing::{error, info};

use crate::api::rest::dto::{AuthDto, LoginReq, RegisterReq, UpdateProfileReq, UserDto};
use crate::api::rest::error::map_domain_error;
use crate::domain::service::Service;

pub async fn register(
    Extension(svc): Extension<Arc<Service>>,
    JsonBody(req): JsonBody<RegisterReq>,
) -> ApiResult {
    info!(email = ?req.email, "registration attempt");
    match svc.register(req.into()).await {
        Ok(session) => Ok(response::created_json(AuthDto::from(session))),
        Err(e) => {
            error!("Failed to register user: {}", e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn login(
    Extension(svc): Extension<Arc<Service>>,
    JsonBody(req): JsonBody<LoginReq>,
) -> ApiResult {
    let email = req.email.unwrap_or_default();
    let password = req.password.unwrap_or_default();
    match svc.login(&email, &password).await {
        Ok(session) => Ok(response::ok_json(AuthDto::from(session))),
        Err(e) => {
            error!("Login failed: {}", e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn me(Extension(svc): Extension<Arc<Service>>, who: Identity) -> ApiResult {
    match svc.get_user(who.user_id).await {
        Ok(u) => Ok(response::ok_json(UserDto::from(u))),
        Err(e) => {
            error!("Failed to load user {}: {}", who.user_id, e);
            Err(map_domain_error(&e))
        }
    }
}

pub async fn update_me(
    Extension(svc): Extension<Arc<Service>>,
    who: Identity,
    JsonBody(req): JsonBody<UpdateProfileReq>,
) -> ApiResult {
    match svc.update_profile(who.user_id, req.into()).await {
        Ok(u) => Ok(response::ok_with_message(UserDto::from(u), "Profile updated")),
        Err(e) => {
            error!("Failed to update profile {}: {}", who.user_id, e);
            Err(map_domain_error(&e))
        }
    }
}
