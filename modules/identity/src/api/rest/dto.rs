use chrono::{DateTime, Utc};
use modkit::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::contract::model::{NewUser, Profile, ProfilePatch, Session, User};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badges: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        let role = u.role();
        let (resume_link, badges, organization_name, contact_info) = match u.profile {
            Profile::Student {
                resume_link,
                badges,
            } => (Some(resume_link), Some(badges), None, None),
            Profile::Organizer {
                organization_name,
                contact_info,
            } => (None, None, organization_name, contact_info),
        };
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role,
            resume_link,
            badges,
            organization_name,
            contact_info,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Authenticated user plus bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthDto {
    pub user: UserDto,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<Session> for AuthDto {
    fn from(s: Session) -> Self {
        Self {
            user: s.user.into(),
            token: s.token,
            expires_at: s.expires_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterReq {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Defaults to `student`.
    pub role: Option<Role>,
    pub organization_name: Option<String>,
    pub contact_info: Option<String>,
}

impl From<RegisterReq> for NewUser {
    fn from(r: RegisterReq) -> Self {
        Self {
            name: r.name.unwrap_or_default(),
            email: r.email.unwrap_or_default(),
            password: r.password.unwrap_or_default(),
            role: r.role,
            organization_name: r.organization_name,
            contact_info: r.contact_info,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginReq {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProfileReq {
    pub name: Option<String>,
    pub resume_link: Option<String>,
    pub badges: Option<Vec<String>>,
    pub organization_name: Option<String>,
    pub contact_info: Option<String>,
}

impl From<UpdateProfileReq> for ProfilePatch {
    fn from(r: UpdateProfileReq) -> Self {
        Self {
            name: r.name,
            resume_link: r.resume_link,
            badges: r.badges,
            organization_name: r.organization_name,
            contact_info: r.contact_info,
        }
    }
}
