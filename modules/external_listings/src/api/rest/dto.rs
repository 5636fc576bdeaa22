use chrono::{DateTime, Utc};
use modkit::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::contract::model::{
    Course, EventReport, EventStat, ExternalEvent, ExternalInternship, Interaction,
    InteractionKind, RegisteredUser, RegistrationsReport, StudentActivity, StudentInfo,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageSizeQuery {
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseListDto {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Course>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InternshipListDto {
    pub success: bool,
    pub count: usize,
    pub data: Vec<ExternalInternship>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventListDto {
    pub success: bool,
    pub count: usize,
    pub data: Vec<ExternalEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InteractionMetadataDto {
    pub event_url: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InteractionDto {
    pub id: Uuid,
    pub user: Uuid,
    pub event_id: String,
    pub event_title: String,
    pub interaction_type: InteractionKind,
    pub registered_at: DateTime<Utc>,
    pub metadata: InteractionMetadataDto,
    pub created_at: DateTime<Utc>,
}

impl From<Interaction> for InteractionDto {
    fn from(i: Interaction) -> Self {
        Self {
            id: i.id,
            user: i.user_id,
            event_id: i.event_id,
            event_title: i.event_title,
            interaction_type: i.kind,
            registered_at: i.registered_at,
            metadata: InteractionMetadataDto {
                event_url: i.event_url,
                location: i.location,
                date: i.event_date,
            },
            created_at: i.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InteractionListDto {
    pub success: bool,
    pub count: usize,
    pub data: Vec<InteractionDto>,
}

/// Registration tracking result; `redirectUrl` points at the event page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDto {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<InteractionDto>,
    pub redirect_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventStatDto {
    pub event_id: String,
    pub event_title: String,
    pub views: u64,
    pub registrations: u64,
    pub last_interaction: DateTime<Utc>,
}

impl From<EventStat> for EventStatDto {
    fn from(s: EventStat) -> Self {
        Self {
            event_id: s.event_id,
            event_title: s.event_title,
            views: s.views,
            registrations: s.registrations,
            last_interaction: s.last_interaction,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventStatListDto {
    pub success: bool,
    pub count: usize,
    pub data: Vec<EventStatDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUserDto {
    pub name: String,
    pub email: String,
    pub registered_at: DateTime<Utc>,
}

impl From<RegisteredUser> for RegisteredUserDto {
    fn from(u: RegisteredUser) -> Self {
        Self {
            name: u.name,
            email: u.email,
            registered_at: u.registered_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventReportDto {
    pub event_id: String,
    pub views: u64,
    pub registrations: u64,
    pub registered_users: Vec<RegisteredUserDto>,
}

impl From<EventReport> for EventReportDto {
    fn from(r: EventReport) -> Self {
        Self {
            event_id: r.event_id,
            views: r.views,
            registrations: r.registrations,
            registered_users: r.registered_users.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

impl From<StudentInfo> for StudentDto {
    fn from(s: StudentInfo) -> Self {
        Self {
            id: s.id,
            name: s.name,
            email: s.email,
            role: s.role,
            joined_at: s.joined_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationEntryDto {
    pub event_id: String,
    pub event_title: String,
    pub registered_at: DateTime<Utc>,
    pub event_url: Option<String>,
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl From<Interaction> for RegistrationEntryDto {
    fn from(i: Interaction) -> Self {
        Self {
            event_id: i.event_id,
            event_title: i.event_title,
            registered_at: i.registered_at,
            event_url: i.event_url,
            location: i.location,
            date: i.event_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentRegistrationsDto {
    pub student: StudentDto,
    pub registrations: Vec<RegistrationEntryDto>,
    pub total_events: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationsReportDto {
    pub success: bool,
    pub total_registrations: usize,
    pub total_students: usize,
    pub data: Vec<StudentRegistrationsDto>,
}

impl From<RegistrationsReport> for RegistrationsReportDto {
    fn from(r: RegistrationsReport) -> Self {
        let data: Vec<StudentRegistrationsDto> = r
            .students
            .into_iter()
            .map(|s| StudentRegistrationsDto {
                total_events: s.registrations.len(),
                student: s.student.into(),
                registrations: s.registrations.into_iter().map(Into::into).collect(),
            })
            .collect();
        Self {
            success: true,
            total_registrations: r.total_registrations,
            total_students: data.len(),
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStatsDto {
    pub total_views: usize,
    pub total_registrations: usize,
    pub total_interactions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewEntryDto {
    pub event_id: String,
    pub event_title: String,
    pub viewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentActivityDto {
    pub success: bool,
    pub student: StudentDto,
    pub stats: ActivityStatsDto,
    pub views: Vec<ViewEntryDto>,
    pub registrations: Vec<RegistrationEntryDto>,
}

impl From<StudentActivity> for StudentActivityDto {
    fn from(a: StudentActivity) -> Self {
        let stats = ActivityStatsDto {
            total_views: a.views.len(),
            total_registrations: a.registrations.len(),
            total_interactions: a.views.len() + a.registrations.len(),
        };
        Self {
            success: true,
            student: a.student.into(),
            stats,
            views: a
                .views
                .into_iter()
                .map(|v| ViewEntryDto {
                    event_id: v.event_id,
                    event_title: v.event_title,
                    viewed_at: v.created_at,
                })
                .collect(),
            registrations: a.registrations.into_iter().map(Into::into).collect(),
        }
    }
}
