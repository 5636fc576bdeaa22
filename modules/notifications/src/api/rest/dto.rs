use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::contract::model::{Audience, NewNotification, Notification, NotificationKind};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDto {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<Uuid>,
    pub sender: Uuid,
    pub sender_name: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub target_audience: Audience,
    pub read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Notification> for NotificationDto {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            recipient: n.recipient,
            sender: n.sender_id,
            sender_name: n.sender_name,
            title: n.title,
            message: n.message,
            kind: n.kind,
            target_audience: n.audience,
            read: n.read,
            link: n.link,
            created_at: n.created_at,
            updated_at: n.updated_at,
        }
    }
}

/// Inbox listing: the envelope plus an unread counter.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InboxDto {
    pub success: bool,
    pub count: usize,
    pub unread: u64,
    pub data: Vec<NotificationDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationReq {
    pub title: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<NotificationKind>,
    /// `all`, `students` or `organizers`.
    pub target_audience: Option<Audience>,
    pub link: Option<String>,
}

impl From<CreateNotificationReq> for NewNotification {
    fn from(r: CreateNotificationReq) -> Self {
        Self {
            title: r.title.unwrap_or_default(),
            message: r.message.unwrap_or_default(),
            kind: r.kind,
            audience: r.target_audience,
            link: r.link,
        }
    }
}
