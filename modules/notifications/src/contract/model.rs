use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use modkit::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    General,
    Event,
    Internship,
    Application,
    Broadcast,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Event => "event",
            Self::Internship => "internship",
            Self::Application => "application",
            Self::Broadcast => "broadcast",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "general" => Self::General,
            "event" => Self::Event,
            "internship" => Self::Internship,
            "application" => Self::Application,
            "broadcast" => Self::Broadcast,
            other => return Err(format!("unknown notification type '{other}'")),
        })
    }
}

/// Who a notification is for. `Specific` rows carry a recipient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    #[default]
    All,
    Students,
    Organizers,
    Specific,
}

impl Audience {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Students => "students",
            Self::Organizers => "organizers",
            Self::Specific => "specific",
        }
    }

    /// The broadcast audience a role belongs to.
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Student => Self::Students,
            Role::Organizer => Self::Organizers,
        }
    }

    pub fn is_broadcast(self) -> bool {
        !matches!(self, Self::Specific)
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Audience {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "all" => Self::All,
            "students" => Self::Students,
            "organizers" => Self::Organizers,
            "specific" => Self::Specific,
            other => return Err(format!("unknown audience '{other}'")),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub recipient: Option<Uuid>,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub audience: Audience,
    pub read: bool,
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Addressed to `user`, or broadcast to an audience that includes `role`.
    pub fn is_visible_to(&self, user: Uuid, role: Role) -> bool {
        self.recipient == Some(user)
            || self.audience == Audience::All
            || self.audience == Audience::for_role(role)
    }
}

/// A notification for exactly one user, written by other modules' workflows.
#[derive(Debug, Clone)]
pub struct NewAddressedNotification {
    pub recipient: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub link: Option<String>,
}

/// Broadcast composed by an organizer.
#[derive(Debug, Clone, Default)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub kind: Option<NotificationKind>,
    pub audience: Option<Audience>,
    pub link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broadcast(audience: Audience) -> Notification {
        let now = Utc::now();
        Notification {
            id: Uuid::new_v4(),
            recipient: None,
            sender_id: Uuid::new_v4(),
            sender_name: "Org".into(),
            title: "t".into(),
            message: "m".into(),
            kind: NotificationKind::Broadcast,
            audience,
            read: false,
            link: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn audience_visibility() {
        let me = Uuid::new_v4();
        assert!(broadcast(Audience::All).is_visible_to(me, Role::Organizer));
        assert!(broadcast(Audience::Students).is_visible_to(me, Role::Student));
        assert!(!broadcast(Audience::Students).is_visible_to(me, Role::Organizer));

        let mut addressed = broadcast(Audience::Specific);
        assert!(!addressed.is_visible_to(me, Role::Student));
        addressed.recipient = Some(me);
        assert!(addressed.is_visible_to(me, Role::Student));
    }
}
