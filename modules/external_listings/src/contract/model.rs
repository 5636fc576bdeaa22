//! Catalog records served as-is, and the interaction log kept against them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use modkit::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    pub instructor: String,
    pub platform: String,
    pub description: String,
    pub duration: String,
    pub level: String,
    pub price: String,
    pub topics: Vec<String>,
    pub modules: u32,
    pub enrolled: u64,
    pub rating: f32,
    pub thumbnail: String,
    pub certificate: bool,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// Shaped like an opportunity posting, but never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalInternship {
    pub id: String,
    pub title: String,
    pub company: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub duration: String,
    pub stipend: String,
    pub location: String,
    pub work_mode: String,
    pub last_date: DateTime<Utc>,
    pub skills: Vec<String>,
    pub requirements: Vec<String>,
    pub responsibilities: Vec<String>,
    pub poster: String,
    pub organizer_name: String,
    pub url: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: DateTime<Utc>,
    pub time: String,
    pub location: String,
    pub max_participants: u32,
    pub registration_fee: String,
    pub poster: String,
    pub organizer_name: String,
    pub url: String,
    pub status: String,
    pub is_free: bool,
    pub online_event: bool,
    pub topics: Vec<String>,
}

impl ExternalEvent {
    /// Calendar day as stored in interaction metadata.
    pub fn day(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    View,
    Register,
}

impl InteractionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InteractionKind::View => "view",
            InteractionKind::Register => "register",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(InteractionKind::View),
            "register" => Ok(InteractionKind::Register),
            other => Err(format!("unknown interaction type '{other}'")),
        }
    }
}

/// One row of the interaction log. At most one exists per (user, event, kind).
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: String,
    pub event_title: String,
    pub kind: InteractionKind,
    pub event_url: Option<String>,
    pub location: Option<String>,
    pub event_date: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Interaction {
    pub fn new(user_id: Uuid, event: &ExternalEvent, kind: InteractionKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            event_id: event.id.clone(),
            event_title: event.title.clone(),
            kind,
            event_url: Some(event.url.clone()),
            location: Some(event.location.clone()),
            event_date: Some(event.day()),
            registered_at: now,
            created_at: now,
        }
    }
}

/// Result of a tracking call.
#[derive(Debug, Clone)]
pub enum Tracked {
    Recorded(Interaction),
    /// The row already existed. `None` when a concurrent insert won the race.
    AlreadyTracked(Option<Interaction>),
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub tracked: Tracked,
    pub redirect_url: String,
}

// --- organizer reports ---

#[derive(Debug, Clone, PartialEq)]
pub struct EventStat {
    pub event_id: String,
    pub event_title: String,
    pub views: u64,
    pub registrations: u64,
    pub last_interaction: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredUser {
    pub name: String,
    pub email: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventReport {
    pub event_id: String,
    pub views: u64,
    pub registrations: u64,
    pub registered_users: Vec<RegisteredUser>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentRegistrations {
    pub student: StudentInfo,
    /// Newest first.
    pub registrations: Vec<Interaction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationsReport {
    pub total_registrations: usize,
    pub students: Vec<StudentRegistrations>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentActivity {
    pub student: StudentInfo,
    pub views: Vec<Interaction>,
    pub registrations: Vec<Interaction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interaction_kind_round_trips_its_wire_name() {
        for k in [InteractionKind::View, InteractionKind::Register] {
            assert_eq!(k.as_str().parse::<InteractionKind>().unwrap(), k);
        }
        assert!("click".parse::<InteractionKind>().is_err());
    }
}
