use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum EventKind {
    Conference,
    Workshop,
    Hackathon,
    Competition,
    Webinar,
    TechFest,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conference => "Conference",
            Self::Workshop => "Workshop",
            Self::Hackathon => "Hackathon",
            Self::Competition => "Competition",
            Self::Webinar => "Webinar",
            Self::TechFest => "TechFest",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Conference" => Self::Conference,
            "Workshop" => Self::Workshop,
            "Hackathon" => Self::Hackathon,
            "Competition" => Self::Competition,
            "Webinar" => Self::Webinar,
            "TechFest" => Self::TechFest,
            other => return Err(format!("unknown event type '{other}'")),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum EventStatus {
    #[default]
    Live,
    Upcoming,
    Expired,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "Live",
            Self::Upcoming => "Upcoming",
            Self::Expired => "Expired",
        }
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Live" => Self::Live,
            "Upcoming" => Self::Upcoming,
            "Expired" => Self::Expired,
            other => return Err(format!("unknown event status '{other}'")),
        })
    }
}

/// One seat taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRegistration {
    pub user_id: Uuid,
    pub registered_at: DateTime<Utc>,
}

/// An organizer-run event. `date`, `time` and `deadline` are kept as the
/// organizer typed them.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub kind: EventKind,
    pub date: String,
    pub time: String,
    pub deadline: String,
    pub location: String,
    pub max_participants: i64,
    pub current_participants: i64,
    pub registration_fee: String,
    pub requirements: Vec<String>,
    pub poster: Option<String>,
    pub organizer_id: Uuid,
    pub organizer_name: String,
    pub status: EventStatus,
    pub views: i64,
    /// Oldest first.
    pub registrations: Vec<EventRegistration>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_owned_by(&self, user: Uuid) -> bool {
        self.organizer_id == user
    }

    pub fn is_full(&self) -> bool {
        self.current_participants >= self.max_participants
    }

    pub fn is_registered(&self, user: Uuid) -> bool {
        self.registrations.iter().any(|r| r.user_id == user)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub kind: Option<EventKind>,
    pub date: String,
    pub time: String,
    pub deadline: String,
    pub location: String,
    pub max_participants: Option<i64>,
    pub registration_fee: Option<String>,
    pub requirements: Vec<String>,
    pub poster: Option<String>,
    pub status: Option<EventStatus>,
}

/// Partial update; organizer, counters and registrations are not editable.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub kind: Option<EventKind>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub deadline: Option<String>,
    pub location: Option<String>,
    pub max_participants: Option<i64>,
    pub registration_fee: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub poster: Option<String>,
    pub status: Option<EventStatus>,
}

/// Listing criteria; all optional and combined with AND.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub kind: Option<EventKind>,
    pub status: Option<EventStatus>,
    /// Case-insensitive substring of the title or the description.
    pub search: Option<String>,
}

/// What a registration attempt did to the seat count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatOutcome {
    Taken,
    AlreadyRegistered,
    Full,
    Missing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip_through_serde() {
        assert_eq!(serde_json::to_value(EventKind::TechFest).unwrap(), "TechFest");
        assert_eq!("Webinar".parse::<EventKind>().unwrap(), EventKind::Webinar);
        assert!("Meetup".parse::<EventKind>().is_err());
        assert_eq!(EventStatus::default(), EventStatus::Live);
    }
}
