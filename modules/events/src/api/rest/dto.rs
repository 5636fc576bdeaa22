use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::contract::model::{
    Event, EventKind, EventPatch, EventQuery, EventRegistration, EventStatus, NewEvent,
};

/// Requirements arrive either as an array or as that array JSON-encoded in a
/// string field.
fn list_or_json<'de, D>(d: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Text(String),
    }

    match Option::<Raw>::deserialize(d)? {
        None => Ok(None),
        Some(Raw::List(v)) => Ok(Some(v)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(Some(Vec::new())),
        Some(Raw::Text(s)) => serde_json::from_str(&s)
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("expected a JSON array of strings: {e}"))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDto {
    pub user: Uuid,
    pub registered_at: DateTime<Utc>,
}

impl From<EventRegistration> for RegistrationDto {
    fn from(r: EventRegistration) -> Self {
        Self {
            user: r.user_id,
            registered_at: r.registered_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventDto {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
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
    pub organizer: Uuid,
    pub organizer_name: String,
    pub status: EventStatus,
    pub views: i64,
    pub registrations: Vec<RegistrationDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Event> for EventDto {
    fn from(e: Event) -> Self {
        Self {
            id: e.id,
            title: e.title,
            description: e.description,
            kind: e.kind,
            date: e.date,
            time: e.time,
            deadline: e.deadline,
            location: e.location,
            max_participants: e.max_participants,
            current_participants: e.current_participants,
            registration_fee: e.registration_fee,
            requirements: e.requirements,
            poster: e.poster,
            organizer: e.organizer_id,
            organizer_name: e.organizer_name,
            status: e.status,
            views: e.views,
            registrations: e.registrations.into_iter().map(Into::into).collect(),
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

/// List envelope, for the schema only.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventListDto {
    pub success: bool,
    pub count: usize,
    pub data: Vec<EventDto>,
}

/// Query string of `GET /events`. `all` disables a filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListEventsQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

fn unless_all<T: std::str::FromStr<Err = String>>(v: Option<String>) -> Result<Option<T>, String> {
    match v.as_deref().map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(s) => s.parse().map(Some),
    }
}

impl TryFrom<ListEventsQuery> for EventQuery {
    type Error = String;

    fn try_from(q: ListEventsQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            kind: unless_all(q.kind)?,
            status: unless_all(q.status)?,
            search: q.search.filter(|s| !s.trim().is_empty()),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventReq {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<EventKind>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub deadline: Option<String>,
    pub location: Option<String>,
    pub max_participants: Option<i64>,
    /// Defaults to `Free`.
    pub registration_fee: Option<String>,
    #[serde(default, deserialize_with = "list_or_json")]
    pub requirements: Option<Vec<String>>,
    /// Image URL.
    pub poster: Option<String>,
    /// Defaults to `Live`.
    pub status: Option<EventStatus>,
}

impl From<CreateEventReq> for NewEvent {
    fn from(r: CreateEventReq) -> Self {
        Self {
            title: r.title.unwrap_or_default(),
            description: r.description.unwrap_or_default(),
            kind: r.kind,
            date: r.date.unwrap_or_default(),
            time: r.time.unwrap_or_default(),
            deadline: r.deadline.unwrap_or_default(),
            location: r.location.unwrap_or_default(),
            max_participants: r.max_participants,
            registration_fee: r.registration_fee,
            requirements: r.requirements.unwrap_or_default(),
            poster: r.poster,
            status: r.status,
        }
    }
}

/// Unknown keys, including `organizer` and the counters, are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateEventReq {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<EventKind>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub deadline: Option<String>,
    pub location: Option<String>,
    pub max_participants: Option<i64>,
    pub registration_fee: Option<String>,
    #[serde(default, deserialize_with = "list_or_json")]
    pub requirements: Option<Vec<String>>,
    pub poster: Option<String>,
    pub status: Option<EventStatus>,
}

impl From<UpdateEventReq> for EventPatch {
    fn from(r: UpdateEventReq) -> Self {
        Self {
            title: r.title,
            description: r.description,
            kind: r.kind,
            date: r.date,
            time: r.time,
            deadline: r.deadline,
            location: r.location,
            max_participants: r.max_participants,
            registration_fee: r.registration_fee,
            requirements: r.requirements,
            poster: r.poster,
            status: r.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ViewsDto {
    pub views: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_disables_a_filter() {
        let q = EventQuery::try_from(ListEventsQuery {
            kind: Some("all".into()),
            status: Some("Upcoming".into()),
            search: Some("  ".into()),
        })
        .unwrap();
        assert!(q.kind.is_none());
        assert_eq!(q.status, Some(EventStatus::Upcoming));
        assert!(q.search.is_none());

        let bad = EventQuery::try_from(ListEventsQuery {
            kind: Some("Meetup".into()),
            ..Default::default()
        });
        assert_eq!(bad.unwrap_err(), "unknown event type 'Meetup'");
    }

    #[test]
    fn requirements_accept_encoded_arrays() {
        let r: CreateEventReq = serde_json::from_value(serde_json::json!({
            "title": "Hack Night",
            "requirements": "[\"Laptop\",\"GitHub account\"]"
        }))
        .unwrap();
        assert_eq!(
            r.requirements.unwrap(),
            vec!["Laptop".to_string(), "GitHub account".to_string()]
        );
    }
}
