use anyhow::anyhow;
use sea_orm::Set;

use crate::contract::model::{Event, EventRegistration};
use crate::infra::storage::entity::{event, registration};

pub fn event_from_row(
    m: event::Model,
    registrations: Vec<EventRegistration>,
) -> anyhow::Result<Event> {
    Ok(Event {
        id: m.id,
        title: m.title,
        description: m.description,
        kind: m.kind.parse().map_err(|e: String| anyhow!(e))?,
        date: m.date,
        time: m.time,
        deadline: m.deadline,
        location: m.location,
        max_participants: m.max_participants,
        current_participants: m.current_participants,
        registration_fee: m.registration_fee,
        requirements: m.requirements.into(),
        poster: m.poster,
        organizer_id: m.organizer_id,
        organizer_name: m.organizer_name,
        status: m.status.parse().map_err(|e: String| anyhow!(e))?,
        views: m.views,
        registrations,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

/// Editable columns only; `views` and `current_participants` belong to their
/// counter statements.
pub fn event_active_model(e: Event) -> event::ActiveModel {
    event::ActiveModel {
        id: Set(e.id),
        title: Set(e.title),
        description: Set(e.description),
        kind: Set(e.kind.as_str().to_owned()),
        date: Set(e.date),
        time: Set(e.time),
        deadline: Set(e.deadline),
        location: Set(e.location),
        max_participants: Set(e.max_participants),
        registration_fee: Set(e.registration_fee),
        requirements: Set(e.requirements.into()),
        poster: Set(e.poster),
        organizer_id: Set(e.organizer_id),
        organizer_name: Set(e.organizer_name),
        status: Set(e.status.as_str().to_owned()),
        created_at: Set(e.created_at),
        updated_at: Set(e.updated_at),
        ..Default::default()
    }
}

impl From<registration::Model> for EventRegistration {
    fn from(m: registration::Model) -> Self {
        Self {
            user_id: m.user_id,
            registered_at: m.registered_at,
        }
    }
}
