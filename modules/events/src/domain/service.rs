use std::sync::Arc;

use chrono::Utc;
use identity::contract::IdentityApi;
use modkit::{Identity, Role};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{Event, EventPatch, EventQuery, NewEvent, SeatOutcome};
use crate::domain::error::DomainError;
use crate::domain::repo::EventsRepository;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub list_limit: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { list_limit: 500 }
    }
}

fn db_err(e: anyhow::Error) -> DomainError {
    DomainError::database(format!("{e:#}"))
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// First missing required field, in form order.
fn missing_field(new: &NewEvent) -> Option<&'static str> {
    if blank(&new.title) {
        return Some("Please add event title");
    }
    if blank(&new.description) {
        return Some("Please add event description");
    }
    if new.kind.is_none() {
        return Some("Please add event type");
    }
    if blank(&new.date) {
        return Some("Please add event date");
    }
    if blank(&new.time) {
        return Some("Please add event time");
    }
    if blank(&new.deadline) {
        return Some("Please add registration deadline");
    }
    if blank(&new.location) {
        return Some("Please add location");
    }
    if new.max_participants.is_none() {
        return Some("Please add maximum participants");
    }
    None
}

/// Organizer-run events with seat-limited registration.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn EventsRepository>,
    users: Arc<dyn IdentityApi>,
    config: ServiceConfig,
}

impl Service {
    pub fn new(
        repo: Arc<dyn EventsRepository>,
        users: Arc<dyn IdentityApi>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repo,
            users,
            config,
        }
    }

    #[instrument(name = "events.service.list", skip(self, query))]
    pub async fn list(&self, query: EventQuery) -> Result<Vec<Event>, DomainError> {
        let events = self
            .repo
            .list(&query, self.config.list_limit)
            .await
            .map_err(db_err)?;
        debug!(count = events.len(), "listed events");
        Ok(events)
    }

    async fn find(&self, id: Uuid) -> Result<Event, DomainError> {
        self.repo
            .find(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found(id))
    }

    /// Every read counts as a view.
    #[instrument(name = "events.service.get", skip(self), fields(event_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Event, DomainError> {
        self.track_view(id).await?;
        self.find(id).await
    }

    #[instrument(name = "events.service.create", skip(self, new), fields(organizer_id = %who.user_id))]
    pub async fn create(&self, who: Identity, new: NewEvent) -> Result<Event, DomainError> {
        who.require_role(Role::Organizer)?;
        if let Some(msg) = missing_field(&new) {
            return Err(DomainError::validation(msg));
        }
        let (Some(kind), Some(max_participants)) = (new.kind, new.max_participants) else {
            return Err(DomainError::validation("Please add all required fields"));
        };
        if max_participants < 1 {
            return Err(DomainError::validation(
                "Maximum participants must be at least 1",
            ));
        }

        let organizer = self.users.get_user(who.user_id).await?;
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            title: new.title.trim().to_owned(),
            description: new.description,
            kind,
            date: new.date,
            time: new.time,
            deadline: new.deadline,
            location: new.location,
            max_participants,
            current_participants: 0,
            registration_fee: new
                .registration_fee
                .filter(|f| !blank(f))
                .unwrap_or_else(|| "Free".to_owned()),
            requirements: new.requirements,
            poster: new.poster,
            organizer_id: who.user_id,
            organizer_name: organizer.name,
            status: new.status.unwrap_or_default(),
            views: 0,
            registrations: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.repo.insert(event.clone()).await.map_err(db_err)?;
        info!(event_id = %event.id, kind = %event.kind, "event created");
        Ok(event)
    }

    #[instrument(name = "events.service.update", skip(self, patch), fields(user_id = %who.user_id, event_id = %id))]
    pub async fn update(
        &self,
        who: Identity,
        id: Uuid,
        patch: EventPatch,
    ) -> Result<Event, DomainError> {
        let mut e = self.find(id).await?;
        if !e.is_owned_by(who.user_id) {
            warn!(organizer_id = %e.organizer_id, "update by non-owner");
            return Err(DomainError::not_authorized(
                "Not authorized to update this event",
            ));
        }

        if let Some(title) = patch.title {
            if blank(&title) {
                return Err(DomainError::validation("Please add event title"));
            }
            e.title = title.trim().to_owned();
        }
        if let Some(description) = patch.description {
            if blank(&description) {
                return Err(DomainError::validation("Please add event description"));
            }
            e.description = description;
        }
        if let Some(kind) = patch.kind {
            e.kind = kind;
        }
        if let Some(date) = patch.date {
            e.date = date;
        }
        if let Some(time) = patch.time {
            e.time = time;
        }
        if let Some(deadline) = patch.deadline {
            e.deadline = deadline;
        }
        if let Some(location) = patch.location {
            e.location = location;
        }
        if let Some(max) = patch.max_participants {
            if max < e.current_participants.max(1) {
                return Err(DomainError::validation(
                    "Maximum participants cannot be below current registrations",
                ));
            }
            e.max_participants = max;
        }
        if let Some(fee) = patch.registration_fee {
            e.registration_fee = fee;
        }
        if let Some(requirements) = patch.requirements {
            e.requirements = requirements;
        }
        if let Some(poster) = patch.poster {
            e.poster = Some(poster);
        }
        if let Some(status) = patch.status {
            e.status = status;
        }
        e.updated_at = Utc::now();

        self.repo.update(e.clone()).await.map_err(db_err)?;
        info!("event updated");
        Ok(e)
    }

    #[instrument(name = "events.service.delete", skip(self), fields(user_id = %who.user_id, event_id = %id))]
    pub async fn delete(&self, who: Identity, id: Uuid) -> Result<(), DomainError> {
        let e = self.find(id).await?;
        if !e.is_owned_by(who.user_id) {
            warn!(organizer_id = %e.organizer_id, "delete by non-owner");
            return Err(DomainError::not_authorized(
                "Not authorized to delete this event",
            ));
        }
        if !self.repo.delete_cascade(id).await.map_err(db_err)? {
            return Err(DomainError::not_found(id));
        }
        info!(registrations = e.registrations.len(), "event deleted");
        Ok(())
    }

    /// Takes one seat for the caller. Capacity is enforced by the storage
    /// statement, so concurrent callers cannot overbook.
    #[instrument(name = "events.service.register", skip(self), fields(user_id = %who.user_id, event_id = %id))]
    pub async fn register(&self, who: Identity, id: Uuid) -> Result<Event, DomainError> {
        let e = self.find(id).await?;
        if e.is_registered(who.user_id) {
            return Err(DomainError::AlreadyRegistered { id });
        }
        match self
            .repo
            .take_seat(id, who.user_id, Utc::now())
            .await
            .map_err(db_err)?
        {
            SeatOutcome::Taken => {
                info!("registered for event");
                self.find(id).await
            }
            SeatOutcome::AlreadyRegistered => Err(DomainError::AlreadyRegistered { id }),
            SeatOutcome::Full => {
                debug!(max = e.max_participants, "event is full");
                Err(DomainError::Full { id })
            }
            SeatOutcome::Missing => Err(DomainError::not_found(id)),
        }
    }

    #[instrument(name = "events.service.list_mine", skip(self), fields(organizer_id = %who.user_id))]
    pub async fn list_mine(&self, who: Identity) -> Result<Vec<Event>, DomainError> {
        who.require_role(Role::Organizer)?;
        self.repo
            .list_by_organizer(who.user_id)
            .await
            .map_err(db_err)
    }

    #[instrument(name = "events.service.track_view", skip(self), fields(event_id = %id))]
    pub async fn track_view(&self, id: Uuid) -> Result<i64, DomainError> {
        let views = self
            .repo
            .increment_views(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found(id))?;
        debug!(views, "view tracked");
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_are_reported_in_form_order() {
        let mut n = NewEvent {
            title: "Hack Night".into(),
            description: "Build things".into(),
            ..Default::default()
        };
        assert_eq!(missing_field(&n), Some("Please add event type"));
        n.kind = Some(crate::contract::model::EventKind::Hackathon);
        n.date = "2025-03-01".into();
        n.time = "18:00".into();
        n.deadline = "2025-02-25".into();
        assert_eq!(missing_field(&n), Some("Please add location"));
        n.location = "Lab 4".into();
        assert_eq!(missing_field(&n), Some("Please add maximum participants"));
        n.max_participants = Some(40);
        assert_eq!(missing_field(&n), None);
    }
}
