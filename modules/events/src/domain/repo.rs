use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contract::model::{Event, EventQuery, SeatOutcome};

#[async_trait]
pub trait EventsRepository: Send + Sync {
    /// Newest first.
    async fn list(&self, query: &EventQuery, limit: u64) -> anyhow::Result<Vec<Event>>;
    /// Newest first.
    async fn list_by_organizer(&self, organizer: Uuid) -> anyhow::Result<Vec<Event>>;
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Event>>;
    async fn insert(&self, e: Event) -> anyhow::Result<()>;
    /// Writes the editable columns; counters are left alone.
    async fn update(&self, e: Event) -> anyhow::Result<()>;
    /// Removes the event and its registrations together.
    /// Returns false when no event matched.
    async fn delete_cascade(&self, id: Uuid) -> anyhow::Result<bool>;
    /// `views = views + 1` in one statement; `None` when the event is gone.
    async fn increment_views(&self, id: Uuid) -> anyhow::Result<Option<i64>>;
    /// Inserts the registration and bumps `current_participants` in one
    /// transaction. The bump only applies while seats remain.
    async fn take_seat(
        &self,
        event: Uuid,
        user: Uuid,
        at: DateTime<Utc>,
    ) -> anyhow::Result<SeatOutcome>;
}
