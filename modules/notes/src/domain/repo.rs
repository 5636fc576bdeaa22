use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::Note;

#[async_trait]
pub trait NotesRepository: Send + Sync {
    /// Owner's notes, pinned first, then most recently updated. `search`
    /// matches title or content without regard to case. `limit` counts
    /// notes that carry `tag` when one is given.
    async fn list_by_owner(
        &self,
        owner: Uuid,
        search: Option<&str>,
        tag: Option<&str>,
        limit: u64,
    ) -> anyhow::Result<Vec<Note>>;
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Note>>;
    async fn insert(&self, note: Note) -> anyhow::Result<()>;
    /// Returns false when no row matched.
    async fn update(&self, note: Note) -> anyhow::Result<bool>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}
