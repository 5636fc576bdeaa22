use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::{Interaction, InteractionKind};

#[async_trait]
pub trait InteractionsRepository: Send + Sync {
    async fn find(
        &self,
        user: Uuid,
        event_id: &str,
        kind: InteractionKind,
    ) -> anyhow::Result<Option<Interaction>>;
    /// A duplicate (user, event, kind) surfaces as a unique violation in the error chain.
    async fn insert(&self, interaction: Interaction) -> anyhow::Result<()>;
    /// Newest first. `None` means both kinds.
    async fn list_by_user(
        &self,
        user: Uuid,
        kind: Option<InteractionKind>,
    ) -> anyhow::Result<Vec<Interaction>>;
    /// Oldest first.
    async fn list_by_event(
        &self,
        event_id: &str,
        kind: InteractionKind,
    ) -> anyhow::Result<Vec<Interaction>>;
    /// Newest first. `None` means both kinds.
    async fn list_all(&self, kind: Option<InteractionKind>) -> anyhow::Result<Vec<Interaction>>;
    async fn count(&self, event_id: &str, kind: InteractionKind) -> anyhow::Result<u64>;
}
