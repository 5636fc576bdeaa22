use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::{Audience, Notification};

#[async_trait]
pub trait NotificationsRepository: Send + Sync {
    /// Rows addressed to `user` plus broadcasts to `all` or `audience`, newest first.
    async fn list_visible(
        &self,
        user: Uuid,
        audience: Audience,
        limit: u64,
    ) -> anyhow::Result<Vec<Notification>>;
    async fn count_unread(&self, user: Uuid, audience: Audience) -> anyhow::Result<u64>;
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Notification>>;
    async fn insert(&self, n: Notification) -> anyhow::Result<()>;
    /// Returns false when no row matched.
    async fn mark_read(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}
