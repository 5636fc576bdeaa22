//! SeaORM-backed interaction log.

use anyhow::Context;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select,
};
use uuid::Uuid;

use crate::contract::model::{Interaction, InteractionKind};
use crate::domain::repo::InteractionsRepository;
use crate::infra::storage::entity::{ActiveModel, Column, Entity as InteractionEntity};

fn of_kind(q: Select<InteractionEntity>, kind: Option<InteractionKind>) -> Select<InteractionEntity> {
    match kind {
        Some(k) => q.filter(Column::Kind.eq(k.as_str())),
        None => q,
    }
}

pub struct SeaOrmInteractionsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmInteractionsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    async fn fetch(&self, q: Select<InteractionEntity>, what: &str) -> anyhow::Result<Vec<Interaction>> {
        q.all(&self.conn)
            .await
            .with_context(|| format!("{what} failed"))?
            .into_iter()
            .map(Interaction::try_from)
            .collect()
    }
}

#[async_trait]
impl<C> InteractionsRepository for SeaOrmInteractionsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find(
        &self,
        user: Uuid,
        event_id: &str,
        kind: InteractionKind,
    ) -> anyhow::Result<Option<Interaction>> {
        InteractionEntity::find()
            .filter(Column::UserId.eq(user))
            .filter(Column::EventId.eq(event_id))
            .filter(Column::Kind.eq(kind.as_str()))
            .one(&self.conn)
            .await
            .context("find failed")?
            .map(Interaction::try_from)
            .transpose()
    }

    async fn insert(&self, interaction: Interaction) -> anyhow::Result<()> {
        ActiveModel::from(interaction)
            .insert(&self.conn)
            .await
            .context("insert failed")?;
        Ok(())
    }

    async fn list_by_user(
        &self,
        user: Uuid,
        kind: Option<InteractionKind>,
    ) -> anyhow::Result<Vec<Interaction>> {
        let q = of_kind(InteractionEntity::find(), kind)
            .filter(Column::UserId.eq(user))
            .order_by_desc(Column::CreatedAt);
        self.fetch(q, "list_by_user").await
    }

    async fn list_by_event(
        &self,
        event_id: &str,
        kind: InteractionKind,
    ) -> anyhow::Result<Vec<Interaction>> {
        let q = InteractionEntity::find()
            .filter(Column::EventId.eq(event_id))
            .filter(Column::Kind.eq(kind.as_str()))
            .order_by_asc(Column::CreatedAt);
        self.fetch(q, "list_by_event").await
    }

    async fn list_all(&self, kind: Option<InteractionKind>) -> anyhow::Result<Vec<Interaction>> {
        let q = of_kind(InteractionEntity::find(), kind).order_by_desc(Column::CreatedAt);
        self.fetch(q, "list_all").await
    }

    async fn count(&self, event_id: &str, kind: InteractionKind) -> anyhow::Result<u64> {
        InteractionEntity::find()
            .filter(Column::EventId.eq(event_id))
            .filter(Column::Kind.eq(kind.as_str()))
            .count(&self.conn)
            .await
            .context("count failed")
    }
}
