//! SeaORM-backed notifications repository.

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::contract::model::{Audience, NewAddressedNotification, Notification};
use crate::domain::repo::NotificationsRepository;
use crate::infra::storage::entity::{ActiveModel, Column, Entity as NotificationEntity};

/// Writes one addressed notification through any connection, including an
/// open transaction owned by the caller.
pub async fn insert_notification<C>(
    conn: &C,
    new: NewAddressedNotification,
) -> anyhow::Result<Notification>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let n = Notification {
        id: Uuid::new_v4(),
        recipient: Some(new.recipient),
        sender_id: new.sender_id,
        sender_name: new.sender_name,
        title: new.title,
        message: new.message,
        kind: new.kind,
        audience: Audience::Specific,
        read: false,
        link: new.link,
        created_at: now,
        updated_at: now,
    };
    ActiveModel::from(n.clone())
        .insert(conn)
        .await
        .context("insert_notification failed")?;
    Ok(n)
}

fn visible_to(user: Uuid, audience: Audience) -> Condition {
    Condition::any()
        .add(Column::Recipient.eq(user))
        .add(Column::Audience.eq(Audience::All.as_str()))
        .add(Column::Audience.eq(audience.as_str()))
}

pub struct SeaOrmNotificationsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmNotificationsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<C> NotificationsRepository for SeaOrmNotificationsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn list_visible(
        &self,
        user: Uuid,
        audience: Audience,
        limit: u64,
    ) -> anyhow::Result<Vec<Notification>> {
        let rows = NotificationEntity::find()
            .filter(visible_to(user, audience))
            .order_by_desc(Column::CreatedAt)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("list_visible failed")?;
        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn count_unread(&self, user: Uuid, audience: Audience) -> anyhow::Result<u64> {
        NotificationEntity::find()
            .filter(visible_to(user, audience))
            .filter(Column::Read.eq(false))
            .count(&self.conn)
            .await
            .context("count_unread failed")
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Notification>> {
        NotificationEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find failed")?
            .map(Notification::try_from)
            .transpose()
    }

    async fn insert(&self, n: Notification) -> anyhow::Result<()> {
        ActiveModel::from(n)
            .insert(&self.conn)
            .await
            .context("insert failed")?;
        Ok(())
    }

    async fn mark_read(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = NotificationEntity::update_many()
            .col_expr(Column::Read, Expr::value(true))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("mark_read failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = NotificationEntity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete failed")?;
        Ok(res.rows_affected > 0)
    }
}
