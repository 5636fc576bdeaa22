//! SeaORM-backed users repository.

use anyhow::Context;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::contract::model::User;
use crate::domain::repo::{StoredUser, UsersRepository};
use crate::infra::storage::entity::{ActiveModel, Column, Entity as UserEntity};
use crate::infra::storage::mapper::apply_user;

pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let found = UserEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        found
            .map(|m| StoredUser::try_from(m).map(|s| s.user))
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<StoredUser>> {
        let found = UserEntity::find()
            .filter(Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("find_by_email failed")?;
        found.map(StoredUser::try_from).transpose()
    }

    async fn email_exists(&self, email: &str) -> anyhow::Result<bool> {
        let count = UserEntity::find()
            .filter(Column::Email.eq(email))
            .count(&self.conn)
            .await
            .context("email_exists failed")?;
        Ok(count > 0)
    }

    async fn insert(&self, u: StoredUser) -> anyhow::Result<()> {
        let mut am = ActiveModel {
            password_hash: Set(u.password_hash),
            ..Default::default()
        };
        apply_user(&mut am, u.user);
        am.insert(&self.conn).await.context("insert failed")?;
        Ok(())
    }

    async fn update(&self, u: User) -> anyhow::Result<()> {
        let mut am = <ActiveModel as Default>::default();
        apply_user(&mut am, u);
        am.update(&self.conn).await.context("update failed")?;
        Ok(())
    }

    async fn set_password_hash(&self, id: Uuid, hash: String) -> anyhow::Result<bool> {
        let res = UserEntity::update_many()
            .col_expr(Column::PasswordHash, sea_orm::sea_query::Expr::value(hash))
            .col_expr(
                Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(chrono::Utc::now()),
            )
            .filter(Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("set_password_hash failed")?;
        Ok(res.rows_affected > 0)
    }
}
