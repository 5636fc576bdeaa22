//! SeaORM-backed notes repository.

use anyhow::Context;
use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, NotSet, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::contract::model::Note;
use crate::domain::repo::NotesRepository;
use crate::infra::storage::entity::{ActiveModel, Column, Entity as NoteEntity};

fn contains_ci(col: Column, needle: &str) -> SimpleExpr {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Expr::expr(Func::lower(Expr::col(col)))
        .like(LikeExpr::new(format!("%{escaped}%")).escape('\\'))
}

pub struct SeaOrmNotesRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmNotesRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<C> NotesRepository for SeaOrmNotesRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn list_by_owner(
        &self,
        owner: Uuid,
        search: Option<&str>,
        tag: Option<&str>,
        limit: u64,
    ) -> anyhow::Result<Vec<Note>> {
        let mut cond = Condition::all().add(Column::OwnerId.eq(owner));
        if let Some(s) = search {
            cond = cond.add(
                Condition::any()
                    .add(contains_ci(Column::Title, s))
                    .add(contains_ci(Column::Content, s)),
            );
        }
        let mut select = NoteEntity::find()
            .filter(cond)
            .order_by_desc(Column::IsPinned)
            .order_by_desc(Column::UpdatedAt);
        if tag.is_none() {
            select = select.limit(limit);
        }
        let rows = select
            .all(&self.conn)
            .await
            .context("list_by_owner failed")?;
        Ok(rows
            .into_iter()
            .map(Note::from)
            .filter(|n| tag.is_none_or(|t| n.has_tag(t)))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Note>> {
        Ok(NoteEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find failed")?
            .map(Note::from))
    }

    async fn insert(&self, note: Note) -> anyhow::Result<()> {
        ActiveModel::from(note)
            .insert(&self.conn)
            .await
            .context("insert failed")?;
        Ok(())
    }

    async fn update(&self, note: Note) -> anyhow::Result<bool> {
        let id = note.id;
        let mut am = ActiveModel::from(note);
        am.id = NotSet;
        am.owner_id = NotSet;
        am.created_at = NotSet;
        let res = NoteEntity::update_many()
            .set(am)
            .filter(Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("update failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = NoteEntity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete failed")?;
        Ok(res.rows_affected > 0)
    }
}
