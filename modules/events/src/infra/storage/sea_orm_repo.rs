//! SeaORM-backed events repository.

use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use modkit_db::is_unique_violation;
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::contract::model::{Event, EventQuery, EventRegistration, SeatOutcome};
use crate::domain::repo::EventsRepository;
use crate::infra::storage::entity::{event, registration};
use crate::infra::storage::mapper::{event_active_model, event_from_row};

fn contains_ci(col: event::Column, needle: &str) -> SimpleExpr {
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

fn listing_condition(q: &EventQuery) -> Condition {
    let mut cond = Condition::all();
    if let Some(kind) = q.kind {
        cond = cond.add(event::Column::Kind.eq(kind.as_str()));
    }
    if let Some(status) = q.status {
        cond = cond.add(event::Column::Status.eq(status.as_str()));
    }
    if let Some(s) = q.search.as_deref().filter(|s| !s.is_empty()) {
        cond = cond.add(
            Condition::any()
                .add(contains_ci(event::Column::Title, s))
                .add(contains_ci(event::Column::Description, s)),
        );
    }
    cond
}

async fn registrations_of<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> anyhow::Result<HashMap<Uuid, Vec<EventRegistration>>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = registration::Entity::find()
        .filter(registration::Column::EventId.is_in(ids.iter().copied()))
        .order_by_asc(registration::Column::RegisteredAt)
        .all(conn)
        .await
        .context("load registrations failed")?;
    let mut out: HashMap<Uuid, Vec<EventRegistration>> = HashMap::new();
    for r in rows {
        out.entry(r.event_id).or_default().push(r.into());
    }
    Ok(out)
}

async fn hydrate<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<event::Model>,
) -> anyhow::Result<Vec<Event>> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut regs = registrations_of(conn, &ids).await?;
    rows.into_iter()
        .map(|r| {
            let seats = regs.remove(&r.id).unwrap_or_default();
            event_from_row(r, seats)
        })
        .collect()
}

pub struct SeaOrmEventsRepository {
    conn: DatabaseConnection,
}

impl SeaOrmEventsRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl EventsRepository for SeaOrmEventsRepository {
    async fn list(&self, query: &EventQuery, limit: u64) -> anyhow::Result<Vec<Event>> {
        let rows = event::Entity::find()
            .filter(listing_condition(query))
            .order_by_desc(event::Column::CreatedAt)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("list failed")?;
        hydrate(&self.conn, rows).await
    }

    async fn list_by_organizer(&self, organizer: Uuid) -> anyhow::Result<Vec<Event>> {
        let rows = event::Entity::find()
            .filter(event::Column::OrganizerId.eq(organizer))
            .order_by_desc(event::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("list_by_organizer failed")?;
        hydrate(&self.conn, rows).await
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Event>> {
        let Some(row) = event::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find failed")?
        else {
            return Ok(None);
        };
        Ok(hydrate(&self.conn, vec![row]).await?.pop())
    }

    async fn insert(&self, e: Event) -> anyhow::Result<()> {
        let mut am = event_active_model(e);
        am.views = Set(0);
        am.current_participants = Set(0);
        am.insert(&self.conn).await.context("insert failed")?;
        Ok(())
    }

    async fn update(&self, e: Event) -> anyhow::Result<()> {
        event_active_model(e)
            .update(&self.conn)
            .await
            .context("update failed")?;
        Ok(())
    }

    async fn delete_cascade(&self, id: Uuid) -> anyhow::Result<bool> {
        let txn = self.conn.begin().await.context("begin failed")?;
        registration::Entity::delete_many()
            .filter(registration::Column::EventId.eq(id))
            .exec(&txn)
            .await
            .context("delete registrations failed")?;
        let res = event::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("delete event failed")?;
        txn.commit().await.context("commit failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn increment_views(&self, id: Uuid) -> anyhow::Result<Option<i64>> {
        let res = event::Entity::update_many()
            .col_expr(event::Column::Views, Expr::col(event::Column::Views).add(1))
            .filter(event::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("increment_views failed")?;
        if res.rows_affected == 0 {
            return Ok(None);
        }
        let views: Option<i64> = event::Entity::find_by_id(id)
            .select_only()
            .column(event::Column::Views)
            .into_tuple()
            .one(&self.conn)
            .await
            .context("read views failed")?;
        Ok(views)
    }

    async fn take_seat(
        &self,
        event_id: Uuid,
        user: Uuid,
        at: DateTime<Utc>,
    ) -> anyhow::Result<SeatOutcome> {
        let txn = self.conn.begin().await.context("begin failed")?;

        let seat = registration::ActiveModel {
            event_id: Set(event_id),
            user_id: Set(user),
            registered_at: Set(at),
        };
        match seat.insert(&txn).await {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                txn.rollback().await.context("rollback failed")?;
                return Ok(SeatOutcome::AlreadyRegistered);
            }
            Err(e) => return Err(anyhow::Error::new(e).context("insert registration failed")),
        }

        let res = event::Entity::update_many()
            .col_expr(
                event::Column::CurrentParticipants,
                Expr::col(event::Column::CurrentParticipants).add(1),
            )
            .filter(event::Column::Id.eq(event_id))
            .filter(
                Expr::col(event::Column::CurrentParticipants)
                    .lt(Expr::col(event::Column::MaxParticipants)),
            )
            .exec(&txn)
            .await
            .context("take seat failed")?;
        if res.rows_affected == 0 {
            txn.rollback().await.context("rollback failed")?;
            let exists = event::Entity::find_by_id(event_id)
                .one(&self.conn)
                .await
                .context("find failed")?
                .is_some();
            return Ok(if exists {
                SeatOutcome::Full
            } else {
                SeatOutcome::Missing
            });
        }

        txn.commit().await.context("commit failed")?;
        Ok(SeatOutcome::Taken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::{EventKind, EventStatus};
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn listing_sql_matches_title_or_description() {
        let q = EventQuery {
            kind: Some(EventKind::Workshop),
            status: Some(EventStatus::Upcoming),
            search: Some("Rust".into()),
        };
        let sql = event::Entity::find()
            .filter(listing_condition(&q))
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(sql.contains(r#""kind" = 'Workshop'"#), "{sql}");
        assert!(sql.contains(r#""status" = 'Upcoming'"#), "{sql}");
        assert!(sql.contains("LOWER"), "{sql}");
        assert!(sql.contains("'%rust%'"), "{sql}");
        assert!(sql.contains(" OR "), "{sql}");
    }
}
