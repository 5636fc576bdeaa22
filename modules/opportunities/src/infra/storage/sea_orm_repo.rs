//! SeaORM-backed posting and application repositories.

use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use notifications::model::NewAddressedNotification;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::contract::model::{Application, ApplicationStatus, Posting};
use crate::domain::filter::PostingFilter;
use crate::domain::repo::{ApplicationsRepository, PostingsRepository};
use crate::infra::storage::entity::{applicant, application, posting};
use crate::infra::storage::mapper::{posting_active_model, posting_from_row};
use crate::infra::storage::query::public_select;

async fn applicants_of<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> anyhow::Result<HashMap<Uuid, Vec<Uuid>>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = applicant::Entity::find()
        .filter(applicant::Column::OpportunityId.is_in(ids.iter().copied()))
        .order_by_asc(applicant::Column::AppliedAt)
        .all(conn)
        .await
        .context("load applicants failed")?;
    let mut out: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for r in rows {
        out.entry(r.opportunity_id).or_default().push(r.user_id);
    }
    Ok(out)
}

async fn hydrate<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<posting::Model>,
) -> anyhow::Result<Vec<Posting>> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut applicants = applicants_of(conn, &ids).await?;
    rows.into_iter()
        .map(|r| {
            let a = applicants.remove(&r.id).unwrap_or_default();
            posting_from_row(r, a)
        })
        .collect()
}

pub struct SeaOrmPostingsRepository {
    conn: DatabaseConnection,
}

impl SeaOrmPostingsRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl PostingsRepository for SeaOrmPostingsRepository {
    async fn list_public(&self, filter: &PostingFilter, limit: u64) -> anyhow::Result<Vec<Posting>> {
        // Array criteria are checked here, so the limit can only go into SQL without them.
        let mut select = public_select(filter);
        if !filter.has_list_criteria() {
            select = select.limit(limit);
        }
        let rows = select
            .all(&self.conn)
            .await
            .context("list_public failed")?;
        let rows = rows
            .into_iter()
            .filter(|r| filter.matches_lists(&r.tags.0, &r.skills.0))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect();
        hydrate(&self.conn, rows).await
    }

    async fn list_by_organizer(&self, organizer: Uuid) -> anyhow::Result<Vec<Posting>> {
        let rows = posting::Entity::find()
            .filter(posting::Column::OrganizerId.eq(organizer))
            .order_by_desc(posting::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("list_by_organizer failed")?;
        hydrate(&self.conn, rows).await
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Posting>> {
        let Some(row) = posting::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find failed")?
        else {
            return Ok(None);
        };
        Ok(hydrate(&self.conn, vec![row]).await?.pop())
    }

    async fn insert(&self, p: Posting) -> anyhow::Result<()> {
        let mut am = posting_active_model(p);
        am.views = Set(0);
        am.insert(&self.conn).await.context("insert failed")?;
        Ok(())
    }

    async fn update(&self, p: Posting) -> anyhow::Result<()> {
        posting_active_model(p)
            .update(&self.conn)
            .await
            .context("update failed")?;
        Ok(())
    }

    async fn delete_cascade(&self, id: Uuid) -> anyhow::Result<bool> {
        let txn = self.conn.begin().await.context("begin failed")?;
        application::Entity::delete_many()
            .filter(application::Column::OpportunityId.eq(id))
            .exec(&txn)
            .await
            .context("delete applications failed")?;
        applicant::Entity::delete_many()
            .filter(applicant::Column::OpportunityId.eq(id))
            .exec(&txn)
            .await
            .context("delete applicants failed")?;
        let res = posting::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("delete posting failed")?;
        txn.commit().await.context("commit failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn increment_views(&self, id: Uuid) -> anyhow::Result<Option<i64>> {
        let res = posting::Entity::update_many()
            .col_expr(
                posting::Column::Views,
                Expr::col(posting::Column::Views).add(1),
            )
            .filter(posting::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("increment_views failed")?;
        if res.rows_affected == 0 {
            return Ok(None);
        }
        let views: Option<i64> = posting::Entity::find_by_id(id)
            .select_only()
            .column(posting::Column::Views)
            .into_tuple()
            .one(&self.conn)
            .await
            .context("read views failed")?;
        Ok(views)
    }
}

pub struct SeaOrmApplicationsRepository {
    conn: DatabaseConnection,
}

impl SeaOrmApplicationsRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

fn to_domain(rows: Vec<application::Model>) -> anyhow::Result<Vec<Application>> {
    rows.into_iter().map(Application::try_from).collect()
}

#[async_trait]
impl ApplicationsRepository for SeaOrmApplicationsRepository {
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Application>> {
        application::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find failed")?
            .map(Application::try_from)
            .transpose()
    }

    async fn find_for(&self, user: Uuid, opportunity: Uuid) -> anyhow::Result<Option<Application>> {
        application::Entity::find()
            .filter(application::Column::UserId.eq(user))
            .filter(application::Column::OpportunityId.eq(opportunity))
            .one(&self.conn)
            .await
            .context("find_for failed")?
            .map(Application::try_from)
            .transpose()
    }

    async fn list_by_user(&self, user: Uuid) -> anyhow::Result<Vec<Application>> {
        let rows = application::Entity::find()
            .filter(application::Column::UserId.eq(user))
            .order_by_desc(application::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("list_by_user failed")?;
        to_domain(rows)
    }

    async fn list_by_opportunities(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Application>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = application::Entity::find()
            .filter(application::Column::OpportunityId.is_in(ids.iter().copied()))
            .order_by_desc(application::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("list_by_opportunities failed")?;
        to_domain(rows)
    }

    async fn create_with_notice(
        &self,
        app: Application,
        notice: NewAddressedNotification,
    ) -> anyhow::Result<()> {
        let txn = self.conn.begin().await.context("begin failed")?;
        let applicant_row = applicant::ActiveModel {
            opportunity_id: Set(app.opportunity_id),
            user_id: Set(app.user_id),
            applied_at: Set(app.created_at),
        };
        application::ActiveModel::from(app)
            .insert(&txn)
            .await
            .context("insert application failed")?;
        applicant_row
            .insert(&txn)
            .await
            .context("insert applicant failed")?;
        notifications::insert_notification(&txn, notice).await?;
        txn.commit().await.context("commit failed")?;
        Ok(())
    }

    async fn set_status_with_notice(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        notice: NewAddressedNotification,
    ) -> anyhow::Result<bool> {
        let txn = self.conn.begin().await.context("begin failed")?;
        let res = application::Entity::update_many()
            .col_expr(application::Column::Status, Expr::value(status.as_str()))
            .col_expr(application::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(application::Column::Id.eq(id))
            .exec(&txn)
            .await
            .context("update status failed")?;
        if res.rows_affected == 0 {
            txn.rollback().await.context("rollback failed")?;
            return Ok(false);
        }
        notifications::insert_notification(&txn, notice).await?;
        txn.commit().await.context("commit failed")?;
        Ok(true)
    }
}
