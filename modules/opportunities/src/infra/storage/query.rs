//! Translates a [`PostingFilter`] into a SeaORM select.

use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Select};

use crate::contract::model::PostingStatus;
use crate::domain::filter::{Bound, Cmp, PostingFilter, SortField};
use crate::infra::storage::entity::posting::{Column, Entity};

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn bound<T>(col: Column, b: &Bound<T>) -> sea_orm::sea_query::SimpleExpr
where
    T: Clone + Into<sea_orm::Value>,
{
    let v = b.value.clone();
    match b.cmp {
        Cmp::Gt => col.gt(v),
        Cmp::Gte => col.gte(v),
        Cmp::Lt => col.lt(v),
        Cmp::Lte => col.lte(v),
    }
}

fn sort_column(f: SortField) -> Column {
    match f {
        SortField::CreatedAt => Column::CreatedAt,
        SortField::UpdatedAt => Column::UpdatedAt,
        SortField::Title => Column::Title,
        SortField::LastDate => Column::LastDate,
        SortField::Views => Column::Views,
        SortField::Type => Column::Kind,
        SortField::Company => Column::Company,
        SortField::Location => Column::Location,
    }
}

/// Scalar criteria and ordering. Tag and skill membership are checked by the caller.
pub fn public_select(filter: &PostingFilter) -> Select<Entity> {
    let mut cond = Condition::all().add(Column::Status.eq(PostingStatus::Active.as_str()));

    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
        cond = cond.add(
            Expr::expr(Func::lower(Expr::col(Column::Title)))
                .like(LikeExpr::new(pattern).escape('\\')),
        );
    }
    if let Some(kind) = filter.kind {
        cond = cond.add(Column::Kind.eq(kind.as_str()));
    }
    if let Some(location) = &filter.location {
        cond = cond.add(Column::Location.eq(location.as_str()));
    }
    if let Some(company) = &filter.company {
        cond = cond.add(Column::Company.eq(company.as_str()));
    }
    for b in &filter.views {
        cond = cond.add(bound(Column::Views, b));
    }
    for b in &filter.last_date {
        cond = cond.add(bound(Column::LastDate, b));
    }

    let mut select = Entity::find().filter(cond);
    for key in filter.sort_keys() {
        let col = sort_column(key.field);
        select = if key.descending {
            select.order_by_desc(col)
        } else {
            select.order_by_asc(col)
        };
    }
    select
}
