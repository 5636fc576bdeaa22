//! Tables: `opportunities`, `opportunity_applicants`, `applications`.

pub mod posting {
    use chrono::{DateTime, Utc};
    use modkit_db::StringList;
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "opportunities")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub kind: String,
        pub title: String,
        pub description: String,
        pub company: Option<String>,
        pub location: String,
        pub stipend: Option<String>,
        pub duration: Option<String>,
        pub last_date: DateTime<Utc>,
        pub start_date: Option<DateTime<Utc>>,
        #[sea_orm(column_type = "Json")]
        pub tags: StringList,
        #[sea_orm(column_type = "Json")]
        pub skills: StringList,
        #[sea_orm(column_type = "Json")]
        pub requirements: StringList,
        #[sea_orm(column_type = "Json")]
        pub responsibilities: StringList,
        pub poster: Option<String>,
        pub organizer_id: Uuid,
        pub organizer_name: String,
        pub status: String,
        pub views: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod applicant {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "opportunity_applicants")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub opportunity_id: Uuid,
        #[sea_orm(primary_key, auto_increment = false)]
        pub user_id: Uuid,
        pub applied_at: DateTime<Utc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod application {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;
    use sea_orm::FromJsonQueryResult;
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    use crate::contract::model::Snapshot;

    /// Apply-time snapshot persisted as one JSON column.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
    #[serde(transparent)]
    pub struct SnapshotJson(pub Snapshot);

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "applications")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub user_id: Uuid,
        pub opportunity_id: Uuid,
        pub status: String,
        #[sea_orm(column_type = "Json")]
        pub snapshot: SnapshotJson,
        pub cover_letter: String,
        pub resume: String,
        pub notes: String,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
