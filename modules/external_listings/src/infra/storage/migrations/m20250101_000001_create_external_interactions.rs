use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExternalInteractions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExternalInteractions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExternalInteractions::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(ExternalInteractions::EventId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExternalInteractions::EventTitle)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExternalInteractions::Kind).string().not_null())
                    .col(ColumnDef::new(ExternalInteractions::EventUrl).string().null())
                    .col(ColumnDef::new(ExternalInteractions::Location).string().null())
                    .col(ColumnDef::new(ExternalInteractions::EventDate).string().null())
                    .col(
                        ColumnDef::new(ExternalInteractions::RegisteredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExternalInteractions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_external_interactions_user_event_kind")
                    .table(ExternalInteractions::Table)
                    .col(ExternalInteractions::UserId)
                    .col(ExternalInteractions::EventId)
                    .col(ExternalInteractions::Kind)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_external_interactions_event")
                    .table(ExternalInteractions::Table)
                    .col(ExternalInteractions::EventId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExternalInteractions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ExternalInteractions {
    Table,
    Id,
    UserId,
    EventId,
    EventTitle,
    Kind,
    EventUrl,
    Location,
    EventDate,
    RegisteredAt,
    CreatedAt,
}
